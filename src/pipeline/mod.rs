// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Gauge metric pipeline
//!
//! [`GaugePipeline`] turns a gauge address into a fully computed [`Gauge`]
//! record. On a cache miss it runs an ordered chain of batched reads:
//!
//! 1. Primary batch: supply, emission rate, bribe contracts
//! 2. Bribe enumeration on the wrapped bribe contract (skipped when zero)
//! 3. Internal fees of the owning pair
//! 4. Vote weight and base yield for the APR
//!
//! Token and pair lookups go through their own caches. The record is only
//! stored once every step has succeeded; until then readers keep seeing the
//! previous record.
//!
//! # Examples
//!
//! ```rust,ignore
//! use gaugescan::{CallBatcher, GaugePipeline, GaugescanConfig, Multicall3Transport};
//! use std::sync::Arc;
//!
//! let config = GaugescanConfig::from_env()?;
//! let batcher = CallBatcher::new(Multicall3Transport::new(provider));
//! let pipeline = GaugePipeline::new(config, batcher, Arc::new(tokens), Arc::new(pairs));
//!
//! let gauge = pipeline.find("0x3B1f...").await?;
//! println!("{} apr={:.2}% tbv={}", gauge.address, gauge.apr, gauge.tbv);
//! ```

use std::future::Future;
use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info, warn, Instrument, Span};

use crate::batch::{CallBatch, CallBatcher, CallDescriptor, CallSignature};
use crate::cache::{CacheStats, EntityCache};
use crate::clock::Clock;
use crate::config::constants::{DEFAULT_DECIMALS, SECONDS_PER_DAY, WEEKS_PER_YEAR};
use crate::config::{GaugescanConfig, MissingPairPolicy};
use crate::entities::{parse_address, Gauge, Pair, PairSource, Token, TokenSource};
use crate::errors::GaugeError;
use crate::memo::TtlMemoizer;
use crate::tracing::spans;

mod ledger;

pub use ledger::RewardLedger;

/// Memo key of the protocol base yield
const BASE_YIELD_KEY: &str = "rebase_apr";

/// Computes, caches and refreshes gauge records
pub struct GaugePipeline {
    config: GaugescanConfig,
    batcher: CallBatcher,
    gauges: Arc<EntityCache<Gauge>>,
    tokens: Arc<EntityCache<Token>>,
    pairs: Arc<EntityCache<Pair>>,
    token_source: Arc<dyn TokenSource>,
    pair_source: Arc<dyn PairSource>,
    base_yield: Arc<TtlMemoizer<f64>>,
}

impl GaugePipeline {
    /// Create a pipeline with in-memory caches
    ///
    /// The gauge cache expires entries after `config.gauge_ttl` if set.
    pub fn new(
        config: GaugescanConfig,
        batcher: CallBatcher,
        token_source: Arc<dyn TokenSource>,
        pair_source: Arc<dyn PairSource>,
    ) -> Self {
        let gauges = EntityCache::in_memory().with_optional_ttl(config.gauge_ttl);
        Self {
            config,
            batcher,
            gauges: Arc::new(gauges),
            tokens: Arc::new(EntityCache::in_memory()),
            pairs: Arc::new(EntityCache::in_memory()),
            token_source,
            pair_source,
            base_yield: Arc::new(TtlMemoizer::new()),
        }
    }

    /// Use `cache` for gauge records
    pub fn with_gauge_cache(mut self, cache: Arc<EntityCache<Gauge>>) -> Self {
        self.gauges = cache;
        self
    }

    /// Use `cache` for token records
    pub fn with_token_cache(mut self, cache: Arc<EntityCache<Token>>) -> Self {
        self.tokens = cache;
        self
    }

    /// Use `cache` for pair records
    pub fn with_pair_cache(mut self, cache: Arc<EntityCache<Pair>>) -> Self {
        self.pairs = cache;
        self
    }

    /// Read base-yield expiry from `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.base_yield = Arc::new(TtlMemoizer::with_clock(clock));
        self
    }

    /// Active configuration
    pub fn config(&self) -> &GaugescanConfig {
        &self.config
    }

    /// Gauge record for `address`, computed on a cache miss
    ///
    /// Concurrent misses for the same address share one computation.
    ///
    /// # Errors
    ///
    /// [`GaugeError::InvalidAddress`] for malformed input,
    /// [`GaugeError::DeadlineExceeded`] past `config.fetch_timeout`, or any
    /// error of the batch chain. Nothing is stored on error.
    pub async fn find(&self, address: &str) -> Result<Gauge, GaugeError> {
        let key = parse_address(address)?;
        self.with_deadline(key, self.find_key(key)).await
    }

    /// Like [`find`](Self::find), aborting when `cancel` completes first
    ///
    /// Cancellation drops the in-flight batch chain; the cache keeps whatever
    /// it held before the call.
    pub async fn find_with_cancel<C>(&self, address: &str, cancel: C) -> Result<Gauge, GaugeError>
    where
        C: Future<Output = ()>,
    {
        let key = parse_address(address)?;
        tokio::select! {
            biased;
            _ = cancel => {
                info!(gauge = %key, "Gauge fetch cancelled");
                Err(GaugeError::Cancelled { address: render(key) })
            }
            result = self.with_deadline(key, self.find_key(key)) => result,
        }
    }

    /// Recompute the record for `address` and replace the cached one
    ///
    /// Callers that arrive while another fetch of the same address is in
    /// flight receive that fetch's record.
    pub async fn fetch(&self, address: &str) -> Result<Gauge, GaugeError> {
        let key = parse_address(address)?;
        let work = self
            .gauges
            .fetch_shared(&key, || self.build_gauge(key, false));
        self.with_deadline(key, work).await
    }

    /// Recompute the record for `address` unconditionally
    ///
    /// Unlike [`fetch`](Self::fetch) this never reuses a concurrent result, so
    /// the returned record reflects ledger state read after the call began.
    /// A failed refresh leaves the previous record in place.
    pub async fn refresh(&self, address: &str) -> Result<Gauge, GaugeError> {
        let key = parse_address(address)?;
        let work = self
            .gauges
            .refresh_with(&key, || self.build_gauge(key, true));
        self.with_deadline(key, work).await
    }

    /// Cached record for `address`, without fetching
    pub async fn cached(&self, address: &str) -> Result<Option<Gauge>, GaugeError> {
        let key = parse_address(address)?;
        Ok(self.gauges.find(&key).await?)
    }

    /// Drop the cached gauge and any cached pair pointing at it
    ///
    /// Returns the number of records removed.
    pub async fn invalidate(&self, address: &str) -> Result<usize, GaugeError> {
        let key = parse_address(address)?;
        let gauges = self.gauges.delete_where(&|g: &Gauge| g.address == key).await?;
        let pairs = self
            .pairs
            .delete_where(&|p: &Pair| p.gauge_address == key)
            .await?;
        Ok(gauges + pairs)
    }

    /// Gauge cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.gauges.stats().await
    }

    /// Protocol base yield in percent, memoized for `config.base_yield_ttl`
    ///
    /// `weekly growth * 52 / locked supply * 100`
    pub async fn rebase_apr(&self) -> Result<f64, GaugeError> {
        self.base_yield
            .get_or_compute(BASE_YIELD_KEY, self.config.base_yield_ttl, || {
                self.compute_base_yield()
                    .instrument(spans::rebase_apr(self.config.voter_address))
            })
            .await
    }

    async fn find_key(&self, key: Address) -> Result<Gauge, GaugeError> {
        self.gauges
            .get_or_fetch(&key, || self.build_gauge(key, false))
            .await
    }

    async fn with_deadline<T>(
        &self,
        key: Address,
        work: impl Future<Output = Result<T, GaugeError>>,
    ) -> Result<T, GaugeError> {
        let after = self.config.fetch_timeout;
        match tokio::time::timeout(after, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(gauge = %key, ?after, "Gauge fetch exceeded deadline");
                Err(GaugeError::DeadlineExceeded {
                    address: render(key),
                    after,
                })
            }
        }
    }

    async fn build_gauge(&self, address: Address, forced: bool) -> Result<Gauge, GaugeError> {
        let gauge = self
            .build_gauge_inner(address)
            .instrument(spans::fetch_gauge(address, forced))
            .await?;

        info!(
            gauge = %address,
            apr = gauge.apr,
            tbv = %gauge.tbv,
            rewards = gauge.rewards.len(),
            degraded = gauge.degraded,
            "Fetched gauge"
        );
        Ok(gauge)
    }

    async fn build_gauge_inner(&self, address: Address) -> Result<Gauge, GaugeError> {
        let config = &self.config;

        let primary = CallBatch::new()
            .with(CallDescriptor::new(
                address,
                "totalSupply()(uint256)",
                "total_supply",
            )?)?
            .with(
                CallDescriptor::new(address, "rewardRate(address)(uint256)", "reward_rate")?
                    .arg(DynSolValue::Address(config.default_token_address)),
            )?
            .with(
                CallDescriptor::new(
                    config.voter_address,
                    "external_bribes(address)(address)",
                    "bribe_address",
                )?
                .arg(DynSolValue::Address(address)),
            )?
            .with(
                CallDescriptor::new(
                    config.voter_address,
                    "internal_bribes(address)(address)",
                    "fees_address",
                )?
                .arg(DynSolValue::Address(address)),
            )?;
        let data = self.batcher.execute(primary).await?;

        let mut gauge = Gauge::new(address);
        gauge.decimals = DEFAULT_DECIMALS;
        gauge.total_supply = data.amount("total_supply")?.normalize(gauge.decimals);
        gauge.bribe_address = data.address("bribe_address")?;
        gauge.fees_address = data.address("fees_address")?;
        gauge.wrapped_bribe_address = gauge.bribe_address;

        let reward_token = self.resolve_token(config.default_token_address).await?;
        gauge.reward =
            reward_token.normalize(data.amount("reward_rate")?) * SECONDS_PER_DAY as f64;

        debug!(
            gauge = %address,
            total_supply = %gauge.total_supply,
            reward = %gauge.reward,
            bribe = %gauge.bribe_address,
            "Primary batch decoded"
        );

        let mut ledger = RewardLedger::new();
        if gauge.has_bribes() {
            self.collect_bribes(address, gauge.wrapped_bribe_address, &mut ledger)
                .instrument(spans::collect_bribes(address, gauge.wrapped_bribe_address))
                .await?;
        }

        match self.resolve_pair(address).await {
            Ok(pair) => {
                self.collect_fees(address, &pair, &mut ledger)
                    .instrument(spans::collect_fees(address, pair.address))
                    .await?;
                ledger.apply_to(&mut gauge);
                self.update_apr(&mut gauge, &pair, &reward_token)
                    .instrument(spans::update_apr(address, pair.address))
                    .await?;
            }
            Err(e) if e.is_not_found() && config.missing_pair_policy == MissingPairPolicy::Degrade => {
                warn!(gauge = %address, error = %e, "No pair for gauge, skipping fee and vote terms");
                ledger.apply_to(&mut gauge);
                gauge.apr = self.rebase_apr().await?;
                gauge.degraded = true;
            }
            Err(e) => return Err(e),
        }

        gauge.fetched_at = Utc::now();
        Ok(gauge)
    }

    /// Enumerate bribe tokens on `bribe` and record what is left of each
    async fn collect_bribes(
        &self,
        gauge: Address,
        bribe: Address,
        ledger: &mut RewardLedger,
    ) -> Result<(), GaugeError> {
        let count = self
            .batcher
            .execute(CallBatch::new().with(CallDescriptor::new(
                bribe,
                "rewardsListLength()(uint256)",
                "rewards_length",
            )?)?)
            .await?
            .u64("rewards_length")?;

        let count = usize::try_from(count).unwrap_or(usize::MAX);
        if count > self.config.max_bribe_tokens {
            return Err(GaugeError::data_inconsistency(format!(
                "bribe {} lists {count} reward tokens, limit is {}",
                render(bribe),
                self.config.max_bribe_tokens
            )));
        }

        let rewards = CallSignature::parse("rewards(uint256)(address)")?;
        let mut listing = CallBatch::new();
        for index in 0..count {
            listing.push(
                CallDescriptor::from_signature(bribe, rewards.clone(), format!("token_{index}"))
                    .arg(DynSolValue::Uint(U256::from(index), 256)),
            )?;
        }
        let listed = self.batcher.execute(listing).await?;

        let mut tokens: Vec<Address> = Vec::new();
        for index in 0..count {
            let token = listed.address(&format!("token_{index}"))?;
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        Span::current().record("tokens", tokens.len() as u64);

        let left_of = CallSignature::parse("left(address)(uint256)")?;
        let mut remaining = CallBatch::new();
        for (index, token) in tokens.iter().enumerate() {
            remaining.push(
                CallDescriptor::from_signature(bribe, left_of.clone(), format!("left_{index}"))
                    .arg(DynSolValue::Address(*token)),
            )?;
        }
        let left = self.batcher.execute(remaining).await?;

        let resolved = try_join_all(tokens.iter().map(|t| self.resolve_token(*t))).await?;
        for (index, token) in resolved.iter().enumerate() {
            let amount = token.normalize(left.amount(&format!("left_{index}"))?);
            ledger.add_reward(token, amount);
            debug!(gauge = %gauge, token = %token.address, %amount, "Bribe reward");
        }

        Ok(())
    }

    /// Attribute the gauge's internal fees to the pair's tokens
    async fn collect_fees(
        &self,
        gauge: Address,
        pair: &Pair,
        ledger: &mut RewardLedger,
    ) -> Result<(), GaugeError> {
        let batch = CallBatch::new()
            .with(CallDescriptor::new(gauge, "fees0()(uint256)", "fees0")?)?
            .with(CallDescriptor::new(gauge, "fees1()(uint256)", "fees1")?)?;
        let fees = self.batcher.execute(batch).await?;

        let (token0, token1) = tokio::try_join!(
            self.resolve_token(pair.token0_address),
            self.resolve_token(pair.token1_address)
        )?;

        for (token, field) in [(&token0, "fees0"), (&token1, "fees1")] {
            let amount = token.normalize(fees.amount(field)?);
            ledger.add_fee(token, amount);
            debug!(gauge = %gauge, token = %token.address, %amount, "Fee reward");
        }

        Ok(())
    }

    /// Base yield plus the bribe term when the votes have a positive value
    async fn update_apr(
        &self,
        gauge: &mut Gauge,
        pair: &Pair,
        reward_token: &Token,
    ) -> Result<(), GaugeError> {
        let weights = CallDescriptor::new(
            self.config.voter_address,
            "weights(address)(uint256)",
            "votes",
        )?
        .arg(DynSolValue::Address(pair.address));
        let votes = self
            .batcher
            .execute(CallBatch::new().with(weights)?)
            .await?
            .amount("votes")?;
        let votes = reward_token.normalize(votes);

        gauge.apr = self.rebase_apr().await?;

        if let Some(vote_value) = reward_token.value_of(votes).filter(|v| v.as_f64() > 0.0) {
            gauge.votes = votes;
            gauge.apr += (gauge.tbv.as_f64() * WEEKS_PER_YEAR) / vote_value.as_f64() * 100.0;
        }

        Ok(())
    }

    async fn compute_base_yield(&self) -> Result<f64, GaugeError> {
        let voter = self.config.voter_address;

        let minter = self
            .batcher
            .execute(CallBatch::new().with(CallDescriptor::new(voter, "minter()(address)", "minter")?)?)
            .await?
            .address("minter")?;

        let emission = CallBatch::new()
            .with(CallDescriptor::new(minter, "weekly_emission()(uint256)", "weekly")?)?
            .with(CallDescriptor::new(
                self.config.ve_address,
                "supply()(uint256)",
                "supply",
            )?)?;
        let emission = self.batcher.execute(emission).await?;
        let weekly = emission.uint("weekly")?;
        let supply = emission.amount("supply")?;

        if supply.is_zero() {
            return Err(GaugeError::data_inconsistency(
                "voting escrow supply is zero, base yield undefined",
            ));
        }

        let growth = CallDescriptor::new(minter, "calculate_growth(uint256)(uint256)", "growth")?
            .arg(DynSolValue::Uint(weekly, 256));
        let growth = self
            .batcher
            .execute(CallBatch::new().with(growth)?)
            .await?
            .amount("growth")?;

        let base_yield = growth.as_f64() * WEEKS_PER_YEAR / supply.as_f64() * 100.0;
        debug!(%minter, base_yield, "Computed base yield");
        Ok(base_yield)
    }

    async fn resolve_token(&self, address: Address) -> Result<Token, GaugeError> {
        self.tokens
            .get_or_fetch(&address, || self.load_token(address))
            .await
    }

    async fn load_token(&self, address: Address) -> Result<Token, GaugeError> {
        let token = self.token_source.fetch_token(address).await?;
        if token.decimals.is_zero() {
            return Err(GaugeError::data_inconsistency(format!(
                "token {} reports zero decimals",
                render(address)
            )));
        }
        Ok(token)
    }

    async fn resolve_pair(&self, gauge: Address) -> Result<Pair, GaugeError> {
        if let Some(pair) = self
            .pairs
            .find_where(&|p: &Pair| p.gauge_address == gauge)
            .await?
        {
            return Ok(pair);
        }

        let pair = self.pair_source.pair_for_gauge(gauge).await?;
        self.pairs.save(pair.clone()).await?;
        Ok(pair)
    }
}

/// Lowercase `0x` rendering used in error messages
fn render(address: Address) -> String {
    format!("{address:#x}")
}
