// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for gaugescan integration tests
//!
//! Provides mock implementations of the collaborator traits so the pipeline
//! can be exercised without a real ledger.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{address, Address, Bytes, U256};
use async_trait::async_trait;
use gaugescan::{
    BatchTransport, CallBatcher, CallSignature, GaugePipeline, GaugescanConfig,
    GaugescanConfigBuilder, LookupError, Pair, PairSource, RawCall, RawReturn, RpcError, Token,
    TokenPrice, TokenSource,
};

pub const VOTER: Address = address!("1000000000000000000000000000000000000001");
pub const VE: Address = address!("1000000000000000000000000000000000000002");
pub const MINTER: Address = address!("1000000000000000000000000000000000000003");
pub const REWARD_TOKEN: Address = address!("2000000000000000000000000000000000000001");
pub const TOKEN0: Address = address!("2000000000000000000000000000000000000002");
pub const TOKEN1: Address = address!("2000000000000000000000000000000000000003");
pub const BRIBE_TOKEN_A: Address = address!("2000000000000000000000000000000000000004");
pub const BRIBE_TOKEN_B: Address = address!("2000000000000000000000000000000000000005");
pub const GAUGE: Address = address!("3b1f00000000000000000000000000000000abcd");
pub const PAIR: Address = address!("4000000000000000000000000000000000000001");
pub const FEES: Address = address!("5000000000000000000000000000000000000001");
pub const BRIBE: Address = address!("5000000000000000000000000000000000000002");

/// `10^18 * whole`
pub fn ether(whole: u128) -> U256 {
    U256::from(whole * 10u128.pow(18))
}

pub fn uint(value: impl Into<U256>) -> DynSolValue {
    DynSolValue::Uint(value.into(), 256)
}

pub fn addr(value: Address) -> DynSolValue {
    DynSolValue::Address(value)
}

/// Gauge address in checksum-free lowercase form
pub fn gauge_key() -> String {
    format!("{GAUGE:#x}")
}

/// Mock [`BatchTransport`] answering encoded calls from a table
///
/// Calls are matched on `(target, calldata)`. A call with no entry comes back
/// reverted. Every `aggregate` counts as one round trip.
#[derive(Default)]
pub struct MockLedger {
    answers: Mutex<HashMap<(Address, Bytes), RawReturn>>,
    round_trips: AtomicUsize,
    offline: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `signature(args)` on `target` with `outputs`
    pub fn on(&self, target: Address, signature: &str, args: Vec<DynSolValue>, outputs: Vec<DynSolValue>) {
        let signature = CallSignature::parse(signature).unwrap();
        let call_data = signature.encode_call("mock", &args).unwrap();
        let answer = RawReturn::ok(signature.encode_output(&outputs));
        self.answers.lock().unwrap().insert((target, call_data), answer);
    }

    /// Answer `signature(args)` on `target` with raw bytes
    pub fn on_raw(&self, target: Address, signature: &str, args: Vec<DynSolValue>, data: Bytes) {
        let signature = CallSignature::parse(signature).unwrap();
        let call_data = signature.encode_call("mock", &args).unwrap();
        self.answers
            .lock()
            .unwrap()
            .insert((target, call_data), RawReturn::ok(data));
    }

    /// Make `signature(args)` on `target` revert
    pub fn revert(&self, target: Address, signature: &str, args: Vec<DynSolValue>) {
        let signature = CallSignature::parse(signature).unwrap();
        let call_data = signature.encode_call("mock", &args).unwrap();
        self.answers
            .lock()
            .unwrap()
            .insert((target, call_data), RawReturn::reverted());
    }

    /// Fail every round trip at the transport level
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Sleep before answering each round trip
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchTransport for MockLedger {
    async fn aggregate(&self, calls: Vec<RawCall>) -> Result<Vec<RawReturn>, RpcError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.round_trips.fetch_add(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(RpcError::chain_connection_failed(
                format!("aggregate3 ({} calls)", calls.len()),
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "ledger offline"),
            ));
        }

        let answers = self.answers.lock().unwrap();
        Ok(calls
            .into_iter()
            .map(|call| {
                answers
                    .get(&(call.target, call.call_data))
                    .cloned()
                    .unwrap_or_else(RawReturn::reverted)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Mock [`TokenSource`] backed by a map
#[derive(Default)]
pub struct MockTokens {
    tokens: Mutex<HashMap<Address, Token>>,
    fetches: AtomicUsize,
}

impl MockTokens {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, address: Address, decimals: u8, price: Option<f64>) {
        self.tokens
            .lock()
            .unwrap()
            .insert(address, Token::new(address, decimals, price.map(TokenPrice::new)));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for MockTokens {
    async fn fetch_token(&self, address: Address) -> Result<Token, LookupError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .get(&address)
            .cloned()
            .ok_or_else(|| LookupError::not_found("token", address))
    }
}

/// Mock [`PairSource`] backed by a map keyed on gauge address
#[derive(Default)]
pub struct MockPairs {
    pairs: Mutex<HashMap<Address, Pair>>,
    lookups: AtomicUsize,
}

impl MockPairs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, pair: Pair) {
        self.pairs.lock().unwrap().insert(pair.gauge_address, pair);
    }

    pub fn clear(&self) {
        self.pairs.lock().unwrap().clear();
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PairSource for MockPairs {
    async fn pair_for_gauge(&self, gauge: Address) -> Result<Pair, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.pairs
            .lock()
            .unwrap()
            .get(&gauge)
            .cloned()
            .ok_or_else(|| LookupError::not_found("pair", gauge))
    }
}

/// Ledger, token and pair fixtures for one gauge
///
/// The default scenario has no bribes, 0.5 of a 6-decimal token in fees,
/// 100 votes at a price of 2.0 and a 10% base yield, for an APR of 23.
pub struct Scenario {
    pub ledger: Arc<MockLedger>,
    pub tokens: Arc<MockTokens>,
    pub pairs: Arc<MockPairs>,
}

impl Scenario {
    pub fn new() -> Self {
        let ledger = MockLedger::new();
        let tokens = MockTokens::new();
        let pairs = MockPairs::new();

        ledger.on(GAUGE, "totalSupply()(uint256)", vec![], vec![uint(ether(2))]);
        ledger.on(
            GAUGE,
            "rewardRate(address)(uint256)",
            vec![addr(REWARD_TOKEN)],
            vec![uint(U256::from(1_000_000_000_000u64))],
        );
        ledger.on(
            VOTER,
            "external_bribes(address)(address)",
            vec![addr(GAUGE)],
            vec![addr(Address::ZERO)],
        );
        ledger.on(
            VOTER,
            "internal_bribes(address)(address)",
            vec![addr(GAUGE)],
            vec![addr(FEES)],
        );
        ledger.on(GAUGE, "fees0()(uint256)", vec![], vec![uint(U256::from(500_000u64))]);
        ledger.on(GAUGE, "fees1()(uint256)", vec![], vec![uint(U256::ZERO)]);
        ledger.on(
            VOTER,
            "weights(address)(uint256)",
            vec![addr(PAIR)],
            vec![uint(ether(100))],
        );
        ledger.on(VOTER, "minter()(address)", vec![], vec![addr(MINTER)]);
        ledger.on(MINTER, "weekly_emission()(uint256)", vec![], vec![uint(ether(5))]);
        ledger.on(VE, "supply()(uint256)", vec![], vec![uint(ether(520))]);
        ledger.on(
            MINTER,
            "calculate_growth(uint256)(uint256)",
            vec![uint(ether(5))],
            vec![uint(ether(1))],
        );

        tokens.insert(REWARD_TOKEN, 18, Some(2.0));
        tokens.insert(TOKEN0, 6, Some(1.0));
        tokens.insert(TOKEN1, 18, Some(3.0));

        pairs.insert(Pair {
            address: PAIR,
            token0_address: TOKEN0,
            token1_address: TOKEN1,
            gauge_address: GAUGE,
        });

        Self {
            ledger,
            tokens,
            pairs,
        }
    }

    /// Route bribes through `BRIBE` listing tokens A, B and A again
    ///
    /// A is priced at 4.0 with 1.0 left; B is unpriced with 3.0 left.
    pub fn with_bribes(self) -> Self {
        self.ledger.on(
            VOTER,
            "external_bribes(address)(address)",
            vec![addr(GAUGE)],
            vec![addr(BRIBE)],
        );
        self.ledger
            .on(BRIBE, "rewardsListLength()(uint256)", vec![], vec![uint(U256::from(3u64))]);
        for (index, token) in [BRIBE_TOKEN_A, BRIBE_TOKEN_B, BRIBE_TOKEN_A].into_iter().enumerate() {
            self.ledger.on(
                BRIBE,
                "rewards(uint256)(address)",
                vec![uint(U256::from(index as u64))],
                vec![addr(token)],
            );
        }
        self.ledger.on(
            BRIBE,
            "left(address)(uint256)",
            vec![addr(BRIBE_TOKEN_A)],
            vec![uint(ether(1))],
        );
        self.ledger.on(
            BRIBE,
            "left(address)(uint256)",
            vec![addr(BRIBE_TOKEN_B)],
            vec![uint(ether(3))],
        );
        self.tokens.insert(BRIBE_TOKEN_A, 18, Some(4.0));
        self.tokens.insert(BRIBE_TOKEN_B, 18, None);
        self
    }

    pub fn config(&self) -> GaugescanConfigBuilder {
        GaugescanConfigBuilder::new(VOTER, REWARD_TOKEN, VE)
    }

    pub fn pipeline(&self) -> GaugePipeline {
        self.pipeline_with(self.config().build())
    }

    pub fn pipeline_with(&self, config: GaugescanConfig) -> GaugePipeline {
        let transport: Arc<dyn BatchTransport> = self.ledger.clone();
        GaugePipeline::new(
            config,
            CallBatcher::from_shared(transport),
            self.tokens.clone(),
            self.pairs.clone(),
        )
    }
}

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assert two floats agree to 1e-9 relative
pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = expected.abs().max(1.0) * 1e-9;
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}
