// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Accumulator for bribe and fee rewards

use std::collections::HashMap;

use alloy_primitives::Address;

use crate::{Gauge, NormalizedAmount, Token, UsdValue};

/// Rewards collected while building one gauge record
///
/// Bribes and fees are added in pipeline order and folded into the record
/// once at the end, so a partially collected ledger is never visible.
///
/// # Examples
///
/// ```
/// use alloy_primitives::address;
/// use gaugescan::{NormalizedAmount, RewardLedger, Token, TokenPrice};
///
/// let usdc = Token::new(
///     address!("00000000000000000000000000000000000000c6"),
///     6,
///     Some(TokenPrice::new(1.0)),
/// );
///
/// let mut ledger = RewardLedger::new();
/// ledger.add_fee(&usdc, NormalizedAmount::new(0.5));
/// assert_eq!(ledger.fees().as_f64(), 0.5);
/// assert_eq!(ledger.tbv().as_f64(), 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardLedger {
    rewards: HashMap<Address, NormalizedAmount>,
    fees: UsdValue,
    tbv: UsdValue,
}

impl RewardLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bribe of `amount` in `token`
    ///
    /// Priced bribes add their value to the total bribe value.
    pub fn add_reward(&mut self, token: &Token, amount: NormalizedAmount) {
        *self.rewards.entry(token.address).or_default() += amount;
        if let Some(value) = token.value_of(amount) {
            self.tbv += value;
        }
    }

    /// Record an internal fee of `amount` in `token`
    ///
    /// A fee adds to an existing reward entry for the token; without one it
    /// creates an entry only when non-zero. Priced fees count towards both
    /// fees and the total bribe value.
    pub fn add_fee(&mut self, token: &Token, amount: NormalizedAmount) {
        match self.rewards.get_mut(&token.address) {
            Some(existing) => *existing += amount,
            None if !amount.is_zero() => {
                self.rewards.insert(token.address, amount);
            }
            None => {}
        }

        if let Some(value) = token.value_of(amount) {
            self.tbv += value;
            self.fees += value;
        }
    }

    /// Accrued amount per token
    pub fn rewards(&self) -> &HashMap<Address, NormalizedAmount> {
        &self.rewards
    }

    /// Value of internal fees
    pub fn fees(&self) -> UsdValue {
        self.fees
    }

    /// Total bribe value
    pub fn tbv(&self) -> UsdValue {
        self.tbv
    }

    /// Move the collected rewards into `gauge`
    pub fn apply_to(self, gauge: &mut Gauge) {
        gauge.rewards = self.rewards;
        gauge.fees = self.fees;
        gauge.tbv = self.tbv;
    }
}
