// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for amount normalization and reward accumulation

use alloy_primitives::{Address, U256};
use gaugescan::{NormalizedAmount, RewardLedger, Token, TokenAmount, TokenDecimals, TokenPrice};
use proptest::prelude::*;

fn arb_decimals() -> impl Strategy<Value = u8> {
    prop_oneof![Just(6u8), Just(8u8), Just(18u8), 1u8..=36]
}

proptest! {
    /// Property: normalizing `whole * 10^d` raw units yields `whole`
    #[test]
    fn prop_whole_units_round_trip(whole in 0u64..1_000_000_000, decimals in 1u8..=18) {
        let raw = U256::from(whole) * U256::from(10u64).pow(U256::from(decimals));
        let normalized = TokenAmount::new(raw).normalize(TokenDecimals::new(decimals));
        let expected = whole as f64;
        prop_assert!((normalized.as_f64() - expected).abs() <= expected * 1e-12);
    }

    /// Property: more decimals never produce a larger amount
    #[test]
    fn prop_normalization_is_monotone_in_decimals(raw in any::<u128>(), decimals in arb_decimals()) {
        let amount = TokenAmount::new(U256::from(raw));
        let fewer = amount.normalize(TokenDecimals::new(decimals));
        let more = amount.normalize(TokenDecimals::new(decimals.saturating_add(1)));
        prop_assert!(more.as_f64() <= fewer.as_f64());
        prop_assert!(fewer.as_f64() >= 0.0);
    }

    /// Property: tbv equals the priced share of everything added, fees included
    #[test]
    fn prop_tbv_is_sum_of_priced_values(
        bribes in prop::collection::vec((0u8..4, 0.0f64..1e6), 0..16),
        fees in prop::collection::vec((0u8..4, 0.0f64..1e6), 0..16),
    ) {
        let tokens: Vec<Token> = (0u8..4)
            .map(|i| {
                let price = (i % 2 == 0).then(|| TokenPrice::new(f64::from(i) + 0.5));
                Token::new(Address::with_last_byte(i + 1), 18, price)
            })
            .collect();

        let mut ledger = RewardLedger::new();
        let mut expected_tbv = 0.0;
        let mut expected_fees = 0.0;

        for (index, amount) in &bribes {
            let token = &tokens[*index as usize];
            ledger.add_reward(token, NormalizedAmount::new(*amount));
            if let Some(price) = token.price {
                expected_tbv += price.as_f64() * amount;
            }
        }
        for (index, amount) in &fees {
            let token = &tokens[*index as usize];
            ledger.add_fee(token, NormalizedAmount::new(*amount));
            if let Some(price) = token.price {
                expected_tbv += price.as_f64() * amount;
                expected_fees += price.as_f64() * amount;
            }
        }

        let tolerance = expected_tbv.max(1.0) * 1e-9;
        prop_assert!((ledger.tbv().as_f64() - expected_tbv).abs() <= tolerance);
        prop_assert!((ledger.fees().as_f64() - expected_fees).abs() <= tolerance);
        prop_assert!(ledger.fees().as_f64() <= ledger.tbv().as_f64() + tolerance);
    }
}
