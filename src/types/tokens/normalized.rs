// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Whole-unit token amounts

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// An amount in whole tokens (0.5 USDC, not 500000)
///
/// Never negative: `new` clamps negative input to zero.
///
/// ```
/// use gaugescan::NormalizedAmount;
///
/// let mut accrued = NormalizedAmount::new(1.5);
/// accrued += NormalizedAmount::new(0.25);
/// assert_eq!(accrued.as_f64(), 1.75);
/// assert!(NormalizedAmount::new(-5.0).is_zero());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedAmount(f64);

impl NormalizedAmount {
    pub const ZERO: Self = Self(0.0);

    pub fn new(amount: f64) -> Self {
        Self(amount.max(0.0))
    }

    pub const fn as_f64(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl Add for NormalizedAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for NormalizedAmount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Scaling, e.g. a per-second rate to a per-day amount
impl Mul<f64> for NormalizedAmount {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::new(self.0 * factor)
    }
}

impl std::fmt::Display for NormalizedAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
