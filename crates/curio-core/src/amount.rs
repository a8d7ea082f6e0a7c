//! Monetary amount type in smallest currency units.
//!
//! Listing prices and offer amounts are integers in the smallest unit
//! of the settlement currency. All arithmetic is overflow-checked;
//! the fee calculator additionally needs multiply-before-divide with a
//! wide intermediate, which [`Amount::mul_div`] provides.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A monetary amount in smallest currency units.
///
/// Internally a `u64`; negative amounts are unrepresentable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(0);

    /// Maximum possible amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an amount from smallest-unit count.
    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Returns the amount as a smallest-unit count.
    #[must_use]
    pub const fn as_units(self) -> u64 {
        self.0
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication by a scalar. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_mul(self, rhs: u64) -> Option<Self> {
        match self.0.checked_mul(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked division by a scalar. Returns `None` if the divisor is zero.
    #[must_use]
    pub const fn checked_div(self, rhs: u64) -> Option<Self> {
        match self.0.checked_div(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Computes `floor(self * numer / denom)` through a `u128`
    /// intermediate, so the multiplication cannot overflow before the
    /// division is applied.
    ///
    /// Returns `None` if `denom` is zero or the result does not fit
    /// in a `u64`.
    #[must_use]
    pub const fn mul_div(self, numer: u64, denom: u64) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        let wide = self.0 as u128 * numer as u128 / denom as u128;
        if wide > u64::MAX as u128 {
            None
        } else {
            Some(Self(wide as u64))
        }
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('-') {
            return Err(CoreError::InvalidAmount(
                "negative values not allowed".into(),
            ));
        }
        s.parse::<u64>()
            .map(Amount)
            .map_err(|_| CoreError::InvalidAmount(format!("invalid number: {s}")))
    }
}
