//! Buyer-specific fee discounts.
//!
//! An optional external collaborator can reduce a specific buyer's
//! effective fee percentage. A lookup failure aborts the enclosing
//! sale rather than defaulting to any discount.

use std::collections::HashMap;

use curio_core::Address;
use thiserror::Error;

/// Errors raised by discount providers.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// The provider could not answer the lookup.
    #[error("{0}")]
    Provider(String),
}

/// Lookup of a buyer's fee discount percentage (0–100).
pub trait DiscountProvider: Send + Sync {
    /// Returns the buyer's discount percentage.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails; the enclosing sale is
    /// aborted.
    fn discount_for(&self, buyer: &Address) -> Result<u8, DiscountError>;
}

/// Map-backed discount provider.
///
/// Buyers absent from the map get no discount.
#[derive(Debug, Default)]
pub struct StaticDiscounts {
    discounts: HashMap<Address, u8>,
}

impl StaticDiscounts {
    /// Creates an empty provider (no discounts for anyone).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a discount percentage for a buyer.
    #[must_use]
    pub fn with_discount(mut self, buyer: &Address, percent: u8) -> Self {
        self.discounts.insert(buyer.clone(), percent);
        self
    }
}

impl DiscountProvider for StaticDiscounts {
    fn discount_for(&self, buyer: &Address) -> Result<u8, DiscountError> {
        Ok(self.discounts.get(buyer).copied().unwrap_or(0))
    }
}
