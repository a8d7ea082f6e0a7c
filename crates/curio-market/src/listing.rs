//! Listing state machine.
//!
//! A listing escrows one asset at a fixed price and moves
//! `Active -> Sold` or `Active -> Cancelled`, both terminal. The
//! status is a tagged enum, so "sold and cancelled at once" is
//! unrepresentable.

use std::fmt;

use chrono::{DateTime, Utc};
use curio_core::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::custody::AssetId;
use crate::error::MarketError;

/// Monotonic listing identifier, assigned at creation, never reused.
///
/// Ids start at 1; zero is never assigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ListingId(u64);

impl ListingId {
    /// Wraps a raw id value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Asset escrowed, open for purchase and offers.
    Active,
    /// Settled; asset released to the buyer.
    Sold,
    /// Withdrawn by the seller; asset returned.
    Cancelled,
}

impl ListingStatus {
    /// Returns true if the listing has left the active state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Sold | Self::Cancelled)
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Sold => write!(f, "sold"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A fixed-price listing for one escrowed asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketItem {
    /// Listing id.
    pub id: ListingId,

    /// The escrowed asset.
    pub asset: AssetId,

    /// Who listed the asset.
    pub seller: Address,

    /// Set exactly when the listing is sold.
    pub buyer: Option<Address>,

    /// Free-text category label.
    pub category: String,

    /// Fixed asking price in smallest currency units.
    pub price: Amount,

    /// Current state.
    pub status: ListingStatus,

    /// Creation timestamp.
    pub listed_at: DateTime<Utc>,
}

impl MarketItem {
    /// Creates a new active listing.
    #[must_use]
    pub fn new(
        id: ListingId,
        asset: AssetId,
        seller: Address,
        category: String,
        price: Amount,
    ) -> Self {
        Self {
            id,
            asset,
            seller,
            buyer: None,
            category,
            price,
            status: ListingStatus::Active,
            listed_at: Utc::now(),
        }
    }

    /// Returns true while the listing is open for purchase and offers.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, ListingStatus::Active)
    }

    /// Returns true once the listing has settled.
    #[must_use]
    pub const fn is_sold(&self) -> bool {
        matches!(self.status, ListingStatus::Sold)
    }

    /// Marks the listing sold and records the buyer.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` if the listing is already terminal.
    pub fn mark_sold(&mut self, buyer: Address) -> Result<(), MarketError> {
        if !self.is_active() {
            return Err(MarketError::NotActive {
                id: self.id,
                status: self.status,
            });
        }
        self.status = ListingStatus::Sold;
        self.buyer = Some(buyer);
        Ok(())
    }

    /// Marks the listing cancelled.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` if the listing is already terminal.
    pub fn mark_cancelled(&mut self) -> Result<(), MarketError> {
        if !self.is_active() {
            return Err(MarketError::NotActive {
                id: self.id,
                status: self.status,
            });
        }
        self.status = ListingStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_core::Wallet;

    fn sample_item() -> MarketItem {
        let seller = Wallet::generate().expect("seller").address().clone();
        let collection = Wallet::generate().expect("collection").address().clone();
        MarketItem::new(
            ListingId::new(1),
            AssetId::new(collection, 7),
            seller,
            "art".to_string(),
            Amount::from_units(100),
        )
    }

    #[test]
    fn new_listing_is_active_with_no_buyer() {
        let item = sample_item();
        assert!(item.is_active());
        assert!(item.buyer.is_none());
        assert!(!item.status.is_terminal());
    }

    #[test]
    fn mark_sold_records_buyer() {
        let mut item = sample_item();
        let buyer = Wallet::generate().expect("buyer").address().clone();
        item.mark_sold(buyer.clone()).expect("should sell");
        assert_eq!(item.status, ListingStatus::Sold);
        assert_eq!(item.buyer, Some(buyer));
        assert!(item.status.is_terminal());
    }

    #[test]
    fn mark_cancelled_is_terminal() {
        let mut item = sample_item();
        item.mark_cancelled().expect("should cancel");
        assert_eq!(item.status, ListingStatus::Cancelled);
        assert!(item.buyer.is_none());
    }

    #[test]
    fn sold_listing_cannot_be_cancelled() {
        let mut item = sample_item();
        let buyer = Wallet::generate().expect("buyer").address().clone();
        item.mark_sold(buyer).expect("should sell");
        let result = item.mark_cancelled();
        assert!(matches!(result, Err(MarketError::NotActive { .. })));
        assert_eq!(item.status, ListingStatus::Sold);
    }

    #[test]
    fn cancelled_listing_cannot_be_sold() {
        let mut item = sample_item();
        item.mark_cancelled().expect("should cancel");
        let buyer = Wallet::generate().expect("buyer").address().clone();
        let result = item.mark_sold(buyer);
        assert!(matches!(result, Err(MarketError::NotActive { .. })));
        assert_eq!(item.status, ListingStatus::Cancelled);
        assert!(item.buyer.is_none());
    }

    #[test]
    fn double_sell_fails_without_changing_buyer() {
        let mut item = sample_item();
        let first = Wallet::generate().expect("first").address().clone();
        let second = Wallet::generate().expect("second").address().clone();
        item.mark_sold(first.clone()).expect("should sell");
        assert!(item.mark_sold(second).is_err());
        assert_eq!(item.buyer, Some(first));
    }

    #[test]
    fn listing_serialization_roundtrip() {
        let item = sample_item();
        let json = serde_json::to_string(&item).expect("serialize");
        let restored: MarketItem = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(item.id, restored.id);
        assert_eq!(item.price, restored.price);
        assert_eq!(item.status, restored.status);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ListingStatus::Cancelled).expect("serialize");
        assert_eq!(json, r#""cancelled""#);
    }
}
