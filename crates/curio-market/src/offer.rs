//! Offer state machine.
//!
//! Offers are escrowed bids against one listing. Each moves
//! `Open -> Accepted` or `Open -> Cancelled` independently of its
//! siblings; terminal offers stay in storage for audit but never
//! transition again.

use std::fmt;

use chrono::{DateTime, Utc};
use curio_core::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::listing::ListingId;

/// The state of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Funds escrowed, awaiting seller decision.
    Open,
    /// Settled; funds paid out, asset released to the bidder.
    Accepted,
    /// Withdrawn by the bidder; funds refunded.
    Cancelled,
}

impl OfferStatus {
    /// Returns true while the offer can still be accepted or cancelled.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Accepted => write!(f, "accepted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An escrowed offer against one listing.
///
/// The index is unique only within the listing's offer sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOffer {
    /// The listing this offer targets.
    pub listing: ListingId,

    /// Position within the listing's offer sequence.
    pub index: u32,

    /// Who submitted the offer.
    pub bidder: Address,

    /// Escrowed amount, owned by the bidder until accepted.
    pub amount: Amount,

    /// Submission timestamp.
    pub created_at: DateTime<Utc>,

    /// Current state.
    pub status: OfferStatus,
}

impl MarketOffer {
    /// Creates a new open offer.
    #[must_use]
    pub fn new(listing: ListingId, index: u32, bidder: Address, amount: Amount) -> Self {
        Self {
            listing,
            index,
            bidder,
            amount,
            created_at: Utc::now(),
            status: OfferStatus::Open,
        }
    }

    /// Returns true while the offer is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Marks the offer accepted.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFinalized` if the offer is terminal.
    pub fn accept(&mut self) -> Result<(), MarketError> {
        if !self.is_open() {
            return Err(MarketError::AlreadyFinalized {
                listing: self.listing,
                index: self.index,
                status: self.status,
            });
        }
        self.status = OfferStatus::Accepted;
        Ok(())
    }

    /// Marks the offer cancelled.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFinalized` if the offer is terminal.
    pub fn cancel(&mut self) -> Result<(), MarketError> {
        if !self.is_open() {
            return Err(MarketError::AlreadyFinalized {
                listing: self.listing,
                index: self.index,
                status: self.status,
            });
        }
        self.status = OfferStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_core::Wallet;

    fn sample_offer() -> MarketOffer {
        let bidder = Wallet::generate().expect("bidder").address().clone();
        MarketOffer::new(ListingId::new(1), 0, bidder, Amount::from_units(50))
    }

    #[test]
    fn new_offer_is_open() {
        let offer = sample_offer();
        assert!(offer.is_open());
        assert_eq!(offer.status, OfferStatus::Open);
    }

    #[test]
    fn accept_finalizes_offer() {
        let mut offer = sample_offer();
        offer.accept().expect("should accept");
        assert_eq!(offer.status, OfferStatus::Accepted);
        assert!(!offer.is_open());
    }

    #[test]
    fn cancel_finalizes_offer() {
        let mut offer = sample_offer();
        offer.cancel().expect("should cancel");
        assert_eq!(offer.status, OfferStatus::Cancelled);
    }

    #[test]
    fn cancelled_offer_cannot_be_accepted() {
        let mut offer = sample_offer();
        offer.cancel().expect("should cancel");
        let result = offer.accept();
        assert!(matches!(result, Err(MarketError::AlreadyFinalized { .. })));
        assert_eq!(offer.status, OfferStatus::Cancelled);
    }

    #[test]
    fn accepted_offer_cannot_be_cancelled() {
        let mut offer = sample_offer();
        offer.accept().expect("should accept");
        let result = offer.cancel();
        assert!(matches!(result, Err(MarketError::AlreadyFinalized { .. })));
        assert_eq!(offer.status, OfferStatus::Accepted);
    }

    #[test]
    fn double_cancel_fails() {
        let mut offer = sample_offer();
        offer.cancel().expect("first cancel");
        assert!(offer.cancel().is_err());
    }

    #[test]
    fn finalized_error_names_offer() {
        let mut offer = sample_offer();
        offer.accept().expect("should accept");
        let err = offer.accept().expect_err("terminal");
        assert!(err.to_string().contains("accepted"));
    }

    #[test]
    fn offer_serialization_roundtrip() {
        let offer = sample_offer();
        let json = serde_json::to_string(&offer).expect("serialize");
        let restored: MarketOffer = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(offer.index, restored.index);
        assert_eq!(offer.amount, restored.amount);
        assert_eq!(offer.status, restored.status);
    }
}
