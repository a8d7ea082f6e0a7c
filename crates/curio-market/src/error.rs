//! Error types for curio-market.

use curio_core::{Amount, CoreError};
use thiserror::Error;

use crate::custody::CustodyError;
use crate::discount::DiscountError;
use crate::listing::{ListingId, ListingStatus};
use crate::offer::OfferStatus;

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors that can occur in marketplace operations.
///
/// Validation and authorization errors are raised before any state is
/// touched; external-call failures abort the enclosing operation with
/// no persisted effect.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Listing price must be strictly positive.
    #[error("listing price must be positive")]
    InvalidPrice,

    /// Offer amount must be strictly positive.
    #[error("offer amount must be positive")]
    ZeroAmount,

    /// Fixed-price purchase must pay the listed price exactly.
    #[error("wrong payment amount: expected {expected}, got {actual}")]
    WrongAmount {
        /// The listed price.
        expected: Amount,
        /// The payment supplied by the caller.
        actual: Amount,
    },

    /// A seller cannot buy their own listing.
    #[error("seller cannot buy their own listing")]
    SelfPurchase,

    /// A seller cannot bid on their own listing.
    #[error("seller cannot bid on their own listing")]
    SelfOffer,

    /// Discount percentages above 100 would invert the fee.
    #[error("discount percent {percent} exceeds 100")]
    InvalidDiscount {
        /// The rejected discount percentage.
        percent: u8,
    },

    /// Fee percentage above the marketplace cap.
    #[error("fee percent {percent} exceeds the cap of {max}")]
    FeeTooHigh {
        /// The rejected fee percentage.
        percent: u8,
        /// The configured maximum.
        max: u8,
    },

    /// Caller is not the seller of the listing.
    #[error("caller is not the seller of listing {listing}")]
    NotSeller {
        /// The listing in question.
        listing: ListingId,
    },

    /// Caller is not the bidder of the offer.
    #[error("caller is not the bidder of offer {index} on listing {listing}")]
    NotBidder {
        /// The listing in question.
        listing: ListingId,
        /// The offer index within the listing.
        index: u32,
    },

    /// Caller is not the marketplace administrator.
    #[error("caller is not the marketplace administrator")]
    NotAdmin,

    /// No listing with this id.
    #[error("no such listing: {0}")]
    InvalidListing(ListingId),

    /// The listing has already left the active state.
    #[error("listing {id} is not active: {status}")]
    NotActive {
        /// The listing in question.
        id: ListingId,
        /// Its current terminal status.
        status: ListingStatus,
    },

    /// No offer at this index for the listing.
    #[error("no offer {index} on listing {listing}")]
    InvalidOfferIndex {
        /// The listing in question.
        listing: ListingId,
        /// The out-of-range offer index.
        index: u32,
    },

    /// The offer has already been accepted or cancelled.
    #[error("offer {index} on listing {listing} already finalized: {status}")]
    AlreadyFinalized {
        /// The listing in question.
        listing: ListingId,
        /// The offer index within the listing.
        index: u32,
        /// Its current terminal status.
        status: OfferStatus,
    },

    /// Caller's internal account cannot cover the operation.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount required for the operation.
        required: Amount,
        /// Amount currently available.
        available: Amount,
    },

    /// Arithmetic overflow during fee or settlement computation.
    #[error("arithmetic overflow in settlement")]
    Overflow,

    /// The engine no longer holds custody of an asset it believed
    /// escrowed. Fatal for the operation; never silently repaired.
    #[error("engine does not hold custody of the asset for listing {listing}")]
    CustodyInvariantViolated {
        /// The listing whose escrow is broken.
        listing: ListingId,
    },

    /// Asset-custody call failed; the enclosing operation is aborted.
    #[error("custody transfer failed: {0}")]
    Custody(#[from] CustodyError),

    /// Discount lookup failed; the enclosing operation is aborted.
    #[error("discount lookup failed: {0}")]
    Discount(#[from] DiscountError),

    /// A nested call re-entered the engine mid-operation.
    #[error("reentrant call rejected")]
    Reentrancy,

    /// Core primitive error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_amount_display_carries_both_sides() {
        let err = MarketError::WrongAmount {
            expected: Amount::from_units(100),
            actual: Amount::from_units(90),
        };
        let text = err.to_string();
        assert!(text.contains("100"));
        assert!(text.contains("90"));
    }

    #[test]
    fn not_active_display_names_status() {
        let err = MarketError::NotActive {
            id: ListingId::new(3),
            status: ListingStatus::Cancelled,
        };
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn custody_error_converts() {
        let err: MarketError = CustodyError::UnknownAsset("x/1".to_string()).into();
        assert!(matches!(err, MarketError::Custody(_)));
    }
}
