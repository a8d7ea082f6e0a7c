//! Fixed-price listing and offer-matching engine with escrowed
//! settlement.
//!
//! The engine takes custody of a listed asset, holds it while the
//! listing is active, and releases it on purchase, accepted offer, or
//! cancellation. Offer funds are escrowed in an internal ledger at
//! submission and paid out or refunded exactly once. Fees are a
//! configured percentage of the settled amount, reducible per buyer
//! through a pluggable discount provider.
//!
//! [`Marketplace`] is the synchronous core; wrap it in a
//! [`MarketHandle`] for shared async access.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod custody;
pub mod discount;
pub mod error;
pub mod events;
pub mod fees;
pub mod guard;
pub mod handle;
pub mod listing;
pub mod market;
pub mod offer;

pub use config::{MarketConfig, OfferAcceptPolicy};
pub use custody::{AssetCustody, AssetId, CustodyError, InMemoryAssets};
pub use discount::{DiscountError, DiscountProvider, StaticDiscounts};
pub use error::{MarketError, Result};
pub use events::{
    EventSink, MarketEvent, MemoryEventSink, NoopEventSink, TracingEventSink,
};
pub use fees::MAX_FEE_PERCENT;
pub use guard::{ReentrancyGuard, ReentrancySpan};
pub use handle::MarketHandle;
pub use listing::{ListingId, ListingStatus, MarketItem};
pub use market::Marketplace;
pub use offer::{MarketOffer, OfferStatus};
