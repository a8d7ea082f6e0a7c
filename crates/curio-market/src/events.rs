//! Market events for off-engine observers.
//!
//! Every mutating path emits one event through a pluggable
//! [`EventSink`]. The default sink forwards to the `tracing`
//! infrastructure; [`MemoryEventSink`] records events for tests and
//! in-process observers.

use chrono::{DateTime, Utc};
use curio_core::{Address, Amount};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::custody::AssetId;
use crate::listing::ListingId;

/// An observable marketplace event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A seller listed an asset.
    ListingCreated {
        /// Unique event identifier.
        event_id: Uuid,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
        /// The new listing.
        listing: ListingId,
        /// The escrowed asset.
        asset: AssetId,
        /// The seller.
        seller: Address,
        /// The listing category.
        category: String,
        /// The asking price.
        price: Amount,
    },

    /// A listing settled, by fixed-price purchase or accepted offer.
    SaleCompleted {
        /// Unique event identifier.
        event_id: Uuid,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
        /// The settled listing.
        listing: ListingId,
        /// The released asset.
        asset: AssetId,
        /// The seller.
        seller: Address,
        /// The buyer the asset was released to.
        buyer: Address,
        /// The listing category.
        category: String,
        /// The settled amount (listed price or accepted offer amount).
        price: Amount,
    },

    /// A bidder escrowed an offer against a listing.
    OfferSubmitted {
        /// Unique event identifier.
        event_id: Uuid,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
        /// The target listing.
        listing: ListingId,
        /// The listed asset.
        asset: AssetId,
        /// The seller of the listing.
        seller: Address,
        /// The bidder.
        bidder: Address,
        /// Offer index within the listing.
        index: u32,
        /// The escrowed amount.
        amount: Amount,
    },

    /// A bidder withdrew an offer and was refunded.
    OfferCancelled {
        /// Unique event identifier.
        event_id: Uuid,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
        /// The target listing.
        listing: ListingId,
        /// Offer index within the listing.
        index: u32,
        /// The refunded bidder.
        bidder: Address,
        /// The refunded amount.
        amount: Amount,
    },
}

impl MarketEvent {
    /// Returns the event's unique identifier.
    #[must_use]
    pub const fn event_id(&self) -> Uuid {
        match self {
            Self::ListingCreated { event_id, .. }
            | Self::SaleCompleted { event_id, .. }
            | Self::OfferSubmitted { event_id, .. }
            | Self::OfferCancelled { event_id, .. } => *event_id,
        }
    }

    /// Returns the listing the event concerns.
    #[must_use]
    pub const fn listing(&self) -> ListingId {
        match self {
            Self::ListingCreated { listing, .. }
            | Self::SaleCompleted { listing, .. }
            | Self::OfferSubmitted { listing, .. }
            | Self::OfferCancelled { listing, .. } => *listing,
        }
    }

    /// Returns a short name for the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ListingCreated { .. } => "listing_created",
            Self::SaleCompleted { .. } => "sale_completed",
            Self::OfferSubmitted { .. } => "offer_submitted",
            Self::OfferCancelled { .. } => "offer_cancelled",
        }
    }

    /// Serializes the event to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Destination for marketplace events.
///
/// Implement this trait to forward events to a custom backend
/// (message bus, database, test recorder).
pub trait EventSink: Send + Sync {
    /// Delivers one event.
    fn emit(&self, event: &MarketEvent);
}

/// Event sink forwarding to the `tracing` infrastructure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    /// Creates a tracing-based event sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventSink for TracingEventSink {
    fn emit(&self, event: &MarketEvent) {
        let json = event.to_json().unwrap_or_else(|_| "{}".to_string());
        tracing::info!(
            target: "curio_market",
            event_id = %event.event_id(),
            listing = %event.listing(),
            event_json = %json,
            "{}",
            event.kind()
        );
    }
}

/// A no-op event sink for disabled scenarios.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl NoopEventSink {
    /// Creates a no-op event sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &MarketEvent) {
        // Intentionally does nothing
    }
}

/// Event sink recording every event in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<MarketEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<MarketEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &MarketEvent) {
        self.events.lock().push(event.clone());
    }
}
