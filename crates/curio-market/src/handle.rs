//! Shared async handle over the marketplace engine.
//!
//! The engine itself is synchronous; concurrent callers go through
//! [`MarketHandle`], which serializes access behind a tokio mutex.
//! Query methods return owned clones so no lock is held across await
//! points in caller code.

use std::sync::Arc;

use curio_core::{Address, Amount};
use tokio::sync::Mutex;

use crate::custody::AssetId;
use crate::error::Result;
use crate::listing::{ListingId, MarketItem};
use crate::market::Marketplace;
use crate::offer::MarketOffer;

/// Cloneable async facade over a [`Marketplace`].
#[derive(Clone)]
pub struct MarketHandle {
    inner: Arc<Mutex<Marketplace>>,
}

impl MarketHandle {
    /// Wraps an engine for shared async use.
    #[must_use]
    pub fn new(market: Marketplace) -> Self {
        Self {
            inner: Arc::new(Mutex::new(market)),
        }
    }

    /// Credits an account with deposited funds.
    ///
    /// # Errors
    ///
    /// See [`Marketplace::deposit`].
    pub async fn deposit(&self, account: &Address, amount: Amount) -> Result<()> {
        self.inner.lock().await.deposit(account, amount)
    }

    /// Returns an account's available balance.
    pub async fn balance_of(&self, account: &Address) -> Amount {
        self.inner.lock().await.balance_of(account)
    }

    /// Lists an asset at a fixed price.
    ///
    /// # Errors
    ///
    /// See [`Marketplace::create_listing`].
    pub async fn create_listing(
        &self,
        caller: &Address,
        asset: AssetId,
        category: impl Into<String> + Send,
        price: Amount,
    ) -> Result<ListingId> {
        self.inner
            .lock()
            .await
            .create_listing(caller, asset, category, price)
    }

    /// Buys a listing at its asking price.
    ///
    /// # Errors
    ///
    /// See [`Marketplace::buy`].
    pub async fn buy(&self, caller: &Address, id: ListingId, payment: Amount) -> Result<()> {
        self.inner.lock().await.buy(caller, id, payment)
    }

    /// Cancels an active listing.
    ///
    /// # Errors
    ///
    /// See [`Marketplace::cancel_listing`].
    pub async fn cancel_listing(&self, caller: &Address, id: ListingId) -> Result<()> {
        self.inner.lock().await.cancel_listing(caller, id)
    }

    /// Submits an offer against an active listing.
    ///
    /// # Errors
    ///
    /// See [`Marketplace::submit_offer`].
    pub async fn submit_offer(
        &self,
        caller: &Address,
        id: ListingId,
        amount: Amount,
    ) -> Result<u32> {
        self.inner.lock().await.submit_offer(caller, id, amount)
    }

    /// Accepts an open offer.
    ///
    /// # Errors
    ///
    /// See [`Marketplace::accept_offer`].
    pub async fn accept_offer(&self, caller: &Address, id: ListingId, index: u32) -> Result<()> {
        self.inner.lock().await.accept_offer(caller, id, index)
    }

    /// Cancels an open offer and refunds the bidder.
    ///
    /// # Errors
    ///
    /// See [`Marketplace::cancel_offer`].
    pub async fn cancel_offer(&self, caller: &Address, id: ListingId, index: u32) -> Result<()> {
        self.inner.lock().await.cancel_offer(caller, id, index)
    }

    /// Returns a snapshot of the listing with this id.
    pub async fn listing(&self, id: ListingId) -> Option<MarketItem> {
        self.inner.lock().await.listing(id).cloned()
    }

    /// Returns snapshots of all active listings, in ascending id order.
    pub async fn active_listings(&self) -> Vec<MarketItem> {
        self.inner
            .lock()
            .await
            .active_listings()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns snapshots of a seller's listings, in ascending id order.
    pub async fn listings_by_seller(&self, seller: &Address) -> Vec<MarketItem> {
        self.inner
            .lock()
            .await
            .listings_by_seller(seller)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns snapshots of a buyer's settled purchases.
    pub async fn purchases_of(&self, buyer: &Address) -> Vec<MarketItem> {
        self.inner
            .lock()
            .await
            .purchases_of(buyer)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns snapshots of active listings in a category.
    pub async fn active_in_category(&self, category: &str) -> Vec<MarketItem> {
        self.inner
            .lock()
            .await
            .active_in_category(category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns snapshots of every offer made against a listing.
    pub async fn offers_for(&self, id: ListingId) -> Vec<MarketOffer> {
        self.inner.lock().await.offers_for(id).to_vec()
    }

    /// Returns snapshots of a listing's open offers.
    pub async fn open_offers(&self, id: ListingId) -> Vec<MarketOffer> {
        self.inner
            .lock()
            .await
            .open_offers(id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Total listings ever created.
    pub async fn total_listed(&self) -> u64 {
        self.inner.lock().await.total_listed()
    }

    /// Total listings settled.
    pub async fn total_sold(&self) -> u64 {
        self.inner.lock().await.total_sold()
    }

    /// Listings currently active.
    pub async fn active_count(&self) -> u64 {
        self.inner.lock().await.active_count()
    }

    /// The engine's escrow custody address.
    pub async fn escrow_address(&self) -> Address {
        self.inner.lock().await.escrow_address().clone()
    }
}

impl std::fmt::Debug for MarketHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketHandle").finish_non_exhaustive()
    }
}
