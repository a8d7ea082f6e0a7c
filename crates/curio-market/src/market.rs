//! The marketplace engine.
//!
//! [`Marketplace`] owns the listing and offer tables, the
//! active-asset index, the monotonic counters and the internal funds
//! ledger. Every mutating operation acquires the reentrancy gate,
//! performs all validation and external custody/discount calls before
//! the first local mutation, and therefore either completes fully or
//! leaves no persisted effect.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use curio_core::{Address, Amount, Counter, Wallet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{MarketConfig, OfferAcceptPolicy};
use crate::custody::{AssetCustody, AssetId};
use crate::discount::DiscountProvider;
use crate::error::{MarketError, Result};
use crate::events::{EventSink, MarketEvent, TracingEventSink};
use crate::fees::{self, MAX_FEE_PERCENT};
use crate::guard::ReentrancyGuard;
use crate::listing::{ListingId, MarketItem};
use crate::offer::MarketOffer;

/// The escrow and offer-matching engine.
///
/// State-mutating methods take `&mut self`: callers are serialized by
/// construction, and the engine additionally rejects reentrant entry
/// through external callbacks via its [`ReentrancyGuard`].
pub struct Marketplace {
    config: MarketConfig,
    assets: Arc<dyn AssetCustody>,
    discounts: Option<Arc<dyn DiscountProvider>>,
    events: Arc<dyn EventSink>,
    guard: ReentrancyGuard,
    /// The engine's own custody address; listed assets are escrowed here.
    escrow_account: Address,
    listings: BTreeMap<ListingId, MarketItem>,
    offers: HashMap<ListingId, Vec<MarketOffer>>,
    /// (collection, token) -> listing id, present exactly while active.
    active_assets: HashMap<AssetId, ListingId>,
    accounts: HashMap<Address, Amount>,
    listed: Counter,
    sold: Counter,
    cancelled: Counter,
}

impl Marketplace {
    /// Creates an engine with the given configuration and custody
    /// backend. Events go to the `tracing` sink unless overridden.
    ///
    /// # Errors
    ///
    /// Returns an error if the escrow identity cannot be generated.
    pub fn new(config: MarketConfig, assets: Arc<dyn AssetCustody>) -> Result<Self> {
        let escrow_account = Wallet::generate()?.address().clone();
        Ok(Self {
            config,
            assets,
            discounts: None,
            events: Arc::new(TracingEventSink::new()),
            guard: ReentrancyGuard::new(),
            escrow_account,
            listings: BTreeMap::new(),
            offers: HashMap::new(),
            active_assets: HashMap::new(),
            accounts: HashMap::new(),
            listed: Counter::new(),
            sold: Counter::new(),
            cancelled: Counter::new(),
        })
    }

    /// Sets the discount provider.
    #[must_use]
    pub fn with_discount_provider(mut self, provider: Arc<dyn DiscountProvider>) -> Self {
        self.discounts = Some(provider);
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    // ------------------------------------------------------------------
    // Funds ledger
    // ------------------------------------------------------------------

    /// Credits an account with freshly deposited funds.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the balance cannot hold the deposit; the
    /// balance is unchanged in that case.
    pub fn deposit(&mut self, account: &Address, amount: Amount) -> Result<()> {
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(MarketError::Overflow)?;
        self.accounts.insert(account.clone(), balance);
        debug!(account = %account, amount = %amount, "deposit");
        Ok(())
    }

    /// Returns an account's available balance.
    #[must_use]
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.accounts.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Validates a debit and returns the balance that remains after
    /// it. The caller commits the returned value in its mutation
    /// tail, so the debit itself cannot fail.
    fn prepare_debit(&self, account: &Address, amount: Amount) -> Result<Amount> {
        let available = self.balance_of(account);
        available
            .checked_sub(amount)
            .ok_or(MarketError::InsufficientFunds {
                required: amount,
                available,
            })
    }

    /// Verifies the account can absorb `amount` without overflowing.
    /// Called during validation so later [`Self::credit`] calls never
    /// saturate.
    fn ensure_credit_headroom(&self, account: &Address, amount: Amount) -> Result<()> {
        self.balance_of(account)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(MarketError::Overflow)
    }

    // Never saturates in practice: every settlement path checks
    // headroom before its first mutation.
    fn credit(&mut self, account: &Address, amount: Amount) {
        let balance = self
            .accounts
            .entry(account.clone())
            .or_insert(Amount::ZERO);
        *balance = balance.saturating_add(amount);
    }

    fn buyer_discount(&self, buyer: &Address) -> Result<Option<u8>> {
        match &self.discounts {
            Some(provider) => Ok(Some(provider.discount_for(buyer)?)),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Listing state machine
    // ------------------------------------------------------------------

    /// Lists an asset at a fixed price, pulling custody into the
    /// engine's escrow.
    ///
    /// # Errors
    ///
    /// `InvalidPrice` on a non-positive price; `Custody` if the pull
    /// fails (nothing is persisted in that case).
    pub fn create_listing(
        &mut self,
        caller: &Address,
        asset: AssetId,
        category: impl Into<String>,
        price: Amount,
    ) -> Result<ListingId> {
        let _span = self.guard.enter()?;
        if price.is_zero() {
            return Err(MarketError::InvalidPrice);
        }

        // Custody pull precedes any local mutation; a failed pull
        // leaves no trace of the listing.
        self.assets
            .safe_transfer(caller, &self.escrow_account, &asset)?;

        let category = category.into();
        let id = ListingId::new(self.listed.increment());
        let item = MarketItem::new(id, asset.clone(), caller.clone(), category.clone(), price);
        self.active_assets.insert(asset.clone(), id);
        self.listings.insert(id, item);

        self.events.emit(&MarketEvent::ListingCreated {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            listing: id,
            asset: asset.clone(),
            seller: caller.clone(),
            category,
            price,
        });
        info!(
            listing = %id,
            seller = %caller,
            asset = %asset,
            price = %price,
            "listing created"
        );
        Ok(id)
    }

    /// Buys a listing at exactly its asking price.
    ///
    /// Pays `price - fee` to the seller and `fee` to the fee
    /// recipient, releases the asset to the caller, and marks the
    /// listing sold.
    ///
    /// # Errors
    ///
    /// `InvalidListing`, `NotActive`, `SelfPurchase`, `WrongAmount`,
    /// `InsufficientFunds`, fee or ledger `Overflow` errors, or
    /// `Custody` if the asset release fails. In every failure case no
    /// state has changed.
    pub fn buy(&mut self, caller: &Address, id: ListingId, payment: Amount) -> Result<()> {
        let _span = self.guard.enter()?;
        let (seller, asset, category, price) = {
            let item = self
                .listings
                .get(&id)
                .ok_or(MarketError::InvalidListing(id))?;
            if !item.is_active() {
                return Err(MarketError::NotActive {
                    id,
                    status: item.status,
                });
            }
            if &item.seller == caller {
                return Err(MarketError::SelfPurchase);
            }
            if payment != item.price {
                return Err(MarketError::WrongAmount {
                    expected: item.price,
                    actual: payment,
                });
            }
            (
                item.seller.clone(),
                item.asset.clone(),
                item.category.clone(),
                item.price,
            )
        };

        let buyer_remaining = self.prepare_debit(caller, price)?;

        let discount = self.buyer_discount(caller)?;
        let fee = fees::quote_fee(price, self.config.fee_percent, discount)?;
        let (seller_proceeds, fee) = fees::split_payment(price, fee)?;

        // Credited totals never exceed the price, even when seller
        // and fee recipient coincide, so price headroom suffices.
        let fee_recipient = self.config.fee_recipient.clone();
        self.ensure_credit_headroom(&seller, price)?;
        self.ensure_credit_headroom(&fee_recipient, price)?;

        // Last fallible step: release the asset to the buyer.
        self.assets
            .safe_transfer(&self.escrow_account, caller, &asset)?;

        self.accounts.insert(caller.clone(), buyer_remaining);
        self.credit(&seller, seller_proceeds);
        self.credit(&fee_recipient, fee);

        if let Some(item) = self.listings.get_mut(&id) {
            item.mark_sold(caller.clone())?;
        }
        self.sold.increment();
        self.active_assets.remove(&asset);

        self.events.emit(&MarketEvent::SaleCompleted {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            listing: id,
            asset,
            seller,
            buyer: caller.clone(),
            category,
            price,
        });
        info!(
            listing = %id,
            buyer = %caller,
            price = %price,
            fee = %fee,
            "sale completed"
        );
        Ok(())
    }

    /// Cancels an active listing, returning custody to the seller.
    ///
    /// # Errors
    ///
    /// `NotSeller`, `NotActive`, `CustodyInvariantViolated` if the
    /// escrow no longer holds the asset (fatal, never repaired), or
    /// `Custody` if the return transfer fails.
    pub fn cancel_listing(&mut self, caller: &Address, id: ListingId) -> Result<()> {
        let _span = self.guard.enter()?;
        let (seller, asset) = {
            let item = self
                .listings
                .get(&id)
                .ok_or(MarketError::InvalidListing(id))?;
            if &item.seller != caller {
                return Err(MarketError::NotSeller { listing: id });
            }
            if !item.is_active() {
                return Err(MarketError::NotActive {
                    id,
                    status: item.status,
                });
            }
            (item.seller.clone(), item.asset.clone())
        };

        // The escrow must still hold the asset it thinks it escrowed.
        let holder = self.assets.owner_of(&asset)?;
        if holder != self.escrow_account {
            warn!(
                listing = %id,
                asset = %asset,
                holder = %holder,
                "escrowed asset is held elsewhere"
            );
            return Err(MarketError::CustodyInvariantViolated { listing: id });
        }

        self.assets
            .safe_transfer(&self.escrow_account, &seller, &asset)?;

        if let Some(item) = self.listings.get_mut(&id) {
            item.mark_cancelled()?;
        }
        self.cancelled.increment();
        self.active_assets.remove(&asset);

        info!(listing = %id, seller = %seller, asset = %asset, "listing cancelled");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Offer state machine
    // ------------------------------------------------------------------

    /// Submits an offer against an active listing, escrowing the
    /// amount atomically with submission.
    ///
    /// Returns the offer's index within the listing's sequence.
    ///
    /// # Errors
    ///
    /// `InvalidListing`, `NotActive`, `SelfOffer`, `ZeroAmount`, or
    /// `InsufficientFunds`.
    pub fn submit_offer(
        &mut self,
        caller: &Address,
        id: ListingId,
        amount: Amount,
    ) -> Result<u32> {
        let _span = self.guard.enter()?;
        let (seller, asset) = {
            let item = self
                .listings
                .get(&id)
                .ok_or(MarketError::InvalidListing(id))?;
            if !item.is_active() {
                return Err(MarketError::NotActive {
                    id,
                    status: item.status,
                });
            }
            if &item.seller == caller {
                return Err(MarketError::SelfOffer);
            }
            (item.seller.clone(), item.asset.clone())
        };
        if amount.is_zero() {
            return Err(MarketError::ZeroAmount);
        }

        let remaining = self.prepare_debit(caller, amount)?;
        self.accounts.insert(caller.clone(), remaining);

        let book = self.offers.entry(id).or_default();
        let index = book.len() as u32;
        book.push(MarketOffer::new(id, index, caller.clone(), amount));

        self.events.emit(&MarketEvent::OfferSubmitted {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            listing: id,
            asset,
            seller,
            bidder: caller.clone(),
            index,
            amount,
        });
        info!(
            listing = %id,
            index,
            bidder = %caller,
            amount = %amount,
            "offer submitted"
        );
        Ok(index)
    }

    /// Accepts an open offer, settling the sale at the offer amount.
    ///
    /// Pays the seller `amount - fee` and the fee recipient `fee`,
    /// releases the asset to the bidder, marks the offer accepted and
    /// the listing sold. Sibling offers are left untouched.
    ///
    /// # Errors
    ///
    /// `InvalidListing`, `NotActive`, `NotSeller` under the
    /// seller-only policy, `InvalidOfferIndex`, `AlreadyFinalized`,
    /// fee or ledger `Overflow` errors, or `Custody` if the asset
    /// release fails.
    pub fn accept_offer(&mut self, caller: &Address, id: ListingId, index: u32) -> Result<()> {
        let _span = self.guard.enter()?;
        let (seller, asset, category) = {
            let item = self
                .listings
                .get(&id)
                .ok_or(MarketError::InvalidListing(id))?;
            if !item.is_active() {
                return Err(MarketError::NotActive {
                    id,
                    status: item.status,
                });
            }
            (item.seller.clone(), item.asset.clone(), item.category.clone())
        };
        if self.config.accept_policy == OfferAcceptPolicy::SellerOnly && caller != &seller {
            return Err(MarketError::NotSeller { listing: id });
        }

        let (bidder, amount) = {
            let offer = self
                .offers
                .get(&id)
                .and_then(|book| book.get(index as usize))
                .ok_or(MarketError::InvalidOfferIndex { listing: id, index })?;
            if !offer.is_open() {
                return Err(MarketError::AlreadyFinalized {
                    listing: id,
                    index,
                    status: offer.status,
                });
            }
            (offer.bidder.clone(), offer.amount)
        };

        let discount = self.buyer_discount(&bidder)?;
        let fee = fees::quote_fee(amount, self.config.fee_percent, discount)?;
        let (seller_proceeds, fee) = fees::split_payment(amount, fee)?;

        let fee_recipient = self.config.fee_recipient.clone();
        self.ensure_credit_headroom(&seller, amount)?;
        self.ensure_credit_headroom(&fee_recipient, amount)?;

        // Last fallible step: release the asset to the bidder.
        self.assets
            .safe_transfer(&self.escrow_account, &bidder, &asset)?;

        if let Some(offer) = self
            .offers
            .get_mut(&id)
            .and_then(|book| book.get_mut(index as usize))
        {
            offer.accept()?;
        }
        self.credit(&seller, seller_proceeds);
        self.credit(&fee_recipient, fee);

        if let Some(item) = self.listings.get_mut(&id) {
            item.mark_sold(bidder.clone())?;
        }
        self.sold.increment();
        self.active_assets.remove(&asset);

        self.events.emit(&MarketEvent::SaleCompleted {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            listing: id,
            asset,
            seller,
            buyer: bidder.clone(),
            category,
            price: amount,
        });
        info!(
            listing = %id,
            index,
            bidder = %bidder,
            amount = %amount,
            fee = %fee,
            "offer accepted"
        );
        Ok(())
    }

    /// Cancels an open offer, refunding the escrowed amount in full.
    ///
    /// Works even after the listing has settled, so orphaned offers
    /// stay refundable. A second cancel fails without refunding again.
    ///
    /// # Errors
    ///
    /// `InvalidListing`, `InvalidOfferIndex`, `NotBidder`,
    /// `AlreadyFinalized`, or `Overflow` if the refund cannot fit the
    /// bidder's balance.
    pub fn cancel_offer(&mut self, caller: &Address, id: ListingId, index: u32) -> Result<()> {
        let _span = self.guard.enter()?;
        if !self.listings.contains_key(&id) {
            return Err(MarketError::InvalidListing(id));
        }
        let (bidder, amount) = {
            let offer = self
                .offers
                .get(&id)
                .and_then(|book| book.get(index as usize))
                .ok_or(MarketError::InvalidOfferIndex { listing: id, index })?;
            if &offer.bidder != caller {
                return Err(MarketError::NotBidder { listing: id, index });
            }
            if !offer.is_open() {
                return Err(MarketError::AlreadyFinalized {
                    listing: id,
                    index,
                    status: offer.status,
                });
            }
            (offer.bidder.clone(), offer.amount)
        };

        self.ensure_credit_headroom(&bidder, amount)?;

        if let Some(offer) = self
            .offers
            .get_mut(&id)
            .and_then(|book| book.get_mut(index as usize))
        {
            offer.cancel()?;
        }
        self.credit(&bidder, amount);

        self.events.emit(&MarketEvent::OfferCancelled {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            listing: id,
            index,
            bidder: bidder.clone(),
            amount,
        });
        info!(
            listing = %id,
            index,
            bidder = %bidder,
            amount = %amount,
            "offer cancelled"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    fn require_admin(&self, caller: &Address) -> Result<()> {
        if caller != &self.config.admin {
            return Err(MarketError::NotAdmin);
        }
        Ok(())
    }

    /// Sets the fee percentage. Admin only; capped at
    /// [`MAX_FEE_PERCENT`].
    ///
    /// # Errors
    ///
    /// `NotAdmin` or `FeeTooHigh`.
    pub fn set_fee_percent(&mut self, caller: &Address, percent: u8) -> Result<()> {
        self.require_admin(caller)?;
        if percent > MAX_FEE_PERCENT {
            return Err(MarketError::FeeTooHigh {
                percent,
                max: MAX_FEE_PERCENT,
            });
        }
        self.config.fee_percent = percent;
        info!(percent, "fee percent updated");
        Ok(())
    }

    /// Transfers the administrator role. Admin only.
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn set_admin(&mut self, caller: &Address, new_admin: Address) -> Result<()> {
        self.require_admin(caller)?;
        info!(old = %self.config.admin, new = %new_admin, "administrator transferred");
        self.config.admin = new_admin;
        Ok(())
    }

    /// Sets the fee recipient. Admin only.
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn set_fee_recipient(&mut self, caller: &Address, recipient: Address) -> Result<()> {
        self.require_admin(caller)?;
        info!(recipient = %recipient, "fee recipient updated");
        self.config.fee_recipient = recipient;
        Ok(())
    }

    /// Installs or replaces the discount provider. Admin only.
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn set_discount_provider(
        &mut self,
        caller: &Address,
        provider: Arc<dyn DiscountProvider>,
    ) -> Result<()> {
        self.require_admin(caller)?;
        self.discounts = Some(provider);
        info!("discount provider installed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query layer
    // ------------------------------------------------------------------

    /// Returns the listing with this id, if it ever existed.
    #[must_use]
    pub fn listing(&self, id: ListingId) -> Option<&MarketItem> {
        self.listings.get(&id)
    }

    /// All active listings, in ascending id order.
    #[must_use]
    pub fn active_listings(&self) -> Vec<&MarketItem> {
        self.listings.values().filter(|l| l.is_active()).collect()
    }

    /// All listings ever created by a seller, in ascending id order.
    #[must_use]
    pub fn listings_by_seller(&self, seller: &Address) -> Vec<&MarketItem> {
        self.listings
            .values()
            .filter(|l| &l.seller == seller)
            .collect()
    }

    /// Settled listings purchased by a buyer, in ascending id order.
    #[must_use]
    pub fn purchases_of(&self, buyer: &Address) -> Vec<&MarketItem> {
        self.listings
            .values()
            .filter(|l| l.is_sold() && l.buyer.as_ref() == Some(buyer))
            .collect()
    }

    /// Active listings in a category, in ascending id order.
    #[must_use]
    pub fn active_in_category(&self, category: &str) -> Vec<&MarketItem> {
        self.listings
            .values()
            .filter(|l| l.is_active() && l.category == category)
            .collect()
    }

    /// Every offer ever made against a listing, in submission order.
    #[must_use]
    pub fn offers_for(&self, id: ListingId) -> &[MarketOffer] {
        self.offers.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Returns one offer by listing and index.
    #[must_use]
    pub fn offer(&self, id: ListingId, index: u32) -> Option<&MarketOffer> {
        self.offers_for(id).get(index as usize)
    }

    /// Open (non-terminal) offers for a listing, in submission order.
    #[must_use]
    pub fn open_offers(&self, id: ListingId) -> Vec<&MarketOffer> {
        self.offers_for(id).iter().filter(|o| o.is_open()).collect()
    }

    /// The active listing currently escrowing this asset, if any.
    #[must_use]
    pub fn active_listing_for(&self, asset: &AssetId) -> Option<ListingId> {
        self.active_assets.get(asset).copied()
    }

    /// Total listings ever created.
    #[must_use]
    pub fn total_listed(&self) -> u64 {
        self.listed.value()
    }

    /// Total listings settled.
    #[must_use]
    pub fn total_sold(&self) -> u64 {
        self.sold.value()
    }

    /// Total listings cancelled.
    #[must_use]
    pub fn total_cancelled(&self) -> u64 {
        self.cancelled.value()
    }

    /// Listings currently active: created - sold - cancelled.
    #[must_use]
    pub fn active_count(&self) -> u64 {
        self.listed.value() - self.sold.value() - self.cancelled.value()
    }

    /// The current configuration.
    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// The engine's own custody address.
    #[must_use]
    pub fn escrow_address(&self) -> &Address {
        &self.escrow_account
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marketplace")
            .field("config", &self.config)
            .field("listings", &self.listings.len())
            .field("active", &self.active_count())
            .finish_non_exhaustive()
    }
}
