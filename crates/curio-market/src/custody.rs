//! Asset-custody interface.
//!
//! The engine never owns asset records itself; it holds transfer
//! rights through an [`AssetCustody`] implementation. Transfers use
//! safe-transfer semantics: a recipient that refuses to acknowledge
//! receipt fails the transfer, which aborts the enclosing engine
//! operation.

use std::collections::{HashMap, HashSet};
use std::fmt;

use curio_core::Address;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of a non-fungible asset: a collection plus a token id
/// within that collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId {
    /// The collection the asset belongs to.
    pub collection: Address,
    /// The asset's id within the collection.
    pub token_id: u64,
}

impl AssetId {
    /// Creates an asset identity.
    #[must_use]
    pub const fn new(collection: Address, token_id: u64) -> Self {
        Self {
            collection,
            token_id,
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.token_id)
    }
}

/// Errors raised by custody implementations.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// The asset does not exist in the registry.
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    /// The transfer source does not hold the asset.
    #[error("{holder} does not hold {asset}")]
    NotHolder {
        /// The claimed holder.
        holder: String,
        /// The asset in question.
        asset: String,
    },

    /// The recipient refused to acknowledge receipt.
    #[error("receiver {0} refused the transfer")]
    ReceiverRefused(String),
}

/// Custody operations over uniquely identified assets.
///
/// Implementations sit at the boundary to the actual asset registry
/// (a chain, a database, another service). All failures abort the
/// enclosing marketplace operation.
pub trait AssetCustody: Send + Sync {
    /// Returns the current holder of the asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset is unknown.
    fn owner_of(&self, asset: &AssetId) -> Result<Address, CustodyError>;

    /// Transfers the asset from `from` to `to`, requiring the
    /// recipient to acknowledge receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` does not hold the asset or the
    /// recipient refuses the transfer. Nothing moves on error.
    fn safe_transfer(&self, from: &Address, to: &Address, asset: &AssetId)
        -> Result<(), CustodyError>;
}

#[derive(Debug, Default)]
struct AssetRegistry {
    owners: HashMap<AssetId, Address>,
    refusing: HashSet<Address>,
}

/// In-memory asset registry.
///
/// Backs tests and simulated deployments. Receivers registered via
/// [`InMemoryAssets::refuse_receipts`] model programmable accounts
/// whose receipt acknowledgment fails.
#[derive(Debug, Default)]
pub struct InMemoryAssets {
    inner: Mutex<AssetRegistry>,
}

impl InMemoryAssets {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `owner` as the holder of a fresh asset.
    pub fn mint(&self, owner: &Address, asset: AssetId) {
        self.inner.lock().owners.insert(asset, owner.clone());
    }

    /// Marks an address as refusing receipt acknowledgment; any safe
    /// transfer towards it will fail.
    pub fn refuse_receipts(&self, receiver: &Address) {
        self.inner.lock().refusing.insert(receiver.clone());
    }

    /// Clears a previous [`refuse_receipts`](Self::refuse_receipts) mark.
    pub fn allow_receipts(&self, receiver: &Address) {
        self.inner.lock().refusing.remove(receiver);
    }
}

impl AssetCustody for InMemoryAssets {
    fn owner_of(&self, asset: &AssetId) -> Result<Address, CustodyError> {
        self.inner
            .lock()
            .owners
            .get(asset)
            .cloned()
            .ok_or_else(|| CustodyError::UnknownAsset(asset.to_string()))
    }

    fn safe_transfer(
        &self,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), CustodyError> {
        let mut registry = self.inner.lock();
        let holder = registry
            .owners
            .get(asset)
            .ok_or_else(|| CustodyError::UnknownAsset(asset.to_string()))?;
        if holder != from {
            return Err(CustodyError::NotHolder {
                holder: from.to_string(),
                asset: asset.to_string(),
            });
        }
        if registry.refusing.contains(to) {
            return Err(CustodyError::ReceiverRefused(to.to_string()));
        }
        registry.owners.insert(asset.clone(), to.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_core::Wallet;

    fn addr() -> Address {
        Wallet::generate().expect("wallet").address().clone()
    }

    fn sample_asset() -> AssetId {
        AssetId::new(addr(), 1)
    }

    #[test]
    fn mint_records_owner() {
        let assets = InMemoryAssets::new();
        let owner = addr();
        let asset = sample_asset();
        assets.mint(&owner, asset.clone());
        assert_eq!(assets.owner_of(&asset).expect("owner"), owner);
    }

    #[test]
    fn owner_of_unknown_asset_fails() {
        let assets = InMemoryAssets::new();
        let result = assets.owner_of(&sample_asset());
        assert!(matches!(result, Err(CustodyError::UnknownAsset(_))));
    }

    #[test]
    fn safe_transfer_moves_custody() {
        let assets = InMemoryAssets::new();
        let (from, to) = (addr(), addr());
        let asset = sample_asset();
        assets.mint(&from, asset.clone());

        assets.safe_transfer(&from, &to, &asset).expect("transfer");
        assert_eq!(assets.owner_of(&asset).expect("owner"), to);
    }

    #[test]
    fn safe_transfer_rejects_non_holder() {
        let assets = InMemoryAssets::new();
        let (owner, thief, to) = (addr(), addr(), addr());
        let asset = sample_asset();
        assets.mint(&owner, asset.clone());

        let result = assets.safe_transfer(&thief, &to, &asset);
        assert!(matches!(result, Err(CustodyError::NotHolder { .. })));
        assert_eq!(assets.owner_of(&asset).expect("owner"), owner);
    }

    #[test]
    fn refusing_receiver_fails_transfer_without_moving() {
        let assets = InMemoryAssets::new();
        let (from, to) = (addr(), addr());
        let asset = sample_asset();
        assets.mint(&from, asset.clone());
        assets.refuse_receipts(&to);

        let result = assets.safe_transfer(&from, &to, &asset);
        assert!(matches!(result, Err(CustodyError::ReceiverRefused(_))));
        assert_eq!(assets.owner_of(&asset).expect("owner"), from);

        assets.allow_receipts(&to);
        assets.safe_transfer(&from, &to, &asset).expect("transfer");
        assert_eq!(assets.owner_of(&asset).expect("owner"), to);
    }

    #[test]
    fn asset_id_display_joins_collection_and_token() {
        let asset = sample_asset();
        let text = asset.to_string();
        assert!(text.ends_with("/1"));
        assert!(text.contains(asset.collection.as_str()));
    }
}
