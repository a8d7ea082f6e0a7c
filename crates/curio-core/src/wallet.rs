//! Account identity for marketplace participants.
//!
//! Sellers, buyers, bidders, the administrator and the fee recipient
//! are all identified by an [`Address`]: the base58 text form of a
//! 32-byte Ed25519 public key. [`Wallet`] generates fresh identities.

use std::fmt;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// An account address (base58-encoded 32-byte public key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Creates an address from a base58-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid base58 or does not
    /// decode to 32 bytes.
    pub fn from_base58(s: &str) -> Result<Self, CoreError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(format!("invalid base58: {e}")))?;
        if bytes.len() != 32 {
            return Err(CoreError::InvalidAddress(format!(
                "address must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Creates an address from raw public-key bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() != 32 {
            return Err(CoreError::InvalidAddress(format!(
                "address must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bs58::encode(bytes).into_string()))
    }

    /// Returns the base58-encoded address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An Ed25519 keypair with its derived [`Address`].
///
/// Key material comes straight from the operating system CSPRNG
/// rather than a userspace PRNG seeded from system entropy.
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Generates a new random wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if address derivation fails.
    pub fn generate() -> Result<Self, CoreError> {
        let mut secret_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut secret_bytes);
        Self::from_secret_bytes(&secret_bytes)
    }

    /// Creates a wallet from 32 secret-key bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if address derivation fails.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Result<Self, CoreError> {
        let signing_key = SigningKey::from_bytes(secret);
        let address = Address::from_bytes(signing_key.verifying_key().as_bytes())?;
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Returns this wallet's address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the raw bytes of the signing key.
    ///
    /// # Security
    ///
    /// This exposes the private key material. Handle with care.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
