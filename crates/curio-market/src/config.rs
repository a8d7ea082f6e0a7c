//! Marketplace configuration.
//!
//! The engine owns one [`MarketConfig`] value, validated at
//! construction and mutated only through the admin-gated setters on
//! the engine. The fee calculator and both settlement paths read it
//! as an explicit dependency rather than ambient state.

use curio_core::Address;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::fees::MAX_FEE_PERCENT;

/// Who may accept offers on a listing.
///
/// The permissive mode exists because some deployments let anyone
/// trigger acceptance (economically it only benefits the seller);
/// the default requires the seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferAcceptPolicy {
    /// Only the listing's seller may accept an offer.
    #[default]
    SellerOnly,
    /// Any caller may trigger acceptance.
    Anyone,
}

/// Marketplace configuration, owned by the administrator role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// The administrator identity.
    pub admin: Address,

    /// Receiver of the marketplace's cut of each sale.
    pub fee_recipient: Address,

    /// Fee percentage, capped at [`MAX_FEE_PERCENT`].
    pub fee_percent: u8,

    /// Offer-acceptance authorization policy.
    pub accept_policy: OfferAcceptPolicy,
}

impl MarketConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `FeeTooHigh` if `fee_percent` exceeds the cap.
    pub fn new(admin: Address, fee_recipient: Address, fee_percent: u8) -> Result<Self> {
        if fee_percent > MAX_FEE_PERCENT {
            return Err(MarketError::FeeTooHigh {
                percent: fee_percent,
                max: MAX_FEE_PERCENT,
            });
        }
        Ok(Self {
            admin,
            fee_recipient,
            fee_percent,
            accept_policy: OfferAcceptPolicy::default(),
        })
    }

    /// Overrides the offer-acceptance policy.
    #[must_use]
    pub const fn with_accept_policy(mut self, policy: OfferAcceptPolicy) -> Self {
        self.accept_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_core::Wallet;

    fn addr() -> Address {
        Wallet::generate().expect("wallet").address().clone()
    }

    #[test]
    fn config_accepts_fee_at_cap() {
        let config = MarketConfig::new(addr(), addr(), MAX_FEE_PERCENT).expect("config");
        assert_eq!(config.fee_percent, MAX_FEE_PERCENT);
        assert_eq!(config.accept_policy, OfferAcceptPolicy::SellerOnly);
    }

    #[test]
    fn config_rejects_fee_above_cap() {
        let result = MarketConfig::new(addr(), addr(), MAX_FEE_PERCENT + 1);
        assert!(matches!(result, Err(MarketError::FeeTooHigh { .. })));
    }

    #[test]
    fn accept_policy_override() {
        let config = MarketConfig::new(addr(), addr(), 2)
            .expect("config")
            .with_accept_policy(OfferAcceptPolicy::Anyone);
        assert_eq!(config.accept_policy, OfferAcceptPolicy::Anyone);
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = MarketConfig::new(addr(), addr(), 3).expect("config");
        let json = serde_json::to_string(&config).expect("serialize");
        let restored: MarketConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(config.fee_percent, restored.fee_percent);
        assert_eq!(config.admin, restored.admin);
    }
}
