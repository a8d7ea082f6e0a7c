//! Error types for curio-core.

use thiserror::Error;

/// Errors that can occur in core primitive operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid amount (overflow, negative, or unparseable).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid account address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
