//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for parsing and validating shared ballot types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BallotError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid workflow status: {0}")]
    InvalidStatus(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}
