//! Error types for Dayscore
//!
//! The scoring engine itself is total; these errors only arise at the store
//! boundary, before a well-typed snapshot reaches the engine.

use thiserror::Error;

/// Errors that can occur while loading or decoding a store snapshot
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Store root must be a JSON object, got {0}")]
    InvalidRoot(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("No habit with id {0:?}")]
    UnknownHabit(String),

    #[error("Weight for {0} must be a finite number >= 0")]
    InvalidWeight(String),

    #[error("Unknown day kind: {0}")]
    UnknownDayKind(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
