//! Persistence error types.

use thiserror::Error;

/// Failures reading or writing a persisted collection.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode value for key {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode value for key {key}: {reason}")]
    Decode { key: &'static str, reason: String },
}

impl PersistenceError {
    pub fn decode(key: &'static str, reason: impl ToString) -> Self {
        PersistenceError::Decode {
            key,
            reason: reason.to_string(),
        }
    }
}
