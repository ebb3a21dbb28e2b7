//! Key-value entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the kv_store table.
#[derive(Debug, Clone, FromRow)]
pub struct KeyValueEntity {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
