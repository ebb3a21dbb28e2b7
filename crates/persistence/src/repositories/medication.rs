//! Medication entry repository.

use domain::models::MedicationEntry;
use sqlx::SqlitePool;
use tracing::warn;

use super::key_value::KeyValueRepository;
use crate::entities::MedicationRecord;
use crate::error::PersistenceError;

/// Storage key of the medication entry collection.
pub const MEDICATIONS_KEY: &str = "MedicationMappingsKey";

#[derive(Clone)]
pub struct MedicationRepository {
    kv: KeyValueRepository,
}

impl MedicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            kv: KeyValueRepository::new(pool),
        }
    }

    /// Load all entries in stored order. A missing key is an empty schedule.
    pub async fn load(&self) -> Result<Vec<MedicationEntry>, PersistenceError> {
        let Some(row) = self.kv.get(MEDICATIONS_KEY).await? else {
            return Ok(Vec::new());
        };
        let records: Vec<MedicationRecord> = serde_json::from_str(&row.value)
            .map_err(|e| PersistenceError::decode(MEDICATIONS_KEY, e))?;
        records
            .into_iter()
            .map(|record| {
                MedicationEntry::try_from(record)
                    .map_err(|e| PersistenceError::decode(MEDICATIONS_KEY, e))
            })
            .collect()
    }

    /// Load all entries, falling back to an empty schedule on failure.
    pub async fn load_or_default(&self) -> Vec<MedicationEntry> {
        match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to load medication schedule, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the stored collection.
    pub async fn save_all(&self, entries: &[MedicationEntry]) -> Result<(), PersistenceError> {
        let records: Vec<MedicationRecord> = entries.iter().map(Into::into).collect();
        let value = serde_json::to_string(&records).map_err(|source| PersistenceError::Encode {
            key: MEDICATIONS_KEY,
            source,
        })?;
        self.kv.put(MEDICATIONS_KEY, &value).await?;
        Ok(())
    }
}
