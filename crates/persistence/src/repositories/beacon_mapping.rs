//! Beacon mapping repository.
//!
//! The whole mapping collection is stored as one JSON array under a fixed key
//! and rewritten after every mutation.

use domain::models::BeaconMapping;
use sqlx::SqlitePool;
use tracing::warn;

use super::key_value::KeyValueRepository;
use crate::entities::BeaconMappingRecord;
use crate::error::PersistenceError;

/// Storage key of the beacon mapping collection.
pub const BEACON_MAPPINGS_KEY: &str = "BeaconMappingsKey";

#[derive(Clone)]
pub struct BeaconMappingRepository {
    kv: KeyValueRepository,
}

impl BeaconMappingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            kv: KeyValueRepository::new(pool),
        }
    }

    /// Load all mappings. A missing key is an empty collection.
    pub async fn load(&self) -> Result<Vec<BeaconMapping>, PersistenceError> {
        let Some(row) = self.kv.get(BEACON_MAPPINGS_KEY).await? else {
            return Ok(Vec::new());
        };
        let records: Vec<BeaconMappingRecord> = serde_json::from_str(&row.value)
            .map_err(|e| PersistenceError::decode(BEACON_MAPPINGS_KEY, e))?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Load all mappings, falling back to an empty collection on failure.
    pub async fn load_or_default(&self) -> Vec<BeaconMapping> {
        match self.load().await {
            Ok(mappings) => mappings,
            Err(e) => {
                warn!(error = %e, "Failed to load beacon mappings, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the stored collection.
    pub async fn save_all(&self, mappings: &[BeaconMapping]) -> Result<(), PersistenceError> {
        let records: Vec<BeaconMappingRecord> = mappings.iter().map(Into::into).collect();
        let value = serde_json::to_string(&records).map_err(|source| PersistenceError::Encode {
            key: BEACON_MAPPINGS_KEY,
            source,
        })?;
        self.kv.put(BEACON_MAPPINGS_KEY, &value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use domain::models::BeaconId;

    #[tokio::test]
    async fn test_missing_key_loads_empty() {
        let repo = BeaconMappingRepository::new(create_memory_pool().await.unwrap());
        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let repo = BeaconMappingRepository::new(create_memory_pool().await.unwrap());
        let mappings = vec![
            BeaconMapping {
                beacon_id: BeaconId::new("B1"),
                box_number: 3,
            },
            BeaconMapping {
                beacon_id: BeaconId::new("B2"),
                box_number: 7,
            },
        ];
        repo.save_all(&mappings).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), mappings);

        repo.save_all(&mappings[1..]).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), &mappings[1..]);
    }

    #[tokio::test]
    async fn test_corrupt_value_falls_back_to_empty() {
        let pool = create_memory_pool().await.unwrap();
        KeyValueRepository::new(pool.clone())
            .put(BEACON_MAPPINGS_KEY, "not json")
            .await
            .unwrap();

        let repo = BeaconMappingRepository::new(pool);
        assert!(matches!(
            repo.load().await,
            Err(PersistenceError::Decode { .. })
        ));
        assert!(repo.load_or_default().await.is_empty());
    }
}
