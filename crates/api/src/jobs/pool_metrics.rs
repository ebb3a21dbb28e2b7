//! Background job to record connection pool metrics.

use std::time::Duration;

use sqlx::SqlitePool;

use super::scheduler::{FirstRun, Job};

/// Job that periodically records database connection pool metrics.
pub struct PoolMetricsJob {
    pool: SqlitePool,
}

impl PoolMetricsJob {
    /// Create a new pool metrics job.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(10)
    }

    fn first_run(&self) -> FirstRun {
        FirstRun::Immediately
    }

    async fn execute(&self) -> anyhow::Result<()> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}
