//! Background job scheduler and job implementations.

mod adherence_tick;
mod notification_dispatch;
mod pool_metrics;
mod scheduler;

pub use adherence_tick::AdherenceTickJob;
pub use notification_dispatch::NotificationDispatchJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{FirstRun, Job, JobScheduler};
