//! Background jobs.

mod pool_metrics;

pub use pool_metrics::{spawn_pool_metrics, POOL_METRICS_INTERVAL};
