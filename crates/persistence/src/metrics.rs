//! Database metrics: query latency histogram and pool gauges.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

pub const QUERY_DURATION: &str = "database_query_duration_seconds";

pub fn record_query_duration(query: &'static str, duration_secs: f64) {
    histogram!(QUERY_DURATION, "query" => query).record(duration_secs);
}

/// Pool gauges; sampled by the api's background job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one repository call. Labels are static query names such as
/// `insert_reservation`, so the histogram cardinality stays bounded.
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query, self.start.elapsed().as_secs_f64());
    }
}
