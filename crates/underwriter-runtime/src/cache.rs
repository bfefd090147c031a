//! Credit report cache.
//!
//! Keeps successful bureau reports per customer id so repeated evaluations
//! within the TTL skip the bureau call.

use moka::future::Cache;
use std::time::Duration;

use crate::bureau::CreditReport;

/// Default report lifetime.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Default maximum number of cached reports.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Credit report cache using moka.
#[derive(Clone)]
pub struct ReportCache {
    cache: Cache<String, CreditReport>,
}

impl ReportCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, customer_id: &str) -> Option<CreditReport> {
        self.cache.get(customer_id).await
    }

    pub async fn insert(&self, customer_id: &str, report: CreditReport) {
        self.cache.insert(customer_id.to_string(), report).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate number of cached reports.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}

impl std::fmt::Debug for ReportCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportCache")
            .field("entries", &self.entry_count())
            .finish()
    }
}
