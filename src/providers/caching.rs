use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::Cache;
use crate::rates::{RateSource, RateTable};

/// Default lifetime of a fetched rate table.
pub const DEFAULT_RATES_TTL: Duration = Duration::from_secs(5 * 60);

const RATES_KEY: &str = "rates";

/// TTL-caching wrapper around a [`RateSource`].
///
/// Rates are eventually-consistent data: a refresh may race another refresh
/// harmlessly, last writer wins. A failed refresh degrades to the last good
/// table, then to the static default table — it never fails the caller.
/// `refresh` is the forced-reload path for administrators correcting bad
/// rates; only that path surfaces source errors.
pub struct CachedRateSource<T: RateSource> {
    inner: T,
    ttl: Duration,
    cache: Cache<String, RateTable>,
    last_good: Arc<Mutex<Option<RateTable>>>,
}

impl<T: RateSource> CachedRateSource<T> {
    pub fn new(inner: T) -> Self {
        Self::with_ttl(inner, DEFAULT_RATES_TTL)
    }

    pub fn with_ttl(inner: T, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Cache::new(),
            last_good: Arc::new(Mutex::new(None)),
        }
    }

    /// The current table: cached if fresh, otherwise reloaded from the
    /// source with fallback on failure.
    pub async fn current(&self) -> RateTable {
        if let Some(table) = self.cache.get(&RATES_KEY.to_string()).await {
            return table;
        }

        match self.refresh().await {
            Ok(table) => table,
            Err(e) => {
                let last_good = self.last_good.lock().await.clone();
                match last_good {
                    Some(table) => {
                        warn!(error = %e, "Rate refresh failed, using last good table");
                        table
                    }
                    None => {
                        warn!(error = %e, "Rate refresh failed, using default rates");
                        RateTable::default_table()
                    }
                }
            }
        }
    }

    /// Force a reload from the source, bypassing the TTL. On success the
    /// cache and the last-good table are replaced.
    pub async fn refresh(&self) -> Result<RateTable> {
        let table = self.inner.load_rates().await?;
        debug!("Refreshed exchange rate table");

        self.cache
            .put(RATES_KEY.to_string(), table.clone(), Some(self.ttl))
            .await;
        *self.last_good.lock().await = Some(table.clone());
        Ok(table)
    }
}

#[async_trait]
impl<T: RateSource> RateSource for CachedRateSource<T> {
    async fn load_rates(&self) -> Result<RateTable> {
        Ok(self.current().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        call_count: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl RateSource for &CountingSource {
        async fn load_rates(&self) -> Result<RateTable> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("source unavailable"))
            } else {
                Ok(RateTable::new(HashMap::from([(
                    "USD".to_string(),
                    0.14,
                )])))
            }
        }
    }

    #[tokio::test]
    async fn test_second_read_is_cached() {
        let source = CountingSource::new(false);
        let cached = CachedRateSource::new(&source);

        let first = cached.current().await;
        assert_eq!(first.rate("USD"), Some(0.14));
        assert_eq!(source.call_count.load(Ordering::SeqCst), 1);

        let second = cached.current().await;
        assert_eq!(second.rate("USD"), Some(0.14));
        assert_eq!(source.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reloads() {
        let source = CountingSource::new(false);
        let cached = CachedRateSource::with_ttl(&source, Duration::from_millis(10));

        cached.current().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        cached.current().await;
        assert_eq!(source.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_without_history_falls_back_to_defaults() {
        let source = CountingSource::new(true);
        let cached = CachedRateSource::new(&source);

        let table = cached.current().await;
        assert_eq!(table.rate("USD"), Some(0.14));
        assert_eq!(table.rate("CNY"), Some(1.0));
    }

    #[tokio::test]
    async fn test_forced_refresh_bypasses_ttl_and_surfaces_errors() {
        let source = CountingSource::new(false);
        let cached = CachedRateSource::new(&source);

        cached.current().await;
        cached.refresh().await.unwrap();
        assert_eq!(source.call_count.load(Ordering::SeqCst), 2);

        let failing = CountingSource::new(true);
        let cached = CachedRateSource::new(&failing);
        assert!(cached.refresh().await.is_err());
    }

    #[tokio::test]
    async fn test_load_rates_trait_path_never_fails() {
        let source = CountingSource::new(true);
        let cached = CachedRateSource::new(&source);
        let table = cached.load_rates().await.unwrap();
        assert_eq!(table.rate("CNY"), Some(1.0));
    }
}
