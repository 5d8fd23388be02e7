//! Price History Fetcher: registry → provider → wide table.
//!
//! ## Fetch flow
//!
//! `fetch(days, registry)`:
//!   1. Look up `(days, registry fingerprint)` in the session cache.
//!   2. On a miss, request each company's history in registry order, one
//!      request at a time, keep the closes, stack one row per company.
//!   3. Cache the table unless some ticker failed.
//!
//! A failed ticker never aborts the fetch: it gets an empty row and a
//! `FetchFailure` entry so the dashboard can warn about it.

use crate::models::PriceSeries;
use crate::registry::TickerRegistry;
use crate::source::MarketDataSource;
use crate::table::WidePriceTable;
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub company: String,
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub table: WidePriceTable,
    pub failures: Vec<FetchFailure>,
    pub from_cache: bool,
}

// ── Cache ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub days: u32,
    pub registry: u64,
}

impl CacheKey {
    pub fn new(days: u32, registry: &TickerRegistry) -> Self {
        Self { days, registry: registry.fingerprint() }
    }
}

/// Session-lifetime memo of fully successful fetches.
#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<CacheKey, WidePriceTable>,
}

impl FetchCache {
    pub fn get(&self, key: &CacheKey) -> Option<&WidePriceTable> {
        self.entries.get(key)
    }

    /// Store a table. Entries for any other registry fingerprint are
    /// dropped first: the registry only grows, so they can never match again.
    pub fn insert(&mut self, key: CacheKey, table: WidePriceTable) {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.registry == key.registry);
        if self.entries.len() < before {
            debug!("Dropped {} tables for an older registry", before - self.entries.len());
        }
        self.entries.insert(key, table);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Fetcher ───────────────────────────────────────────────────────────────────

pub struct PriceHistoryFetcher {
    source: Box<dyn MarketDataSource>,
    cache: FetchCache,
}

impl PriceHistoryFetcher {
    pub fn new(source: Box<dyn MarketDataSource>) -> Self {
        Self { source, cache: FetchCache::default() }
    }

    pub async fn fetch(&mut self, days: u32, registry: &TickerRegistry) -> FetchOutcome {
        let key = CacheKey::new(days, registry);
        if let Some(table) = self.cache.get(&key) {
            debug!("Cache hit for {} days ({} companies)", days, table.len());
            return FetchOutcome { table: table.clone(), failures: Vec::new(), from_cache: true };
        }

        info!("Fetching {} days of closes for {} companies", days, registry.len());

        let mut rows = Vec::with_capacity(registry.len());
        let mut failures = Vec::new();

        for (company, symbol) in registry.iter() {
            let series = match self.source.fetch_history(symbol, days).await {
                Ok(bars) => {
                    if let Some(last) = bars.last() {
                        debug!(
                            "{} ({}): {} bars, last {} o={:?} h={:?} l={:?} c={} v={:?}",
                            company, symbol, bars.len(), last.date,
                            last.open, last.high, last.low, last.close, last.volume
                        );
                    }
                    let series = PriceSeries::from_bars(&bars);
                    if series.is_empty() {
                        debug!("{} ({}): no closes in window", company, symbol);
                    } else {
                        debug!("{} ({}): {} distinct closing dates", company, symbol, series.len());
                    }
                    series
                }
                Err(e) => {
                    warn!("{} ({}): {:#}", company, symbol, e);
                    failures.push(FetchFailure {
                        company: company.to_string(),
                        symbol: symbol.to_string(),
                        reason: format!("{:#}", e),
                    });
                    PriceSeries::default()
                }
            };
            rows.push((company.to_string(), series));
        }

        let table = WidePriceTable::from_series(rows);

        info!(
            "Fetched {} companies | {} dates | {} failures",
            table.len(),
            table.columns().len(),
            failures.len()
        );

        if failures.is_empty() {
            self.cache.insert(key, table.clone());
            debug!("{} tables cached", self.cache.len());
        }

        FetchOutcome { table, failures, from_cache: false }
    }

    /// Drop every memoized table; the next fetch goes to the provider.
    pub fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            debug!("Dropping {} cached tables", self.cache.len());
        }
        self.cache.clear();
    }

    #[cfg(test)]
    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::HistoryBar;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory provider: `days` consecutive bars per symbol starting
    /// 2024-03-01, close = base + day index. Symbols listed in `failing`
    /// error out; `sparse` symbols skip every other day.
    #[derive(Clone, Default)]
    pub struct StubSource {
        pub calls: Arc<AtomicUsize>,
        pub failing: Vec<String>,
        pub sparse: Vec<String>,
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Vec<HistoryBar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|s| s == symbol) {
                bail!("connection refused");
            }
            let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            let base = symbol.len() as f64 * 100.0;
            Ok((0..days)
                .filter(|i| !self.sparse.iter().any(|s| s == symbol) || i % 2 == 0)
                .map(|i| HistoryBar {
                    date: start + Duration::days(i as i64),
                    open: None,
                    high: None,
                    low: None,
                    close: base + i as f64,
                    volume: None,
                })
                .collect())
        }
    }

    fn registry(entries: &[(&str, &str)]) -> TickerRegistry {
        let mut reg = TickerRegistry::empty();
        for (l, s) in entries {
            reg.add_ticker(l, s).unwrap();
        }
        reg
    }

    #[tokio::test]
    async fn one_row_per_company_in_registry_order() {
        let stub = StubSource { sparse: vec!["GOOGL".into()], ..Default::default() };
        let mut fetcher = PriceHistoryFetcher::new(Box::new(stub));
        let reg = registry(&[("Google", "GOOGL"), ("Apple", "AAPL")]);

        let out = fetcher.fetch(5, &reg).await;
        assert!(out.failures.is_empty());
        assert_eq!(out.table.names(), vec!["Google", "Apple"]);
        assert_eq!(out.table.columns().len(), 5);
        assert_eq!(out.table.row("Google").unwrap().prices.len(), 3);
        assert_eq!(out.table.row("Apple").unwrap().prices.len(), 5);
    }

    #[tokio::test]
    async fn zero_days_gives_rows_without_columns() {
        let mut fetcher = PriceHistoryFetcher::new(Box::new(StubSource::default()));
        let out = fetcher.fetch(0, &TickerRegistry::default()).await;
        assert_eq!(out.table.len(), 9);
        assert!(out.table.columns().is_empty());
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn repeated_days_are_served_from_cache() {
        let stub = StubSource::default();
        let calls = Arc::clone(&stub.calls);
        let mut fetcher = PriceHistoryFetcher::new(Box::new(stub));
        let reg = registry(&[("Apple", "AAPL"), ("Google", "GOOGL")]);

        let first = fetcher.fetch(10, &reg).await;
        let second = fetcher.fetch(10, &reg).await;
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.table, second.table);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        fetcher.fetch(20, &reg).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(fetcher.cache().len(), 2);
    }

    #[tokio::test]
    async fn registry_edit_misses_cache() {
        let stub = StubSource::default();
        let calls = Arc::clone(&stub.calls);
        let mut fetcher = PriceHistoryFetcher::new(Box::new(stub));
        let mut reg = registry(&[("Apple", "AAPL")]);

        fetcher.fetch(10, &reg).await;
        reg.add_ticker("Tesla", "TSLA").unwrap();
        let out = fetcher.fetch(10, &reg).await;

        assert!(!out.from_cache);
        assert_eq!(out.table.names(), vec!["Apple", "Tesla"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn registry_edit_drops_tables_for_old_registry() {
        let mut fetcher = PriceHistoryFetcher::new(Box::new(StubSource::default()));
        let mut reg = registry(&[("Apple", "AAPL")]);

        fetcher.fetch(10, &reg).await;
        fetcher.fetch(20, &reg).await;
        assert_eq!(fetcher.cache().len(), 2);

        reg.add_ticker("Tesla", "TSLA").unwrap();
        fetcher.fetch(10, &reg).await;
        assert_eq!(fetcher.cache().len(), 1);
        assert!(fetcher.cache().get(&CacheKey::new(10, &reg)).is_some());
    }

    #[tokio::test]
    async fn failed_ticker_yields_empty_row_and_is_not_cached() {
        let stub = StubSource { failing: vec!["FB".into()], ..Default::default() };
        let calls = Arc::clone(&stub.calls);
        let mut fetcher = PriceHistoryFetcher::new(Box::new(stub));
        let reg = registry(&[("FaceBook", "FB"), ("Apple", "AAPL")]);

        let out = fetcher.fetch(3, &reg).await;
        assert_eq!(out.table.len(), 2);
        assert!(out.table.row("FaceBook").unwrap().prices.is_empty());
        assert_eq!(out.table.row("Apple").unwrap().prices.len(), 3);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].symbol, "FB");
        assert!(out.failures[0].reason.contains("connection refused"));

        assert!(fetcher.cache().is_empty());
        fetcher.fetch(3, &reg).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let stub = StubSource::default();
        let calls = Arc::clone(&stub.calls);
        let mut fetcher = PriceHistoryFetcher::new(Box::new(stub));
        let reg = registry(&[("Apple", "AAPL")]);

        fetcher.fetch(5, &reg).await;
        fetcher.invalidate();
        fetcher.fetch(5, &reg).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
