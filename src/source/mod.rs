pub mod http_client;
pub mod parsers;

use crate::config::ProviderConfig;
use crate::models::HistoryBar;
use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use self::http_client::HttpClient;
use self::parsers::parse_chart;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error {0}")]
    Http(u16),

    #[error("provider error {code}: {description}")]
    Provider { code: String, description: String },
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable market-data provider.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily history for the trailing `days` calendar days, ascending.
    async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Vec<HistoryBar>>;
}

// ── Yahoo chart API ───────────────────────────────────────────────────────────

pub struct YahooChartSource {
    client: HttpClient,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// e.g. GOOGL, 30 → {base}/GOOGL?range=30d&interval=1d
    fn history_url(&self, symbol: &str, days: u32) -> Result<Url> {
        let base = format!("{}/{}", self.base_url, symbol.trim().to_uppercase());
        Url::parse_with_params(&base, &[("range", format!("{}d", days)), ("interval", "1d".to_string())])
            .with_context(|| format!("Invalid history URL for {}", symbol))
    }
}

#[async_trait]
impl MarketDataSource for YahooChartSource {
    async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Vec<HistoryBar>> {
        if days == 0 {
            debug!("{}: zero-day window, skipping request", symbol);
            return Ok(Vec::new());
        }

        let url = self.history_url(symbol, days)?;
        let body = self.client.get_text(&url).await
            .with_context(|| format!("Failed to fetch history for {}", symbol))?;

        let bars = parse_chart(&body)
            .with_context(|| format!("Failed to parse history for {}", symbol))?;

        if bars.is_empty() {
            warn!("{}: provider returned no bars", symbol);
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> YahooChartSource {
        let cfg = ProviderConfig {
            base_url: "https://example.test/v8/finance/chart/".into(),
            ..ProviderConfig::default()
        };
        YahooChartSource::new(&cfg).unwrap()
    }

    #[test]
    fn history_url_carries_range_and_interval() {
        let url = source().history_url("googl", 30).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v8/finance/chart/GOOGL?range=30d&interval=1d"
        );
    }

    #[tokio::test]
    async fn zero_days_never_hits_the_network() {
        let bars = source().fetch_history("AAPL", 0).await.unwrap();
        assert!(bars.is_empty());
    }
}
