//! Yahoo v8 chart response → `HistoryBar`s.

use crate::models::HistoryBar;
use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use super::SourceError;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn at<T: Copy>(v: &[Option<T>], i: usize) -> Option<T> {
    v.get(i).copied().flatten()
}

/// Parse a chart response body. Timestamps are shifted by the exchange's
/// `gmtoffset` so each bar lands on its local trading date. Rows with a
/// missing close are dropped.
pub fn parse_chart(body: &str) -> Result<Vec<HistoryBar>> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("Malformed chart response")?;

    if let Some(err) = envelope.chart.error {
        return Err(SourceError::Provider { code: err.code, description: err.description }.into());
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            continue;
        };
        let Some(local) = DateTime::from_timestamp(ts + offset, 0) else {
            continue;
        };

        bars.push(HistoryBar {
            date: local.date_naive(),
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close,
            volume: at(&quote.volume, i),
        });
    }

    debug!("{}: parsed {} bars", result.meta.symbol, bars.len());
    Ok(bars)
}
