use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Presentation format for every date label: "2024 March 05".
pub const DATE_LABEL_FORMAT: &str = "%Y %B %d";

/// Longest lookback window the dashboard offers, in calendar days.
pub const MAX_DAYS: u32 = 60;

pub fn date_label(date: NaiveDate) -> String {
    date.format(DATE_LABEL_FORMAT).to_string()
}

// ── Provider bar ──────────────────────────────────────────────────────────────

/// One daily row as returned by the provider. Only `close` survives into
/// the price tables; the rest is kept for logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

// ── Price series ──────────────────────────────────────────────────────────────

/// Closing prices of one ticker, ascending by date, one point per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.sort_by_key(|(d, _)| *d);
        points.dedup_by_key(|(d, _)| *d);
        Self { points }
    }

    pub fn from_bars(bars: &[HistoryBar]) -> Self {
        Self::new(bars.iter().map(|b| (b.date, b.close)).collect())
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ── Chart row ─────────────────────────────────────────────────────────────────

/// Tidy record fed to the line chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Name")]
    pub company: String,
    #[serde(rename = "Stock Prices (USD)")]
    pub close: f64,
}

// ── Parameters ────────────────────────────────────────────────────────────────

/// Chart y-axis clip. Never used to filter data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self { min: 0.0, max: 3500.0 }
    }
}

/// Everything the display surface hands back on each redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub days: u32,
    pub price_range: PriceRange,
    pub selected: Vec<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            days: 30,
            price_range: PriceRange::default(),
            selected: vec!["Google".to_string(), "Apple".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn date_label_uses_full_month_name() {
        assert_eq!(date_label(d(2024, 3, 5)), "2024 March 05");
    }

    #[test]
    fn series_is_sorted_and_deduplicated() {
        let s = PriceSeries::new(vec![
            (d(2024, 3, 6), 2.0),
            (d(2024, 3, 5), 1.0),
            (d(2024, 3, 6), 3.0),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.points()[0], (d(2024, 3, 5), 1.0));
        assert_eq!(s.points()[1].0, d(2024, 3, 6));
    }

    #[test]
    fn chart_row_serializes_with_chart_field_names() {
        let row = ChartRow { date: d(2024, 3, 5), company: "Apple".into(), close: 170.5 };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Date"], "2024-03-05");
        assert_eq!(json["Name"], "Apple");
        assert_eq!(json["Stock Prices (USD)"], 170.5);
    }
}
