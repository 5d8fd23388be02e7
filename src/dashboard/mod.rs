//! Session state and the render cycle that drives a display surface.
//!
//! Every interaction re-runs `render_cycle` from the top: read parameters,
//! fetch (memoized), slice, reshape, render. The only state carried between
//! cycles is the registry and the fetcher's cache, both owned by `Session`.

use crate::models::{ChartRow, MAX_DAYS, Parameters, PriceRange};
use crate::pipeline::PriceHistoryFetcher;
use crate::registry::TickerRegistry;
use crate::source::MarketDataSource;
use crate::table::WidePriceTable;
use crate::transform::to_chart_rows;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("select at least one company")]
    NoCompanySelected,

    #[error("days must be between 0 and {max}, got {0}", max = MAX_DAYS)]
    DaysOutOfRange(u32),

    #[error("price range bounds must be finite numbers, got {min} to {max}")]
    NonFinitePriceRange { min: f64, max: f64 },

    #[error("price range minimum {min} exceeds maximum {max}")]
    InvertedPriceRange { min: f64, max: f64 },
}

/// What the session needs from whatever draws the dashboard.
pub trait DisplaySurface {
    fn parameters(&self) -> Parameters;
    fn render_table(&mut self, table: &WidePriceTable);
    fn render_chart(&mut self, rows: &[ChartRow], price_range: PriceRange);
    fn render_error(&mut self, message: &str);
    fn render_notice(&mut self, message: &str);
    fn render_registry(&mut self, registry: &TickerRegistry);
}

/// Outcome of one render cycle, mostly for callers that log or test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleStatus {
    Rendered { companies: usize, points: usize },
    Rejected,
}

pub fn validate(params: &Parameters) -> Result<(), DashboardError> {
    if params.days > MAX_DAYS {
        return Err(DashboardError::DaysOutOfRange(params.days));
    }
    if !params.price_range.is_finite() {
        return Err(DashboardError::NonFinitePriceRange {
            min: params.price_range.min,
            max: params.price_range.max,
        });
    }
    if !params.price_range.is_ordered() {
        return Err(DashboardError::InvertedPriceRange {
            min: params.price_range.min,
            max: params.price_range.max,
        });
    }
    Ok(())
}

pub struct Session {
    registry: TickerRegistry,
    fetcher: PriceHistoryFetcher,
}

impl Session {
    pub fn new(registry: TickerRegistry, source: Box<dyn MarketDataSource>) -> Self {
        Self { registry, fetcher: PriceHistoryFetcher::new(source) }
    }

    pub fn registry(&self) -> &TickerRegistry {
        &self.registry
    }

    /// Forget memoized tables so the next cycle goes to the provider.
    pub fn refresh(&mut self) {
        self.fetcher.invalidate();
    }

    pub async fn render_cycle<S: DisplaySurface>(&mut self, surface: &mut S) -> CycleStatus {
        let params = surface.parameters();
        debug!("Render cycle with {:?}", params);

        if let Err(e) = validate(&params) {
            surface.render_error(&e.to_string());
            return CycleStatus::Rejected;
        }

        let outcome = self.fetcher.fetch(params.days, &self.registry).await;
        debug!(
            "{} companies, {} prices (cached: {})",
            outcome.table.len(),
            outcome.table.cell_count(),
            outcome.from_cache
        );
        for f in &outcome.failures {
            surface.render_error(&format!(
                "price history unavailable for {} ({}): {}",
                f.company, f.symbol, f.reason
            ));
        }

        if params.selected.is_empty() {
            surface.render_error(&DashboardError::NoCompanySelected.to_string());
            return CycleStatus::Rejected;
        }

        let shown = outcome.table.select(&params.selected).sorted_by_name();
        surface.render_table(&shown);

        let rows = to_chart_rows(&outcome.table, &params.selected);
        surface.render_chart(&rows, params.price_range);

        info!("Rendered {} companies, {} points", shown.len(), rows.len());
        CycleStatus::Rendered { companies: shown.len(), points: rows.len() }
    }

    /// Register a company. Tables already fetched are left alone; the
    /// next render cycle picks the new ticker up.
    pub fn add_ticker<S: DisplaySurface>(&mut self, surface: &mut S, label: &str, symbol: &str) -> bool {
        match self.registry.add_ticker(label, symbol) {
            Ok(updated) => {
                info!("Registered {} ({})", label.trim(), symbol.trim());
                surface.render_notice(&format!("added {} ({})", label.trim(), symbol.trim()));
                surface.render_registry(updated);
                true
            }
            Err(e) => {
                for msg in e.messages() {
                    surface.render_error(&msg);
                }
                false
            }
        }
    }
}
