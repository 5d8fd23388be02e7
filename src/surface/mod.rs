//! Terminal display surface: text table on the output stream, Vega-Lite
//! chart spec to a file or the output stream, banners on stderr.

use crate::config::AppConfig;
use crate::dashboard::DisplaySurface;
use crate::models::{ChartRow, Parameters, PriceRange, date_label};
use crate::registry::TickerRegistry;
use crate::table::WidePriceTable;
use crate::utils::fmt_price;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PRICE_FIELD: &str = "Stock Prices (USD)";

/// Vega-Lite line chart: date on x, close on y clipped to `price_range`,
/// one colour per company.
pub fn chart_spec(rows: &[ChartRow], price_range: PriceRange) -> Value {
    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "width": "container",
        "data": { "values": rows },
        "mark": { "type": "line", "opacity": 0.8, "clip": true },
        "encoding": {
            "x": { "field": "Date", "type": "temporal" },
            "y": {
                "field": PRICE_FIELD,
                "type": "quantitative",
                "stack": null,
                "scale": { "domain": [price_range.min, price_range.max] }
            },
            "color": { "field": "Name", "type": "nominal" }
        }
    })
}

/// Dates down the side, one column per company.
pub fn format_table(table: &WidePriceTable) -> String {
    let names = table.names();
    let date_width = 18;
    let col_width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0).max(10);

    let mut out = format!("{:<date_width$}", "Date");
    for name in &names {
        out.push_str(&format!(" {:>col_width$}", name));
    }
    out.push('\n');
    out.push_str(&"─".repeat(date_width + names.len() * (col_width + 1)));
    out.push('\n');

    for date in table.columns() {
        out.push_str(&format!("{:<date_width$}", date_label(date)));
        for row in table.rows() {
            let cell = row.price(date).map(fmt_price).unwrap_or_default();
            out.push_str(&format!(" {:>col_width$}", cell));
        }
        out.push('\n');
    }
    out
}

pub struct TerminalSurface {
    params: Parameters,
    chart_path: Option<PathBuf>,
    csv_path: Option<PathBuf>,
    out: Box<dyn Write>,
}

impl TerminalSurface {
    pub fn new(params: Parameters, out: Box<dyn Write>) -> Self {
        Self { params, chart_path: None, csv_path: None, out }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let params = Parameters {
            days: config.dashboard.days,
            price_range: PriceRange::new(config.dashboard.price_min, config.dashboard.price_max),
            selected: config.dashboard.selected.clone(),
        };
        Self::new(params, Box::new(std::io::stdout()))
            .with_chart_path(config.output.chart_path.clone())
            .with_csv_path(config.output.csv_path.clone())
    }

    pub fn with_chart_path(mut self, path: Option<PathBuf>) -> Self {
        self.chart_path = path;
        self
    }

    pub fn with_csv_path(mut self, path: Option<PathBuf>) -> Self {
        self.csv_path = path;
        self
    }

    pub fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn write_out(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("Failed to write to output: {}", e);
        }
    }
}

fn write_chart_file(path: &Path, spec: &Value) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Could not create {:?}", path))?;
    serde_json::to_writer_pretty(file, spec)
        .with_context(|| format!("Could not write chart spec to {:?}", path))?;
    Ok(())
}

fn write_csv_file(path: &Path, table: &WidePriceTable) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Could not create {:?}", path))?;
    table.write_csv(file)
}

impl DisplaySurface for TerminalSurface {
    fn parameters(&self) -> Parameters {
        self.params.clone()
    }

    fn render_table(&mut self, table: &WidePriceTable) {
        let labels = table.column_labels();
        let span = match (labels.first(), labels.last()) {
            (Some(first), Some(last)) => format!(", {} to {}", first, last),
            _ => String::new(),
        };
        let heading = format!(
            "\nClosing prices over the last {} days (USD){}\n\n",
            self.params.days, span
        );
        if table.is_empty() {
            self.render_notice("none of the selected companies are registered");
        }
        let body = format_table(table);
        self.write_out(&heading);
        self.write_out(&body);

        if let Some(path) = self.csv_path.clone() {
            match write_csv_file(&path, table) {
                Ok(()) => debug!("Table exported to {:?}", path),
                Err(e) => self.render_error(&format!("{:#}", e)),
            }
        }
    }

    fn render_chart(&mut self, rows: &[ChartRow], price_range: PriceRange) {
        let spec = chart_spec(rows, price_range);
        match self.chart_path.clone() {
            Some(path) => match write_chart_file(&path, &spec) {
                Ok(()) => self.render_notice(&format!("chart written to {}", path.display())),
                Err(e) => self.render_error(&format!("{:#}", e)),
            },
            None => {
                let text = serde_json::to_string_pretty(&spec).unwrap_or_default();
                self.write_out(&format!("\n{}\n", text));
            }
        }
    }

    fn render_error(&mut self, message: &str) {
        eprintln!("error: {}", message);
    }

    fn render_notice(&mut self, message: &str) {
        eprintln!("note: {}", message);
    }

    fn render_registry(&mut self, registry: &TickerRegistry) {
        if registry.is_empty() {
            self.write_out("No companies registered.\n");
            return;
        }
        let text = format!("{} companies:\n{}", registry.len(), registry);
        self.write_out(&text);
    }
}
