use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Market-data provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Initial parameter values shown by the dashboard
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default = "default_days")]
    pub days: u32,

    #[serde(default)]
    pub price_min: f64,

    #[serde(default = "default_price_max")]
    pub price_max: f64,

    #[serde(default = "default_selected")]
    pub selected: Vec<String>,
}

/// Optional replacement for the built-in company catalog
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub tickers: Vec<TickerEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TickerEntry {
    pub label: String,
    pub symbol: String,
}

/// Where the terminal surface writes chart specs and CSV exports.
/// `None` for the chart means stdout; `None` for CSV means no export.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub chart_path: Option<PathBuf>,

    #[serde(default)]
    pub csv_path: Option<PathBuf>,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://query2.finance.yahoo.com/v8/finance/chart".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) stock-dashboard/0.1".to_string()
}
fn default_days() -> u32 {
    30
}
fn default_price_max() -> f64 {
    3500.0
}
fn default_selected() -> Vec<String> {
    vec!["Google".to_string(), "Apple".to_string()]
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            price_min: 0.0,
            price_max: default_price_max(),
            selected: default_selected(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|e| {
            warn!("Invalid configuration ({}), using defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}
