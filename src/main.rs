mod config;
mod dashboard;
mod models;
mod pipeline;
mod registry;
mod repl;
mod source;
mod surface;
mod table;
mod transform;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::dashboard::{CycleStatus, DisplaySurface, Session};
use crate::registry::TickerRegistry;
use crate::source::YahooChartSource;
use crate::surface::TerminalSurface;

#[derive(Parser)]
#[command(name = "stock-dashboard", about = "US stock closing-price dashboard", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch closes and render the table and chart once
    Show {
        /// Lookback window in calendar days (0-60)
        #[arg(short, long)]
        days: Option<u32>,

        /// Lower bound of the chart's price axis (USD)
        #[arg(long)]
        ymin: Option<f64>,

        /// Upper bound of the chart's price axis (USD)
        #[arg(long)]
        ymax: Option<f64>,

        /// Company to show; repeat for several (default: Google, Apple)
        #[arg(short, long = "company")]
        companies: Vec<String>,

        /// Register an extra company before fetching, as LABEL=SYMBOL
        #[arg(long = "add", value_name = "LABEL=SYMBOL")]
        additions: Vec<String>,

        /// Write the Vega-Lite chart spec here instead of stdout
        #[arg(long, env = "DASHBOARD_CHART_OUT")]
        chart_out: Option<PathBuf>,

        /// Also export the displayed table as CSV
        #[arg(long)]
        csv_out: Option<PathBuf>,
    },

    /// List registered companies and their ticker symbols
    Tickers,

    /// Interactive session reading commands from stdin
    Repl,
}

fn build_session(config: &AppConfig) -> Result<Session> {
    let source = YahooChartSource::new(&config.provider)
        .context("Failed to build market-data source")?;
    let registry = TickerRegistry::from_config(&config.registry.tickers);
    Ok(Session::new(registry, Box::new(source)))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "stock_dashboard=info,warn",
        1 => "stock_dashboard=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Show { days, ymin, ymax, companies, additions, chart_out, csv_out } => {
            let _t = utils::Timer::start("Render");
            let mut session = build_session(&config)?;
            let mut surface = TerminalSurface::from_config(&config);

            let params = surface.params_mut();
            if let Some(d) = days {
                params.days = d;
            }
            if let Some(v) = ymin {
                params.price_range.min = v;
            }
            if let Some(v) = ymax {
                params.price_range.max = v;
            }
            if !companies.is_empty() {
                params.selected = companies;
            }
            if chart_out.is_some() {
                surface = surface.with_chart_path(chart_out);
            }
            if csv_out.is_some() {
                surface = surface.with_csv_path(csv_out);
            }

            for spec in &additions {
                let (label, symbol) = spec.split_once('=').unwrap_or((spec.as_str(), ""));
                session.add_ticker(&mut surface, label, symbol);
            }

            match session.render_cycle(&mut surface).await {
                CycleStatus::Rendered { companies, points } => {
                    info!("Done: {} companies, {} price points", companies, points)
                }
                CycleStatus::Rejected => info!("Nothing rendered"),
            }
        }

        Command::Tickers => {
            let registry = TickerRegistry::from_config(&config.registry.tickers);
            let mut surface = TerminalSurface::from_config(&config);
            surface.render_registry(&registry);
        }

        Command::Repl => {
            let mut session = build_session(&config)?;
            let mut surface = TerminalSurface::from_config(&config);
            surface.render_notice(repl::HELP);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            repl::run(&mut session, &mut surface, stdin).await?;
        }
    }

    Ok(())
}
