//! Line-oriented interactive session. Each parameter change re-runs the
//! render cycle, the same way a widget change would redraw a dashboard.

use crate::dashboard::{DisplaySurface, Session};
use crate::surface::TerminalSurface;
use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub const HELP: &str = "\
commands:
  days N            lookback window, 0-60
  range MIN MAX     chart price axis (USD)
  select A,B,...    companies to show (empty clears)
  add LABEL SYMBOL  register a company
  tickers           list registered companies
  refresh           drop cached prices and redraw
  show              redraw
  help              this text
  quit              leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Days(u32),
    Range(f64, f64),
    Select(Vec<String>),
    Add { label: String, symbol: String },
    Tickers,
    Refresh,
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let cmd = match word.to_lowercase().as_str() {
        "days" => Command::Days(rest.parse().with_context(|| format!("not a day count: {:?}", rest))?),
        "range" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let [min, max] = parts.as_slice() else {
                bail!("usage: range MIN MAX");
            };
            Command::Range(
                min.parse().with_context(|| format!("not a price: {:?}", min))?,
                max.parse().with_context(|| format!("not a price: {:?}", max))?,
            )
        }
        "select" => Command::Select(
            rest.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        ),
        // Symbol is the last word so labels may contain spaces
        "add" => match rest.rsplit_once(char::is_whitespace) {
            Some((label, symbol)) => Command::Add { label: label.trim().into(), symbol: symbol.into() },
            None => Command::Add { label: rest.into(), symbol: String::new() },
        },
        "tickers" => Command::Tickers,
        "refresh" => Command::Refresh,
        "show" | "" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command {:?}, try `help`", other),
    };
    Ok(cmd)
}

pub async fn run<R>(session: &mut Session, surface: &mut TerminalSurface, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    session.render_cycle(surface).await;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let cmd = match parse_command(&line) {
            Ok(c) => c,
            Err(e) => {
                surface.render_error(&format!("{:#}", e));
                continue;
            }
        };
        debug!("Command: {:?}", cmd);

        match cmd {
            Command::Days(n) => surface.params_mut().days = n,
            Command::Range(min, max) => {
                let range = &mut surface.params_mut().price_range;
                range.min = min;
                range.max = max;
            }
            Command::Select(names) => surface.params_mut().selected = names,
            Command::Add { label, symbol } => {
                session.add_ticker(surface, &label, &symbol);
                continue;
            }
            Command::Tickers => {
                surface.render_registry(session.registry());
                continue;
            }
            Command::Refresh => session.refresh(),
            Command::Show => {}
            Command::Help => {
                surface.render_notice(HELP);
                continue;
            }
            Command::Quit => break,
        }

        session.render_cycle(surface).await;
    }
    Ok(())
}
