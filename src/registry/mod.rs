//! Company catalog: display name → ticker symbol.

use crate::config::TickerEntry;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

pub const DEFAULT_TICKERS: &[(&str, &str)] = &[
    ("Amazon", "AMZN"),
    ("Apple", "AAPL"),
    ("COSTCO", "COST"),
    ("FaceBook", "FB"),
    ("Google", "GOOGL"),
    ("Microsoft", "MSFT"),
    ("Netflix", "NFLX"),
    ("Twitter", "TWTR"),
    ("Walmart", "WMT"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{}", missing_message(.ticker, .label))]
    MissingInput { ticker: bool, label: bool },

    #[error("'{0}' is already registered")]
    Duplicate(String),
}

fn missing_message(ticker: &bool, label: &bool) -> String {
    let mut parts = Vec::new();
    if *ticker {
        parts.push("ticker not provided");
    }
    if *label {
        parts.push("label not provided");
    }
    parts.join("; ")
}

impl RegistryError {
    /// One line per banner the surface should show.
    pub fn messages(&self) -> Vec<String> {
        match self {
            RegistryError::MissingInput { ticker, label } => {
                let mut out = Vec::new();
                if *ticker {
                    out.push("ticker not provided".to_string());
                }
                if *label {
                    out.push("label not provided".to_string());
                }
                out
            }
            other => vec![other.to_string()],
        }
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Insertion-ordered, unique-keyed mapping. Entries are never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRegistry {
    entries: Vec<(String, String)>,
}

impl Default for TickerRegistry {
    fn default() -> Self {
        Self {
            entries: DEFAULT_TICKERS
                .iter()
                .map(|(l, s)| (l.to_string(), s.to_string()))
                .collect(),
        }
    }
}

impl TickerRegistry {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Build from configured entries; falls back to the default catalog
    /// when none are configured. Invalid or repeated entries are skipped.
    pub fn from_config(entries: &[TickerEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let mut registry = Self::empty();
        for e in entries {
            if let Err(err) = registry.add_ticker(&e.label, &e.symbol) {
                tracing::warn!("Skipping configured ticker {:?}: {}", e.label, err);
            }
        }
        registry
    }

    /// Validate and insert `label → symbol`. Empty inputs are checked
    /// independently so both can be reported at once; nothing is mutated
    /// on error.
    pub fn add_ticker(&mut self, label: &str, symbol: &str) -> Result<&Self, RegistryError> {
        let label = label.trim();
        let symbol = symbol.trim();

        if label.is_empty() || symbol.is_empty() {
            return Err(RegistryError::MissingInput {
                ticker: symbol.is_empty(),
                label: label.is_empty(),
            });
        }
        if self.contains(label) {
            return Err(RegistryError::Duplicate(label.to_string()));
        }

        self.entries.push((label.to_string(), symbol.to_string()));
        Ok(self)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(l, _)| l == label)
    }

    #[cfg(test)]
    pub fn symbol(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, s)| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, s)| (l.as_str(), s.as_str()))
    }

    #[cfg(test)]
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Order-independent digest of the contents, used as part of the fetch
    /// cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut sorted: Vec<&(String, String)> = self.entries.iter().collect();
        sorted.sort();
        let mut hasher = DefaultHasher::new();
        sorted.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for TickerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, symbol) in self.iter() {
            writeln!(f, "  {:<12} {}", label, symbol)?;
        }
        Ok(())
    }
}
