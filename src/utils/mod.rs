use std::time::{Duration, Instant};
use tracing::debug;

/// A simple wall-clock timer for logging how long a step took.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        debug!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱  Finished: {} (took {:.2?})", self.label, self.elapsed());
    }
}

/// Two decimals with thousands separators: 1234.5 → "1,234.50".
pub fn fmt_price(p: f64) -> String {
    let s = format!("{:.2}", p.abs());
    let (int_part, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let int_grouped: String = grouped.chars().rev().collect();

    let sign = if p < 0.0 && s != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, int_grouped, frac)
}
