//! Wide price table: one row per company, one column per date.

use crate::models::{PriceSeries, date_label};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRow {
    pub name: String,
    pub prices: BTreeMap<NaiveDate, f64>,
}

impl CompanyRow {
    pub fn price(&self, date: NaiveDate) -> Option<f64> {
        self.prices.get(&date).copied()
    }
}

/// Rows keep the order they were stacked in; columns are the union of
/// every row's dates, ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidePriceTable {
    rows: Vec<CompanyRow>,
}

impl WidePriceTable {
    /// Stack one row per `(company, series)`. Rows are not joined on date:
    /// a date missing from one series is just an absent cell in that row.
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = (String, PriceSeries)>,
    {
        let mut table = Self::default();
        for (name, s) in series {
            table.push_row(name, &s);
        }
        table
    }

    pub fn push_row(&mut self, name: String, series: &PriceSeries) {
        self.rows.push(CompanyRow {
            name,
            prices: series.points().iter().copied().collect(),
        });
    }

    pub fn rows(&self) -> &[CompanyRow] {
        &self.rows
    }

    #[cfg(test)]
    pub fn row(&self, name: &str) -> Option<&CompanyRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn columns(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self
            .rows
            .iter()
            .flat_map(|r| r.prices.keys().copied())
            .collect();
        dates.into_iter().collect()
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.columns().into_iter().map(date_label).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of present (non-absent) cells.
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|r| r.prices.len()).sum()
    }

    /// Rows whose name is in `names`, in table order. Unknown names are
    /// ignored.
    pub fn select(&self, names: &[String]) -> WidePriceTable {
        WidePriceTable {
            rows: self
                .rows
                .iter()
                .filter(|r| names.iter().any(|n| n == &r.name))
                .cloned()
                .collect(),
        }
    }

    pub fn sorted_by_name(mut self) -> WidePriceTable {
        self.rows.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    /// Write as CSV: `Name,<date label>...`, one line per company, empty
    /// field for absent cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let columns = self.columns();
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec!["Name".to_string()];
        header.extend(columns.iter().copied().map(date_label));
        wtr.write_record(&header).context("CSV header write failed")?;

        for row in &self.rows {
            let mut record = vec![row.name.clone()];
            record.extend(
                columns
                    .iter()
                    .map(|d| row.price(*d).map(|p| format!("{:.2}", p)).unwrap_or_default()),
            );
            wtr.write_record(&record)
                .with_context(|| format!("CSV row write failed for {}", row.name))?;
        }

        wtr.flush().context("CSV flush failed")?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    /// Apple trades 4–6, Google 5–7, Amazon has no data.
    pub fn sample_table() -> WidePriceTable {
        WidePriceTable::from_series(vec![
            ("Apple".to_string(), PriceSeries::new(vec![(d(4), 175.1), (d(5), 170.1), (d(6), 169.1)])),
            ("Google".to_string(), PriceSeries::new(vec![(d(5), 132.7), (d(6), 135.1), (d(7), 135.6)])),
            ("Amazon".to_string(), PriceSeries::default()),
        ])
    }

    #[test]
    fn merge_keeps_one_row_per_company_and_unions_dates() {
        let t = sample_table();
        assert_eq!(t.len(), 3);
        assert_eq!(t.names(), vec!["Apple", "Google", "Amazon"]);
        assert_eq!(t.columns(), vec![d(4), d(5), d(6), d(7)]);
        assert_eq!(t.cell_count(), 6);
    }

    #[test]
    fn missing_dates_are_absent_cells() {
        let t = sample_table();
        assert_eq!(t.row("Apple").unwrap().price(d(7)), None);
        assert_eq!(t.row("Google").unwrap().price(d(4)), None);
        assert_eq!(t.row("Google").unwrap().price(d(5)), Some(132.7));
        assert!(t.row("Amazon").unwrap().prices.is_empty());
    }

    #[test]
    fn select_drops_unknown_names_and_keeps_table_order() {
        let t = sample_table();
        let s = t.select(&["Google".into(), "Tesla".into(), "Apple".into()]);
        assert_eq!(s.names(), vec!["Apple", "Google"]);

        let none = t.select(&["Tesla".into()]);
        assert!(none.is_empty());
    }

    #[test]
    fn sorted_by_name_orders_rows() {
        let t = sample_table().sorted_by_name();
        assert_eq!(t.names(), vec!["Amazon", "Apple", "Google"]);
    }

    #[test]
    fn column_labels_use_display_format() {
        let t = sample_table();
        assert_eq!(t.column_labels()[0], "2024 March 04");
    }

    #[test]
    fn csv_export_leaves_absent_cells_blank() {
        let t = sample_table().select(&["Apple".into(), "Google".into()]);
        let mut buf = Vec::new();
        t.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name,2024 March 04,2024 March 05,2024 March 06,2024 March 07");
        assert_eq!(lines[1], "Apple,175.10,170.10,169.10,");
        assert_eq!(lines[2], "Google,,132.70,135.10,135.60");
    }

    #[test]
    fn empty_table_has_no_columns() {
        let t = WidePriceTable::from_series(vec![("Apple".to_string(), PriceSeries::default())]);
        assert_eq!(t.len(), 1);
        assert!(t.columns().is_empty());
    }
}
