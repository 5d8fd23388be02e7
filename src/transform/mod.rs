//! Wide table → long (tidy) chart rows.

use crate::models::ChartRow;
use crate::table::WidePriceTable;

/// One `ChartRow` per present cell of the selected rows, company-major then
/// date ascending. Names missing from the table contribute nothing; absent
/// cells are skipped, never emitted as empty rows.
///
/// Callers must not pass an empty selection.
pub fn to_chart_rows(table: &WidePriceTable, selected: &[String]) -> Vec<ChartRow> {
    debug_assert!(!selected.is_empty(), "empty selection must be handled by the caller");

    table
        .select(selected)
        .rows()
        .iter()
        .flat_map(|row| {
            row.prices.iter().map(move |(date, close)| ChartRow {
                date: *date,
                company: row.name.clone(),
                close: *close,
            })
        })
        .collect()
}
