//! Per-station gap filling.

use crate::types::error::TableError;
use crate::types::frame::STATION_COLUMN;
use crate::types::observation::ObservationTable;
use log::warn;
use polars::prelude::*;

/// Fills absent measurements within each station's rows: forward fill first, then a
/// backward fill for any leading gap.
///
/// Stations are filled independently, so a value never leaks from one station into
/// another. A column that is absent for every row of a station stays absent for that
/// station. Row count and row order are unchanged.
pub fn fill_missing_by_station(table: &ObservationTable) -> Result<ObservationTable, TableError> {
    if table.is_empty() || table.columns().is_empty() {
        return Ok(table.clone());
    }
    let fills: Vec<Expr> = table
        .columns()
        .iter()
        .map(|name| {
            col(name.as_str())
                .forward_fill(None)
                .backward_fill(None)
                .over([col(STATION_COLUMN)])
        })
        .collect();
    let filled = table.query(|frame| frame.with_columns(fills))?;

    for name in filled.columns() {
        let gaps = filled.column(name)?.iter().filter(|v| v.is_none()).count();
        if gaps > 0 {
            warn!("Column '{name}' stays absent in {gaps} rows of stations without any value");
        }
    }
    Ok(filled)
}
