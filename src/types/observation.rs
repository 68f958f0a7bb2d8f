//! The in-memory observation table every analysis step consumes and produces.

use crate::types::error::TableError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// One measurement record: a station's named numeric fields at one instant.
///
/// `values` lines up with the measurement columns of the table the observation
/// belongs to. A missing measurement is `None`, never a sentinel number.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub station_id: String,
    pub values: Vec<Option<f64>>,
}

impl Observation {
    pub fn new(
        timestamp: DateTime<Utc>,
        station_id: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Self {
        Self {
            timestamp,
            station_id: station_id.into(),
            values,
        }
    }
}

/// A column-oriented collection of [`Observation`]s sharing one set of measurement columns.
///
/// Rows are addressed by position. After period aggregation the table holds at most one
/// row per (timestamp, station) and timestamps are non-decreasing; tables built by hand
/// carry whatever order they were built in until [`ObservationTable::sorted_by_timestamp`]
/// is applied.
///
/// Operations that change rows (filtering, sorting, deduplication, concatenation, gap
/// filling) run as polars queries over [`TabularExport::to_dataframe`] and return a new
/// table. The table is never mutated behind the caller's back.
///
/// [`TabularExport::to_dataframe`]: crate::TabularExport::to_dataframe
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationTable {
    columns: Vec<String>,
    timestamps: Vec<DateTime<Utc>>,
    stations: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl ObservationTable {
    /// Creates an empty table with the given measurement columns.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateColumn`] if a column name repeats.
    pub fn new<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }
        let values = vec![Vec::new(); columns.len()];
        Ok(Self {
            columns,
            timestamps: Vec::new(),
            stations: Vec::new(),
            values,
        })
    }

    /// Builds a table from observations, keeping their order.
    pub fn from_observations<I, S, O>(columns: I, observations: O) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        O: IntoIterator<Item = Observation>,
    {
        let mut table = Self::new(columns)?;
        for observation in observations {
            table.push(observation)?;
        }
        Ok(table)
    }

    /// Appends one observation.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowLength`] if the observation does not carry exactly one value
    /// per measurement column.
    pub fn push(&mut self, observation: Observation) -> Result<(), TableError> {
        if observation.values.len() != self.columns.len() {
            return Err(TableError::RowLength {
                expected: self.columns.len(),
                found: observation.values.len(),
            });
        }
        self.timestamps.push(observation.timestamp);
        self.stations.push(observation.station_id);
        for (column, value) in self.values.iter_mut().zip(observation.values) {
            column.push(value);
        }
        Ok(())
    }

    pub fn push_row(
        &mut self,
        timestamp: DateTime<Utc>,
        station_id: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), TableError> {
        self.push(Observation::new(timestamp, station_id, values))
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Measurement column names, in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of a measurement column.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingColumn`] if the table has no such column.
    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::missing_column(name))
    }

    /// Values of one measurement column, one entry per row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingColumn`] if the table has no such column.
    pub fn column(&self, name: &str) -> Result<&[Option<f64>], TableError> {
        let index = self.column_index(name)?;
        Ok(&self.values[index])
    }

    pub(crate) fn column_at(&self, index: usize) -> &[Option<f64>] {
        &self.values[index]
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Station identifier of every row.
    pub fn station_ids(&self) -> &[String] {
        &self.stations
    }

    /// Distinct station identifiers in first-seen order.
    pub fn stations(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.stations
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Returns the observation at `row`, if it exists.
    pub fn observation(&self, row: usize) -> Option<Observation> {
        if row >= self.len() {
            return None;
        }
        Some(Observation {
            timestamp: self.timestamps[row],
            station_id: self.stations[row].clone(),
            values: self.values.iter().map(|column| column[row]).collect(),
        })
    }

    /// Iterates over the rows as owned observations.
    pub fn iter(&self) -> impl Iterator<Item = Observation> + '_ {
        (0..self.len()).filter_map(|row| self.observation(row))
    }

    pub fn is_sorted_by_timestamp(&self) -> bool {
        self.timestamps.windows(2).all(|w| w[0] <= w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, h, 0, 0).unwrap()
    }

    fn sample() -> ObservationTable {
        let mut table = ObservationTable::new(["temperature", "wind_speed"]).unwrap();
        table.push_row(hour(2), "SN18700", vec![Some(1.0), None]).unwrap();
        table.push_row(hour(1), "SN90450", vec![Some(-3.0), Some(4.0)]).unwrap();
        table.push_row(hour(1), "SN18700", vec![None, Some(2.5)]).unwrap();
        table
    }

    #[test]
    fn rejects_duplicate_columns_and_short_rows() {
        assert!(matches!(
            ObservationTable::new(["temperature", "temperature"]),
            Err(TableError::DuplicateColumn(c)) if c == "temperature"
        ));

        let mut table = ObservationTable::new(["temperature"]).unwrap();
        let err = table.push_row(hour(0), "SN18700", vec![]).unwrap_err();
        assert!(matches!(err, TableError::RowLength { expected: 1, found: 0 }));
        assert!(table.is_empty());
    }

    #[test]
    fn missing_column_is_reported() {
        let table = sample();
        let err = table.column("humidity").unwrap_err();
        assert!(matches!(err, TableError::MissingColumn { column } if column == "humidity"));
    }

    #[test]
    fn stations_follow_first_seen_order() {
        let table = sample();
        assert_eq!(table.stations(), vec!["SN18700", "SN90450"]);
        assert!(!table.is_sorted_by_timestamp());
    }

    #[test]
    fn observation_round_trips_through_rows() {
        let table = sample();
        let rebuilt =
            ObservationTable::from_observations(table.columns().to_vec(), table.iter()).unwrap();
        assert_eq!(rebuilt, table);
        assert!(table.observation(3).is_none());
    }
}
