//! Conversion between [`ObservationTable`] and polars frames, plus CSV export.

use crate::types::error::TableError;
use crate::types::observation::ObservationTable;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Column holding the observation instant in exported frames.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Column holding the station identifier in exported frames.
pub const STATION_COLUMN: &str = "station_id";

/// Anything the surrounding application may want as a table: observation tables,
/// statistics summaries, correlation matrices, forecast results.
pub trait TabularExport {
    /// Builds a polars `DataFrame` with one row per record and named columns.
    fn to_dataframe(&self) -> Result<DataFrame, TableError>;

    /// Writes the frame as UTF-8 CSV with a header row.
    fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let mut frame = self.to_dataframe()?;
        write_frame_csv(&mut frame, path)
    }
}

pub(crate) fn write_frame_csv(frame: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    let mut file = File::create(path).map_err(|e| TableError::CsvWrite(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)?;
    Ok(())
}

/// Turns UTC instants into a millisecond datetime column.
pub(crate) fn datetime_column(name: &str, instants: &[DateTime<Utc>]) -> Result<Column, TableError> {
    let millis: Vec<i64> = instants.iter().map(DateTime::timestamp_millis).collect();
    let series = Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(series.into())
}

pub(crate) fn float_column(name: &str, values: &[Option<f64>]) -> Column {
    Series::new(name.into(), values).into()
}

fn get_opt_float(column: &Column, idx: usize) -> Option<f64> {
    column.f64().ok().and_then(|ca| ca.get(idx))
}

impl TabularExport for ObservationTable {
    /// Frame layout: `timestamp`, `station_id`, then one float column per measurement.
    fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let mut columns = Vec::with_capacity(self.columns().len() + 2);
        columns.push(datetime_column(TIMESTAMP_COLUMN, self.timestamps())?);
        columns.push(Series::new(STATION_COLUMN.into(), self.station_ids()).into());
        for (index, name) in self.columns().iter().enumerate() {
            columns.push(float_column(name, self.column_at(index)));
        }
        Ok(DataFrame::new(columns)?)
    }
}

impl ObservationTable {
    /// Reads a frame with a `timestamp` datetime column, a `station_id` string column and
    /// the listed measurement columns. Measurement columns are cast to `f64`; nulls become
    /// absent values.
    ///
    /// # Errors
    ///
    /// * [`TableError::MissingColumn`] if any of the required columns is not in the frame.
    /// * [`TableError::InvalidTimestamp`] / [`TableError::MissingStation`] for null keys.
    /// * [`TableError::DataFrame`] if a column cannot be cast.
    pub fn from_dataframe(frame: &DataFrame, measurements: &[&str]) -> Result<Self, TableError> {
        let lookup = |name: &str| {
            frame
                .column(name)
                .map_err(|_| TableError::missing_column(name))
        };

        let timestamps = lookup(TIMESTAMP_COLUMN)?
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .cast(&DataType::Int64)?;
        let stations = lookup(STATION_COLUMN)?.cast(&DataType::String)?;
        let measurement_columns = measurements
            .iter()
            .map(|name| Ok(lookup(name)?.cast(&DataType::Float64)?))
            .collect::<Result<Vec<Column>, TableError>>()?;

        let millis = timestamps.i64()?;
        let station_ids = stations.str()?;
        let mut table = ObservationTable::new(measurements.iter().copied())?;
        for row in 0..frame.height() {
            let timestamp = millis
                .get(row)
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .ok_or(TableError::InvalidTimestamp { row })?;
            let station = station_ids
                .get(row)
                .ok_or(TableError::MissingStation { row })?;
            let values = measurement_columns
                .iter()
                .map(|column| get_opt_float(column, row))
                .collect();
            table.push_row(timestamp, station, values)?;
        }
        Ok(table)
    }

    /// Collects a lazy frame (for example one produced by a polars query over cached
    /// downloads) and reads it with [`ObservationTable::from_dataframe`].
    pub fn from_lazy(frame: LazyFrame, measurements: &[&str]) -> Result<Self, TableError> {
        let frame = frame.collect()?;
        Self::from_dataframe(&frame, measurements)
    }

    /// Reads a frame back with the given measurement columns, in that order.
    pub(crate) fn from_frame(frame: &DataFrame, columns: &[String]) -> Result<Self, TableError> {
        let names: Vec<&str> = columns.iter().map(String::as_str).collect();
        Self::from_dataframe(frame, &names)
    }

    pub(crate) fn lazy(&self) -> Result<LazyFrame, TableError> {
        Ok(self.to_dataframe()?.lazy())
    }

    /// Runs `plan` over this table as a lazy frame and reads the result back with the
    /// same measurement columns.
    pub(crate) fn query<F>(&self, plan: F) -> Result<Self, TableError>
    where
        F: FnOnce(LazyFrame) -> LazyFrame,
    {
        let frame = plan(self.lazy()?).collect()?;
        Self::from_frame(&frame, self.columns())
    }

    /// Rows of one station, in their original order.
    pub fn for_station(&self, station_id: &str) -> Result<Self, TableError> {
        self.query(|frame| frame.filter(col(STATION_COLUMN).eq(lit(station_id))))
    }

    /// Drops rows that repeat an earlier `(timestamp, station_id)` pair; the first-seen
    /// row wins and the order of the survivors is unchanged.
    pub fn deduplicated(&self) -> Result<Self, TableError> {
        self.query(deduplicate)
    }

    /// Stable sort by timestamp: rows with equal timestamps keep their relative order.
    pub fn sorted_by_timestamp(&self) -> Result<Self, TableError> {
        self.query(sort_by_timestamp)
    }

    /// Stacks tables with identical measurement columns, in iteration order.
    /// An empty iterator gives an empty table without columns.
    ///
    /// # Errors
    ///
    /// [`TableError::SchemaMismatch`] if the tables do not share the same columns.
    pub fn concat<I>(tables: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = ObservationTable>,
    {
        let tables: Vec<ObservationTable> = tables.into_iter().collect();
        let Some(first) = tables.first() else {
            return Ok(Self::default());
        };
        let frame = union(&tables)?.collect()?;
        Self::from_frame(&frame, first.columns())
    }
}

/// Vertically stacks the tables as one lazy frame after checking that their
/// measurement columns match.
pub(crate) fn union(tables: &[ObservationTable]) -> Result<LazyFrame, TableError> {
    let expected = tables.first().map(ObservationTable::columns).unwrap_or_default();
    let mut frames = Vec::with_capacity(tables.len());
    for table in tables {
        if table.columns() != expected {
            return Err(TableError::SchemaMismatch {
                expected: expected.to_vec(),
                found: table.columns().to_vec(),
            });
        }
        frames.push(table.lazy()?);
    }
    Ok(concat(frames, UnionArgs::default())?)
}

pub(crate) fn deduplicate(frame: LazyFrame) -> LazyFrame {
    frame.unique_stable(
        Some(vec![TIMESTAMP_COLUMN.into(), STATION_COLUMN.into()]),
        UniqueKeepStrategy::First,
    )
}

pub(crate) fn sort_by_timestamp(frame: LazyFrame) -> LazyFrame {
    frame.sort(
        [TIMESTAMP_COLUMN],
        SortMultipleOptions::default().with_maintain_order(true),
    )
}

/// Nullable floats of one frame column.
pub(crate) fn float_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, TableError> {
    let column = frame
        .column(name)
        .map_err(|_| TableError::missing_column(name))?
        .cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}
