//! Fetching a long period chunk by chunk and merging the pieces.

use crate::aggregation::error::AggregationError;
use crate::aggregation::source::ObservationSource;
use crate::types::error::TableError;
use crate::types::frame::{deduplicate, sort_by_timestamp, union};
use crate::types::interval::{ChunkInterval, PeriodBound};
use crate::types::observation::ObservationTable;
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Splits `[start, end)` into consecutive half-open chunks of `interval`, the last one
/// clamped to `end`.
///
/// # Errors
///
/// * [`AggregationError::EmptyRange`] if `start >= end`.
/// * [`AggregationError::ChunkOverflow`] if a chunk boundary leaves the calendar.
pub fn chunks(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: ChunkInterval,
) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>, AggregationError> {
    if start >= end {
        return Err(AggregationError::EmptyRange { start, end });
    }

    let mut chunks = Vec::new();
    let mut current = start;
    while current < end {
        let next = interval
            .advance(current)
            .ok_or(AggregationError::ChunkOverflow(current))?
            .min(end);
        chunks.push((current, next));
        current = next;
    }
    Ok(chunks)
}

/// Concatenates chunk tables, keeps the first row of every (timestamp, station) pair
/// and sorts by timestamp.
///
/// Chunks without rows are skipped, so a source may answer "no data" with an empty
/// table of any shape.
///
/// # Errors
///
/// `SchemaMismatch` (wrapped) if non-empty chunks disagree on their columns.
pub fn merge_chunks<I>(tables: I) -> Result<ObservationTable, AggregationError>
where
    I: IntoIterator<Item = ObservationTable>,
{
    let mut first_empty = None;
    let mut non_empty = Vec::new();
    for table in tables {
        if table.is_empty() {
            first_empty.get_or_insert(table);
        } else {
            non_empty.push(table);
        }
    }
    if non_empty.is_empty() {
        return Ok(first_empty.unwrap_or_default());
    }

    let total: usize = non_empty.iter().map(ObservationTable::len).sum();
    let frame = sort_by_timestamp(deduplicate(union(&non_empty)?))
        .collect()
        .map_err(TableError::from)?;
    let merged = ObservationTable::from_frame(&frame, non_empty[0].columns())?;
    if merged.len() < total {
        debug!("Dropped {} duplicate (timestamp, station) rows", total - merged.len());
    }
    Ok(merged)
}

/// Fetches long periods through an [`ObservationSource`] one chunk at a time.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use frostcast::{ChunkInterval, ObservationTable, PeriodAggregator, TableError};
///
/// let source = |start: DateTime<Utc>, _end: DateTime<Utc>| -> Result<ObservationTable, TableError> {
///     let mut table = ObservationTable::new(["temperature"])?;
///     table.push_row(start, "SN18700", vec![Some(1.0)])?;
///     Ok(table)
/// };
///
/// let mut aggregator = PeriodAggregator::new(source, ChunkInterval::Weekly);
/// let table = aggregator.aggregate("2023-01-01", "2023-01-29").unwrap();
/// assert_eq!(table.len(), 4);
/// assert!(table.is_sorted_by_timestamp());
/// ```
pub struct PeriodAggregator<S> {
    source: S,
    interval: ChunkInterval,
}

impl<S: ObservationSource> PeriodAggregator<S> {
    pub fn new(source: S, interval: ChunkInterval) -> Self {
        Self { source, interval }
    }

    /// Like [`new`](Self::new) with the interval given as a code (`"W"`, `"M"`, ...).
    ///
    /// # Errors
    ///
    /// [`AggregationError::InvalidInterval`] for an unrecognized code.
    pub fn with_interval_code(source: S, interval: &str) -> Result<Self, AggregationError> {
        Ok(Self::new(source, interval.parse()?))
    }

    pub fn interval(&self) -> ChunkInterval {
        self.interval
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches `[start, end)` chunk by chunk and merges the results: no duplicate
    /// (timestamp, station) pairs, timestamps non-decreasing.
    ///
    /// A failing chunk aborts the whole period; no partial table is returned.
    ///
    /// # Errors
    ///
    /// * [`AggregationError::InvalidBound`] if a bound cannot be read as a date or instant.
    /// * [`AggregationError::EmptyRange`] if `start >= end`.
    /// * [`AggregationError::Source`] wrapping the source's error for the failing chunk.
    pub fn aggregate<A, B>(&mut self, start: A, end: B) -> Result<ObservationTable, AggregationError>
    where
        A: PeriodBound + std::fmt::Debug,
        B: PeriodBound + std::fmt::Debug,
    {
        let start = start
            .to_utc_bound()
            .ok_or_else(|| AggregationError::InvalidBound(format!("{start:?}")))?;
        let end = end
            .to_utc_bound()
            .ok_or_else(|| AggregationError::InvalidBound(format!("{end:?}")))?;

        let chunks = chunks(start, end, self.interval)?;
        let mut tables = Vec::with_capacity(chunks.len());
        for (chunk_start, chunk_end) in chunks {
            debug!("Fetching observations from {chunk_start} to {chunk_end}");
            let table = self
                .source
                .fetch(chunk_start, chunk_end)
                .map_err(|e| AggregationError::Source {
                    start: chunk_start,
                    end: chunk_end,
                    source: Box::new(e),
                })?;
            tables.push(table);
        }

        let merged = merge_chunks(tables)?;
        info!(
            "Aggregated {} observations from {} to {} in {} chunks",
            merged.len(),
            start,
            end,
            self.interval
        );
        Ok(merged)
    }
}
