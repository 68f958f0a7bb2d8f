//! Decoding of Frost observation responses (`observations/v0.jsonld`).

use crate::config::FrostConfig;
use crate::payload::error::PayloadError;
use crate::types::observation::ObservationTable;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct FrostResponse {
    #[serde(default)]
    pub data: Vec<FrostRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrostRecord {
    pub source_id: String,
    pub reference_time: String,
    #[serde(default)]
    pub observations: Vec<FrostObservation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrostObservation {
    pub element_id: String,
    pub value: Option<f64>,
}

/// Value of the first observation of `element_id`, if any.
pub fn element_value(observations: &[FrostObservation], element_id: &str) -> Option<f64> {
    observations
        .iter()
        .find(|o| o.element_id == element_id)
        .and_then(|o| o.value)
}

/// Station part of a Frost source id: `SN18700:0` becomes `SN18700`, the form used
/// when requesting sources.
pub fn station_id(source_id: &str) -> &str {
    source_id.split(':').next().unwrap_or(source_id)
}

/// Decodes a Frost response into a table with the columns of `config`'s element
/// mapping.
///
/// Station ids lose their sensor suffix (see [`station_id`]), so they match
/// [`FrostConfig::sources`]. Records sharing a reference time and station merge into
/// one row, in first-seen order. Unmapped elements are ignored and mapped elements a record lacks stay absent.
/// A response without `data` is a valid empty result.
///
/// # Errors
///
/// [`PayloadError::Json`] for malformed JSON, [`PayloadError::InvalidTime`] for a
/// reference time that is not RFC 3339.
pub fn decode_observations(body: &str, config: &FrostConfig) -> Result<ObservationTable, PayloadError> {
    let response: FrostResponse = serde_json::from_str(body)?;
    let mut table = ObservationTable::new(config.columns())?;

    let mut keys: Vec<(DateTime<Utc>, String)> = Vec::new();
    let mut rows: HashMap<(DateTime<Utc>, String), Vec<Option<f64>>> = HashMap::new();
    for (index, record) in response.data.iter().enumerate() {
        let time = DateTime::parse_from_rfc3339(&record.reference_time)
            .map_err(|_| PayloadError::InvalidTime {
                index,
                time: record.reference_time.clone(),
            })?
            .with_timezone(&Utc);
        let key = (time, station_id(&record.source_id).to_string());
        let row = rows.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            vec![None; config.elements.len()]
        });
        for (slot, mapping) in row.iter_mut().zip(&config.elements) {
            if let Some(value) = element_value(&record.observations, &mapping.element_id) {
                *slot = Some(value);
            }
        }
    }

    for key in keys {
        if let Some(values) = rows.remove(&key) {
            table.push_row(key.0, key.1, values)?;
        }
    }
    Ok(table)
}
