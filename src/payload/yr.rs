//! Decoding of Yr location forecasts (`locationforecast/2.0/complete`).

use crate::payload::error::PayloadError;
use crate::types::observation::ObservationTable;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::Deserialize;

/// Columns of a decoded forecast table.
pub const FORECAST_COLUMNS: [&str; 4] = ["temperature", "precipitation", "humidity", "wind_speed"];

#[derive(Debug, Clone, Deserialize)]
pub struct LocationForecast {
    pub properties: ForecastProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub timeseries: Vec<ForecastStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastStep {
    pub time: DateTime<Utc>,
    pub data: StepData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepData {
    pub instant: Instant,
    pub next_1_hours: Option<NextPeriod>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instant {
    pub details: InstantDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstantDetails {
    pub air_temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextPeriod {
    pub details: Option<PeriodDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodDetails {
    pub precipitation_amount: Option<f64>,
}

impl ForecastStep {
    /// Precipitation over the following hour. Steps without an hourly period (far
    /// into the forecast) report 0.
    pub fn precipitation(&self) -> f64 {
        self.data
            .next_1_hours
            .as_ref()
            .and_then(|p| p.details.as_ref())
            .and_then(|d| d.precipitation_amount)
            .unwrap_or(0.0)
    }
}

/// Decodes the steps of a forecast falling on `start_date` through `end_date`
/// (inclusive, UTC days) into a table with [`FORECAST_COLUMNS`]. Every row carries
/// `location` as its station id.
///
/// # Errors
///
/// [`PayloadError::Json`] for malformed JSON or a missing `properties` object.
pub fn decode_forecast(
    body: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    location: &str,
) -> Result<ObservationTable, PayloadError> {
    let forecast: LocationForecast = serde_json::from_str(body)?;
    let start = start_date.and_time(NaiveTime::default()).and_utc();
    let end = end_date.and_time(NaiveTime::default()).and_utc() + TimeDelta::days(1);

    let mut table = ObservationTable::new(FORECAST_COLUMNS)?;
    for step in forecast
        .properties
        .timeseries
        .iter()
        .filter(|step| start <= step.time && step.time < end)
    {
        let details = &step.data.instant.details;
        table.push_row(
            step.time,
            location,
            vec![
                details.air_temperature,
                Some(step.precipitation()),
                details.relative_humidity,
                details.wind_speed,
            ],
        )?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "type": "Feature",
        "properties": {
            "meta": { "updated_at": "2024-05-01T10:00:00Z" },
            "timeseries": [
                {
                    "time": "2024-04-30T23:00:00Z",
                    "data": { "instant": { "details": { "air_temperature": 4.0, "relative_humidity": 90.0, "wind_speed": 1.0 } } }
                },
                {
                    "time": "2024-05-01T00:00:00Z",
                    "data": {
                        "instant": { "details": { "air_temperature": 5.2, "relative_humidity": 88.1, "wind_speed": 2.4 } },
                        "next_1_hours": { "summary": { "symbol_code": "rain" }, "details": { "precipitation_amount": 0.6 } }
                    }
                },
                {
                    "time": "2024-05-02T18:00:00Z",
                    "data": {
                        "instant": { "details": { "air_temperature": 11.0, "wind_speed": 3.0 } },
                        "next_6_hours": { "details": { "precipitation_amount": 2.0 } }
                    }
                },
                {
                    "time": "2024-05-03T00:00:00Z",
                    "data": { "instant": { "details": { "air_temperature": 6.0 } } }
                }
            ]
        }
    }"#;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn keeps_steps_inside_the_requested_days() {
        let table = decode_forecast(BODY, date(1), date(2), "Oslo").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), FORECAST_COLUMNS);
        assert_eq!(table.stations(), ["Oslo"]);
        assert_eq!(table.column("temperature").unwrap(), [Some(5.2), Some(11.0)]);
        assert_eq!(table.column("precipitation").unwrap(), [Some(0.6), Some(0.0)]);
        assert_eq!(table.column("humidity").unwrap(), [Some(88.1), None]);
    }

    #[test]
    fn missing_properties_is_an_error() {
        assert!(matches!(
            decode_forecast(r#"{ "type": "Feature" }"#, date(1), date(2), "Oslo"),
            Err(PayloadError::Json(_))
        ));
    }
}
