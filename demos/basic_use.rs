use chrono::{DateTime, Duration, Utc};
use frostcast::{
    FrostcastError, ObservationTable, PipelineConfig, TableError, TabularExport, WeatherPipeline,
};
use std::env;

/// Synthetic hourly observations for two stations, standing in for an HTTP client.
fn in_memory_source(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<ObservationTable, TableError> {
    let mut table = ObservationTable::new(["temperature", "cloud_area_fraction", "wind_speed"])?;
    let mut at = start;
    while at < end {
        let hour = at.timestamp() / 3600;
        let daily = ((hour % 24) as f64 / 24.0 * std::f64::consts::TAU).sin();
        table.push_row(
            at,
            "SN18700",
            vec![Some(2.0 + 4.0 * daily), Some((hour % 9) as f64), Some(3.0 + (hour % 5) as f64)],
        )?;
        table.push_row(
            at,
            "SN90450",
            vec![Some(-5.0 + 3.0 * daily), Some((hour % 7) as f64), None],
        )?;
        at += Duration::hours(1);
    }
    Ok(table)
}

fn main() -> Result<(), FrostcastError> {
    configure_polars_display();

    let config = PipelineConfig::from_json(r#"{ "interval": "W", "forecast": { "horizon": 12 } }"#)?;
    let report = WeatherPipeline::new(config).run(in_memory_source, "2023-01-01", "2023-02-01")?;

    println!("{} rows, {} outliers removed", report.raw.len(), report.outliers.len());
    println!("{:#?}", report.statistics.to_dataframe()?);
    println!("{}", report.metrics);
    println!("next 12 hours: {:?}", report.forecast.values);

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    // show 20 rows
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
