use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use frostcast::{
    merge_chunks, Analyzer, ChunkInterval, ForecastConfig, ForecastEngine, ForecastState,
    FrostConfig, FrostJsonSource, FrostRequest, ObservationTable, PayloadError, PeriodAggregator,
    PipelineConfig, TabularExport, WeatherPipeline,
};
use std::error::Error;

fn hour(h: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
}

fn table(columns: &[&str], rows: &[(&str, Vec<Option<f64>>)]) -> ObservationTable {
    let mut table = ObservationTable::new(columns.iter().copied()).unwrap();
    for (i, (station, values)) in rows.iter().enumerate() {
        table.push_row(hour(i as i64), *station, values.clone()).unwrap();
    }
    table
}

#[test]
fn extreme_temperature_never_survives_outlier_removal() {
    let rows: Vec<_> = [1.0, 2.0, 3.0, 4.0, 100.0]
        .iter()
        .zip([5.0, 6.0, 7.0, 8.0, 9.0])
        .map(|(t, w)| ("SN18700", vec![Some(*t), Some(w)]))
        .collect();
    let analyzer = Analyzer::new(table(&["temperature", "wind"], &rows));

    let removal = analyzer
        .remove_outliers()
        .column("temperature")
        .z_score_threshold(1.0)
        .call()
        .unwrap();

    assert!(!removal.kept.column("temperature").unwrap().contains(&Some(100.0)));
    assert!(removal.outliers.column("temperature").unwrap().contains(&Some(100.0)));
    assert_eq!(removal.kept.len() + removal.outliers.len(), 5);
}

#[test]
fn outlier_removal_is_idempotent() {
    let rows: Vec<_> = [3.0, 4.0, 5.0, 4.5, 3.5, 60.0, 4.2, -40.0, 4.8]
        .iter()
        .map(|t| ("SN18700", vec![Some(*t)]))
        .collect();
    let analyzer = Analyzer::new(table(&["temperature"], &rows));
    let first = analyzer
        .remove_outliers()
        .column("temperature")
        .z_score_threshold(2.0)
        .call()
        .unwrap();
    let second = Analyzer::new(first.kept.clone())
        .remove_outliers()
        .column("temperature")
        .z_score_threshold(2.0)
        .call()
        .unwrap();

    assert!(second.outliers.is_empty());
    assert_eq!(second.kept, first.kept);
}

#[test]
fn linear_series_splits_and_forecasts() {
    let rows: Vec<_> = (0..6)
        .map(|i| ("SN18700", vec![Some(2.0 * i as f64), Some(0.0), Some(1.0)]))
        .collect();
    let data = table(&["temperature", "cloud_area_fraction", "wind_speed"], &rows);
    let mut engine = ForecastEngine::new(data, ForecastConfig::default());

    assert_eq!(engine.prepare_data().unwrap().len(), 5);
    let split = engine.split_data(0.5).unwrap();
    assert_eq!(split.x_train.shape(), (2, 3));
    assert_eq!(split.x_test.shape(), (3, 3));

    let model = engine.train_model().unwrap();
    assert_relative_eq!(model.coefficients[0], 1.0, epsilon = 1e-9);
    assert_relative_eq!(model.intercept, 2.0, epsilon = 1e-9);
    engine.predict().unwrap();
    assert_eq!(engine.state(), ForecastState::Predicted);

    let metrics = engine.evaluate_model().unwrap();
    assert_relative_eq!(metrics.mae, 0.0, epsilon = 1e-9);

    let forecast = engine.forecast(4).unwrap();
    assert_eq!(forecast.values.len(), 4);
    assert!(forecast.values.iter().all(|v| v.is_finite()));
    assert!(engine.forecast(0).unwrap().values.is_empty());
}

#[test]
fn duplicate_observations_keep_the_first_seen_row() {
    let first = table(
        &["temperature"],
        &[("SN18700", vec![Some(1.0)]), ("SN18700", vec![Some(2.0)])],
    );
    let mut second = ObservationTable::new(["temperature"]).unwrap();
    second.push_row(hour(1), "SN18700", vec![Some(99.0)]).unwrap();
    second.push_row(hour(1), "SN90450", vec![Some(5.0)]).unwrap();
    second.push_row(hour(0), "SN18700", vec![Some(98.0)]).unwrap();

    let merged = merge_chunks([first, second]).unwrap();

    assert_eq!(merged.len(), 3);
    assert!(merged.is_sorted_by_timestamp());
    let rows: Vec<(DateTime<Utc>, String, Option<f64>)> = merged
        .iter()
        .map(|o| (o.timestamp, o.station_id, o.values[0]))
        .collect();
    assert_eq!(
        rows,
        [
            (hour(0), "SN18700".to_string(), Some(1.0)),
            (hour(1), "SN18700".to_string(), Some(2.0)),
            (hour(1), "SN90450".to_string(), Some(5.0)),
        ]
    );
}

#[test]
fn filling_leaves_no_gap_in_stations_with_data() {
    let data = table(
        &["temperature", "wind"],
        &[
            ("SN18700", vec![None, None]),
            ("SN90450", vec![Some(1.0), None]),
            ("SN18700", vec![Some(4.0), None]),
            ("SN90450", vec![None, None]),
            ("SN18700", vec![None, None]),
        ],
    );
    let filled = Analyzer::new(data.clone()).fill_missing().unwrap();

    assert_eq!(
        filled.data().column("temperature").unwrap(),
        [Some(4.0), Some(1.0), Some(4.0), Some(1.0), Some(4.0)]
    );
    assert!(filled.data().column("wind").unwrap().iter().all(Option::is_none));
    assert_eq!(Analyzer::new(data).data().column("temperature").unwrap()[0], None);
}

#[test]
fn correlation_matrix_is_symmetric() {
    let rows: Vec<_> = (0..20)
        .map(|i| {
            let x = i as f64;
            ("SN18700", vec![Some(x), Some((x * 0.7).cos()), Some(x * x)])
        })
        .collect();
    let matrix = Analyzer::new(table(&["a", "b", "c"], &rows))
        .correlation_matrix()
        .unwrap();

    for x in ["a", "b", "c"] {
        assert_relative_eq!(matrix.get(x, x).unwrap(), 1.0);
        for y in ["a", "b", "c"] {
            assert_relative_eq!(matrix.get(x, y).unwrap(), matrix.get(y, x).unwrap());
        }
    }
}

fn fake_frost(request: &FrostRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>> {
    assert!(request.endpoint.starts_with("https://frost.met.no/"));
    let range = request.param("referencetime").ok_or("missing referencetime")?;
    let start = range.split('/').next().ok_or("empty referencetime")?;
    Ok(format!(
        r#"{{ "data": [
            {{ "sourceId": "SN18700:0", "referenceTime": "{start}",
               "observations": [ {{ "elementId": "air_temperature", "value": 1.5 }} ] }},
            {{ "sourceId": "SN18700:0", "referenceTime": "{start}",
               "observations": [ {{ "elementId": "wind_speed", "value": 3.0 }} ] }}
        ] }}"#
    ))
}

#[test]
fn frost_source_decodes_each_chunk() {
    let source = FrostJsonSource::new(FrostConfig::default(), fake_frost);
    let mut aggregator = PeriodAggregator::new(source, ChunkInterval::Weekly);
    let table = aggregator.aggregate("2023-01-01", "2023-01-15").unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.timestamps()[1], hour(7 * 24));
    assert_eq!(table.column("temperature").unwrap(), [Some(1.5), Some(1.5)]);
    assert_eq!(table.column("wind_speed").unwrap(), [Some(3.0), Some(3.0)]);
    assert_eq!(table.column("cloud_area_fraction").unwrap(), [None, None]);
    assert_eq!(table.stations(), ["SN18700"]);
}

#[test]
fn frost_transport_receives_the_client_id() {
    let mut seen = Vec::new();
    let transport = |request: &FrostRequest<'_>| -> Result<String, Box<dyn Error + Send + Sync>> {
        seen.push((request.client_id.to_string(), request.param("referencetime").map(String::from)));
        Ok(r#"{ "data": [] }"#.to_string())
    };
    let config = FrostConfig::builder().client_id("my-client").build();
    let mut source = FrostJsonSource::new(config, transport);
    let table = frostcast::ObservationSource::fetch(&mut source, hour(6), hour(18)).unwrap();
    drop(source);

    assert!(table.is_empty());
    assert_eq!(
        seen,
        [(
            "my-client".to_string(),
            Some("2023-01-01T06:00:00Z/2023-01-01T18:00:00Z".to_string())
        )]
    );
}

#[test]
fn frost_transport_failure_is_reported() {
    let failing = |_: &FrostRequest<'_>| -> Result<String, Box<dyn Error + Send + Sync>> {
        Err("connection refused".into())
    };
    let mut source = FrostJsonSource::new(FrostConfig::default(), failing);
    let err = frostcast::ObservationSource::fetch(&mut source, hour(0), hour(24)).unwrap_err();
    assert!(matches!(err, PayloadError::Transport(_)));
}

#[test]
fn pipeline_report_exports_to_csv() {
    let rows: Vec<_> = (0..48)
        .map(|i| {
            let x = i as f64;
            ("SN18700", vec![Some((x / 4.0).sin() * 3.0), Some((i % 8) as f64), Some(2.0 + (x / 5.0).cos())])
        })
        .collect();
    let data = table(&["temperature", "cloud_area_fraction", "wind_speed"], &rows);
    let config = PipelineConfig::from_json(r#"{ "forecast": { "horizon": 6 } }"#).unwrap();
    let report = WeatherPipeline::new(config).analyze(data).unwrap();
    assert_eq!(report.forecast.values.len(), 6);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("statistics.csv");
    report.statistics.write_csv(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("statistic,temperature,cloud_area_fraction,wind_speed"));
    assert_eq!(written.lines().count(), 8);

    let frame = report.results.to_dataframe().unwrap();
    assert_eq!(frame.height(), report.results.actual.len());
}
