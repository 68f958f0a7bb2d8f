use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use frostcast::{remove_outliers, ForecastConfig, ForecastEngine, ObservationTable};

fn hourly_table(hours: i64) -> ObservationTable {
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let mut table = ObservationTable::new(["temperature", "cloud_area_fraction", "wind_speed"]).unwrap();
    for i in 0..hours {
        let x = i as f64;
        let spike = if i % 500 == 0 { 40.0 } else { 0.0 };
        table
            .push_row(
                start + Duration::hours(i),
                "SN18700",
                vec![Some((x / 12.0).sin() * 6.0 + spike), Some((i % 9) as f64), Some(3.0 + (x / 7.0).cos())],
            )
            .unwrap();
    }
    table
}

fn bench_pipeline_stages(c: &mut Criterion) {
    let year = hourly_table(24 * 365);

    c.bench_function("remove_outliers_year", |b| {
        b.iter(|| remove_outliers(black_box(&year), "temperature", 3.0))
    });
    c.bench_function("train_and_forecast_year", |b| {
        b.iter(|| {
            let mut engine = ForecastEngine::new(black_box(year.clone()), ForecastConfig::default());
            engine.prepare_data().unwrap();
            engine.split_data(0.2).unwrap();
            engine.train_model().unwrap();
            engine.forecast(24).unwrap()
        })
    });
}

criterion_group!(benches, bench_pipeline_stages);
criterion_main!(benches);
