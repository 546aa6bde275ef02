// Rate sweeps end to end, on sub-millisecond time units

use approx::assert_relative_eq;
use erlang_loss::theory::erlang_loss;
use erlang_loss::{ExperimentRunner, Metric, ModelConfig, ServiceTime, report};

fn quick_config() -> ModelConfig {
    ModelConfig {
        channels: 3,
        service_rate: 1.0,
        requests_per_point: 30,
        points: 4,
        arrival_rate_min: 0.5,
        arrival_rate_max: 4.0,
        time_unit_ms: 0.5,
        seed: 11,
        parallel: false,
        service_time: ServiceTime::Deterministic,
    }
}

#[test]
fn sweep_produces_one_point_per_rate_in_order() {
    let runner = ExperimentRunner::new(quick_config()).unwrap();
    let results = runner.run().unwrap();

    assert_eq!(results.points.len(), 4);
    assert_eq!(results.arrival_rates(), runner.arrival_rates());
    assert_relative_eq!(results.points[0].arrival_rate, 0.5);
    assert_relative_eq!(results.points[3].arrival_rate, 4.0);
    for pair in results.points.windows(2) {
        assert!(pair[0].arrival_rate < pair[1].arrival_rate);
    }
}

#[test]
fn theory_side_matches_calculator() {
    let results = ExperimentRunner::new(quick_config()).unwrap().run().unwrap();
    for point in &results.points {
        assert_eq!(point.theory, erlang_loss(point.arrival_rate, 1.0, 3));
    }
}

#[test]
fn practice_side_is_a_consistent_split_of_submissions() {
    let results = ExperimentRunner::new(quick_config()).unwrap().run().unwrap();
    for point in &results.points {
        let p = &point.practice;
        assert_relative_eq!(p.p0 + p.throughput_ratio, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.p_reject + p.throughput_ratio, 1.0, epsilon = 1e-12);
        assert!((0.0..=1.0).contains(&p.throughput_ratio));
        assert_relative_eq!(
            p.absolute_throughput,
            point.arrival_rate * p.throughput_ratio,
            epsilon = 1e-12
        );
        assert_relative_eq!(p.mean_busy_channels, p.absolute_throughput, epsilon = 1e-12);
    }
}

#[test]
fn every_point_starts_from_an_empty_pool() {
    let config = quick_config();
    let runner = ExperimentRunner::new(config.clone()).unwrap();

    for (index, rate) in runner.arrival_rates().into_iter().enumerate() {
        let report = runner.simulate(index, rate).unwrap();
        let c = report.counters;
        assert_eq!(c.submitted, config.requests_per_point, "point {}", index);
        assert_eq!(c.admitted + c.rejected, config.requests_per_point);
        assert_eq!(c.completed, c.admitted);
        assert!(report.peak_busy <= config.channels);
    }

    // the same point run twice does not see the first run's counters
    let again = runner.simulate(0, 0.5).unwrap();
    assert_eq!(again.counters.submitted, config.requests_per_point);
}

#[test]
fn parallel_sweep_keeps_order_and_shape() {
    let config = ModelConfig {
        parallel: true,
        service_time: ServiceTime::Exponential,
        ..quick_config()
    };
    let results = ExperimentRunner::new(config.clone()).unwrap().run().unwrap();

    assert_eq!(results.points.len(), config.points);
    assert_eq!(results.arrival_rates(), ExperimentRunner::new(config).unwrap().arrival_rates());
    for point in &results.points {
        assert!(!point.practice.has_undefined());
    }
}

#[test]
fn sweep_without_requests_yields_undefined_practice() {
    let config = ModelConfig {
        requests_per_point: 0,
        ..quick_config()
    };
    let results = ExperimentRunner::new(config).unwrap().run().unwrap();

    assert_eq!(results.points.len(), 4);
    for point in &results.points {
        assert!(point.practice.has_undefined());
        assert!(!point.theory.has_undefined());
    }

    let mut table = Vec::new();
    report::write_table(&results, &mut table).unwrap();
    assert!(String::from_utf8(table).unwrap().contains("NaN"));
}

#[test]
fn heavy_load_point_loses_requests() {
    // one channel held for 1 unit, arrivals at 40 per unit
    let config = ModelConfig {
        channels: 1,
        service_rate: 1.0,
        requests_per_point: 40,
        points: 1,
        arrival_rate_min: 40.0,
        arrival_rate_max: 40.0,
        time_unit_ms: 20.0,
        ..quick_config()
    };
    let results = ExperimentRunner::new(config).unwrap().run().unwrap();
    let point = &results.points[0];

    assert!(point.practice.p_reject > 0.5, "{:?}", point.practice);
    assert!(point.theory.p_reject > 0.9);
}

#[test]
fn series_pair_theory_with_practice() {
    let results = ExperimentRunner::new(quick_config()).unwrap().run().unwrap();
    for metric in Metric::ALL {
        let (theory, practice) = results.series(metric);
        assert_eq!(theory.len(), results.points.len());
        assert_eq!(practice.len(), results.points.len());
        assert_eq!(theory[0], metric.value(&results.points[0].theory));
        assert_eq!(practice[0], metric.value(&results.points[0].practice));
    }
}

#[test]
fn reports_and_charts_written_from_one_sweep() {
    let results = ExperimentRunner::new(quick_config()).unwrap().run().unwrap();
    let dir = tempfile::tempdir().unwrap();

    report::write_table_file(&results, dir.path().join("data.txt")).unwrap();
    report::write_csv(&results, dir.path().join("metrics.csv")).unwrap();
    report::write_json(&results, dir.path().join("metrics.json")).unwrap();
    let charts = erlang_loss::plot::render_all(&results, dir.path()).unwrap();

    let table = std::fs::read_to_string(dir.path().join("data.txt")).unwrap();
    assert_eq!(table.lines().count(), 1 + results.points.len());
    assert_eq!(charts.len(), 5);
    assert!(charts.iter().all(|p| p.exists()));
}
