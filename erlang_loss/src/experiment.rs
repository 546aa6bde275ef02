//! Arrival-rate sweep pairing closed-form and simulated metrics

use crate::config::ModelConfig;
use crate::driver::{SimulationDriver, SimulationReport};
use crate::error::{Error, Result};
use crate::pool::{PoolCounters, WorkerPool};
use crate::theory::{LossMetrics, erlang_loss};
use des::parallel::{ParallelRunner, log_progress_reporter};
use des::random::RandomIntervalSource;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

/// The five compared characteristics, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    IdleProbability,
    RejectProbability,
    ThroughputRatio,
    AbsoluteThroughput,
    MeanBusyChannels,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::IdleProbability,
        Metric::RejectProbability,
        Metric::ThroughputRatio,
        Metric::AbsoluteThroughput,
        Metric::MeanBusyChannels,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Metric::IdleProbability => "Probability of an idle system",
            Metric::RejectProbability => "Probability of rejection",
            Metric::ThroughputRatio => "Relative throughput",
            Metric::AbsoluteThroughput => "Absolute throughput",
            Metric::MeanBusyChannels => "Mean number of busy channels",
        }
    }

    /// Short column label used in tables
    pub fn label(&self) -> &'static str {
        match self {
            Metric::IdleProbability => "P0",
            Metric::RejectProbability => "Pn",
            Metric::ThroughputRatio => "Q",
            Metric::AbsoluteThroughput => "A",
            Metric::MeanBusyChannels => "k",
        }
    }

    /// Decimal places in the text table
    pub fn decimals(&self) -> usize {
        match self {
            Metric::MeanBusyChannels => 2,
            _ => 4,
        }
    }

    pub fn value(&self, metrics: &LossMetrics) -> f64 {
        match self {
            Metric::IdleProbability => metrics.p0,
            Metric::RejectProbability => metrics.p_reject,
            Metric::ThroughputRatio => metrics.throughput_ratio,
            Metric::AbsoluteThroughput => metrics.absolute_throughput,
            Metric::MeanBusyChannels => metrics.mean_busy_channels,
        }
    }
}

/// Theory and simulation side by side at one arrival rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricPoint {
    pub arrival_rate: f64,
    pub theory: LossMetrics,
    pub practice: LossMetrics,
}

/// Metrics observed in a simulation run
///
/// `submitted / λ` stands in for the elapsed time when computing the absolute
/// throughput. With nothing submitted every metric is NaN.
pub fn practice_metrics(
    counters: &PoolCounters,
    arrival_rate: f64,
    service_rate: f64,
) -> LossMetrics {
    if counters.submitted == 0 {
        return LossMetrics::undefined();
    }
    let submitted = counters.submitted as f64;
    let admitted = counters.admitted as f64;
    let rejected = counters.rejected as f64;
    let absolute_throughput = admitted / (submitted / arrival_rate);
    LossMetrics {
        p0: 1.0 - admitted / submitted,
        p_reject: rejected / submitted,
        throughput_ratio: admitted / submitted,
        absolute_throughput,
        mean_busy_channels: absolute_throughput / service_rate,
    }
}

/// Outcome of a full sweep, in sweep order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResults {
    pub channels: usize,
    pub service_rate: f64,
    pub requests_per_point: usize,
    pub points: Vec<MetricPoint>,
}

impl SweepResults {
    pub fn arrival_rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.arrival_rate).collect()
    }

    /// `(theory, practice)` series of one metric
    pub fn series(&self, metric: Metric) -> (Vec<f64>, Vec<f64>) {
        self.points
            .iter()
            .map(|p| (metric.value(&p.theory), metric.value(&p.practice)))
            .unzip()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// `points` equally spaced values covering `[min, max]`
pub fn sweep_rates(min: f64, max: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![min],
        _ => (0..points)
            .map(|i| min + (max - min) * i as f64 / (points - 1) as f64)
            .collect(),
    }
}

pub struct ExperimentRunner {
    config: ModelConfig,
}

impl ExperimentRunner {
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(ExperimentRunner { config })
    }

    pub fn arrival_rates(&self) -> Vec<f64> {
        sweep_rates(
            self.config.arrival_rate_min,
            self.config.arrival_rate_max,
            self.config.points,
        )
    }

    /// Simulate one arrival rate on a fresh pool seeded with `seed + index`
    pub fn simulate(&self, index: usize, arrival_rate: f64) -> Result<SimulationReport> {
        let config = &self.config;
        let seed = config.seed.wrapping_add(index as u64);
        let pool = WorkerPool::with_service_time(
            config.channels,
            config.service_rate,
            config.time_unit(),
            config.service_time,
            // keep service draws independent of the arrival stream
            seed ^ 0x9e37_79b9_7f4a_7c15,
        );
        let intervals = RandomIntervalSource::new(StdRng::seed_from_u64(seed));
        let mut driver = SimulationDriver::new(
            config.requests_per_point,
            arrival_rate,
            intervals,
            config.time_unit(),
        )?;
        Ok(driver.run(&pool))
    }

    pub fn run_point(&self, index: usize, arrival_rate: f64) -> Result<MetricPoint> {
        let config = &self.config;
        let theory = erlang_loss(arrival_rate, config.service_rate, config.channels);
        let report = self.simulate(index, arrival_rate)?;
        let practice = practice_metrics(&report.counters, arrival_rate, config.service_rate);

        if practice.has_undefined() {
            log::warn!(
                "λ={:.2}: no requests submitted, simulated metrics undefined",
                arrival_rate
            );
        }
        log::info!(
            "λ={:.2}: Pn theory {:.4} / simulated {:.4} ({} of {} rejected)",
            arrival_rate,
            theory.p_reject,
            practice.p_reject,
            report.counters.rejected,
            report.counters.submitted
        );

        Ok(MetricPoint {
            arrival_rate,
            theory,
            practice,
        })
    }

    /// Run every sweep point, sequentially or in parallel per the config
    pub fn run(&self) -> Result<SweepResults> {
        let rates = self.arrival_rates();
        log::info!(
            "sweeping {} arrival rates in [{}, {}] with n={}, μ={}, {} requests each",
            rates.len(),
            self.config.arrival_rate_min,
            self.config.arrival_rate_max,
            self.config.channels,
            self.config.service_rate,
            self.config.requests_per_point
        );

        let points = if self.config.parallel {
            ParallelRunner::new(rates.len(), |index| self.run_point(index, rates[index]))
                .progress(log_progress_reporter(1))
                .run()
                .into_iter()
                .map(|outcome| outcome.map_err(Error::from).and_then(|point| point))
                .collect::<Result<Vec<_>>>()?
        } else {
            rates
                .iter()
                .enumerate()
                .map(|(index, &rate)| self.run_point(index, rate))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(SweepResults {
            channels: self.config.channels,
            service_rate: self.config.service_rate,
            requests_per_point: self.config.requests_per_point,
            points,
        })
    }
}
