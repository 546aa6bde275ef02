//! Closed-form metrics of the M/M/n/n loss system
//!
//! With traffic intensity `ρ = λ/μ` and `n` channels the stationary state
//! probabilities are `p_k = (ρ^k / k!) p0`, and a request is lost exactly when
//! it arrives in state `n` (Erlang's B formula).

use serde::Serialize;

/// The five operating characteristics compared between theory and simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LossMetrics {
    /// Probability that every channel is idle
    pub p0: f64,
    /// Probability that an arriving request is rejected
    pub p_reject: f64,
    /// Relative throughput: share of requests that get served
    pub throughput_ratio: f64,
    /// Absolute throughput: served requests per time unit
    pub absolute_throughput: f64,
    /// Mean number of busy channels
    pub mean_busy_channels: f64,
}

impl LossMetrics {
    pub fn undefined() -> Self {
        LossMetrics {
            p0: f64::NAN,
            p_reject: f64::NAN,
            throughput_ratio: f64::NAN,
            absolute_throughput: f64::NAN,
            mean_busy_channels: f64::NAN,
        }
    }

    pub fn has_undefined(&self) -> bool {
        [
            self.p0,
            self.p_reject,
            self.throughput_ratio,
            self.absolute_throughput,
            self.mean_busy_channels,
        ]
        .iter()
        .any(|v| v.is_nan())
    }
}

pub fn traffic_intensity(arrival_rate: f64, service_rate: f64) -> f64 {
    arrival_rate / service_rate
}

pub fn factorial(k: usize) -> f64 {
    (2..=k).fold(1.0, |acc, i| acc * i as f64)
}

fn erlang_term(rho: f64, k: usize) -> f64 {
    rho.powi(k as i32) / factorial(k)
}

/// Probability that all `channels` are idle
pub fn idle_probability(rho: f64, channels: usize) -> f64 {
    let sum: f64 = (0..=channels).map(|k| erlang_term(rho, k)).sum();
    1.0 / sum
}

/// Stationary probabilities `p_0 ..= p_n`
pub fn state_probabilities(rho: f64, channels: usize) -> Vec<f64> {
    let p0 = idle_probability(rho, channels);
    (0..=channels).map(|k| erlang_term(rho, k) * p0).collect()
}

/// Erlang-loss metrics for arrival rate λ, service rate μ and n channels
pub fn erlang_loss(arrival_rate: f64, service_rate: f64, channels: usize) -> LossMetrics {
    let rho = traffic_intensity(arrival_rate, service_rate);
    let p0 = idle_probability(rho, channels);
    let p_reject = erlang_term(rho, channels) * p0;
    let throughput_ratio = 1.0 - p_reject;
    let absolute_throughput = arrival_rate * throughput_ratio;
    LossMetrics {
        p0,
        p_reject,
        throughput_ratio,
        absolute_throughput,
        mean_busy_channels: absolute_throughput / service_rate,
    }
}
