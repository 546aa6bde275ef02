use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Longest mean service time or arrival gap a sweep may ask for: one day
const MAX_MEAN_WAIT_MS: f64 = 86_400_000.0;

/// How long an admitted request occupies its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTime {
    /// Every request holds its slot for exactly `1 / service_rate`
    #[default]
    Deterministic,
    /// Holding times drawn from `Exp(service_rate)`
    Exponential,
}

/// Parameters of one rate sweep
///
/// Every field is optional in TOML; missing fields take the baseline value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of service channels (n)
    pub channels: usize,
    /// Service intensity of one channel (μ)
    pub service_rate: f64,
    /// Arrivals simulated at each sweep point
    pub requests_per_point: usize,
    /// Number of equally spaced arrival rates
    pub points: usize,
    /// Lowest arrival rate of the sweep (λ_min)
    pub arrival_rate_min: f64,
    /// Highest arrival rate of the sweep (λ_max)
    pub arrival_rate_max: f64,
    /// Wall-clock milliseconds per model time unit
    pub time_unit_ms: f64,
    /// Base seed; point `i` is seeded with `seed + i`
    pub seed: u64,
    /// Run sweep points concurrently
    pub parallel: bool,
    pub service_time: ServiceTime,
}

impl ModelConfig {
    /// Five channels, μ = 0.5, 20 requests at each of 10 rates in [0.1, 2.0]
    pub fn baseline() -> Self {
        ModelConfig {
            channels: 5,
            service_rate: 0.5,
            requests_per_point: 20,
            points: 10,
            arrival_rate_min: 0.1,
            arrival_rate_max: 2.0,
            time_unit_ms: 1000.0,
            seed: 42,
            parallel: false,
            service_time: ServiceTime::Deterministic,
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ModelConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(invalid("channels must be at least 1"));
        }
        if !(self.service_rate.is_finite() && self.service_rate > 0.0) {
            return Err(invalid(format!(
                "service_rate must be positive, got {}",
                self.service_rate
            )));
        }
        if self.points == 0 {
            return Err(invalid("points must be at least 1"));
        }
        for (name, rate) in [
            ("arrival_rate_min", self.arrival_rate_min),
            ("arrival_rate_max", self.arrival_rate_max),
        ] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(invalid(format!("{} must be positive, got {}", name, rate)));
            }
        }
        if self.arrival_rate_min > self.arrival_rate_max {
            return Err(invalid(format!(
                "arrival_rate_min ({}) exceeds arrival_rate_max ({})",
                self.arrival_rate_min, self.arrival_rate_max
            )));
        }
        if !(self.time_unit_ms.is_finite() && self.time_unit_ms >= 0.0) {
            return Err(invalid(format!(
                "time_unit_ms must be non-negative, got {}",
                self.time_unit_ms
            )));
        }
        // slowest rate of each kind sets the longest mean sleep
        for (name, rate) in [
            ("service_rate", self.service_rate),
            ("arrival_rate_min", self.arrival_rate_min),
        ] {
            let mean_wait_ms = self.time_unit_ms / rate;
            if mean_wait_ms > MAX_MEAN_WAIT_MS {
                return Err(invalid(format!(
                    "{} = {} with time_unit_ms = {} means waits of {} ms (limit {} ms)",
                    name, rate, self.time_unit_ms, mean_wait_ms, MAX_MEAN_WAIT_MS
                )));
            }
        }
        Ok(())
    }

    /// Wall-clock length of one model time unit
    pub fn time_unit(&self) -> Duration {
        des::random::scaled(Duration::from_millis(1), self.time_unit_ms)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::baseline()
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_valid() {
        assert!(ModelConfig::baseline().validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_baseline() {
        let config = ModelConfig::from_toml_str("channels = 3\nseed = 7\n").unwrap();
        assert_eq!(config.channels, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.service_rate, 0.5);
        assert_eq!(config.points, 10);
        assert_eq!(config.service_time, ServiceTime::Deterministic);
    }

    #[test]
    fn service_time_parses_lowercase() {
        let config = ModelConfig::from_toml_str("service_time = \"exponential\"").unwrap();
        assert_eq!(config.service_time, ServiceTime::Exponential);
    }

    #[test]
    fn unknown_service_time_is_a_parse_error() {
        let err = ModelConfig::from_toml_str("service_time = \"priority\"").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn rejects_zero_channels() {
        let config = ModelConfig {
            channels: 0,
            ..ModelConfig::baseline()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_inverted_rate_range() {
        let config = ModelConfig {
            arrival_rate_min: 3.0,
            arrival_rate_max: 1.0,
            ..ModelConfig::baseline()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_non_positive_rates() {
        for config in [
            ModelConfig {
                service_rate: 0.0,
                ..ModelConfig::baseline()
            },
            ModelConfig {
                arrival_rate_min: -0.1,
                ..ModelConfig::baseline()
            },
            ModelConfig {
                arrival_rate_max: f64::NAN,
                ..ModelConfig::baseline()
            },
        ] {
            assert!(config.validate().is_err(), "{:?} should be invalid", config);
        }
    }

    #[test]
    fn rejects_zero_points_and_negative_time_unit() {
        let no_points = ModelConfig {
            points: 0,
            ..ModelConfig::baseline()
        };
        let negative_unit = ModelConfig {
            time_unit_ms: -1.0,
            ..ModelConfig::baseline()
        };
        assert!(no_points.validate().is_err());
        assert!(negative_unit.validate().is_err());
    }

    #[test]
    fn rejects_rates_too_slow_for_the_time_unit() {
        let slow_service = ModelConfig {
            service_rate: 1e-12,
            requests_per_point: 1,
            time_unit_ms: 1.0,
            ..ModelConfig::baseline()
        };
        let slow_arrivals = ModelConfig {
            arrival_rate_min: 1e-9,
            ..ModelConfig::baseline()
        };
        assert!(matches!(slow_service.validate(), Err(Error::InvalidConfig(_))));
        assert!(matches!(slow_arrivals.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn slow_rates_are_fine_on_a_zero_time_unit() {
        let config = ModelConfig {
            service_rate: 1e-12,
            time_unit_ms: 0.0,
            ..ModelConfig::baseline()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn time_unit_converts_milliseconds() {
        let config = ModelConfig {
            time_unit_ms: 2.5,
            ..ModelConfig::baseline()
        };
        assert_eq!(config.time_unit(), Duration::from_micros(2500));
        assert_eq!(ModelConfig::baseline().time_unit(), Duration::from_secs(1));
    }
}
