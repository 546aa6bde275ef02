use crate::error::{Error, Result};
use crate::pool::{Outcome, PoolCounters, Request, WorkerPool};
use des::random::{RandomIntervalSource, UniformSource, scaled};
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};

/// Final state of one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationReport {
    pub counters: PoolCounters,
    pub peak_busy: usize,
    /// Wall-clock time from the first arrival delay until the pool settled
    pub elapsed: Duration,
}

/// Paces a fixed number of arrivals into a worker pool
///
/// Arrivals are issued one after another from the calling thread; each is
/// preceded by an exponential delay with mean `1 / arrival_rate` time units.
pub struct SimulationDriver<U> {
    total_requests: usize,
    arrival_rate: f64,
    intervals: RandomIntervalSource<U>,
    time_unit: Duration,
}

impl<U: UniformSource> SimulationDriver<U> {
    pub fn new(
        total_requests: usize,
        arrival_rate: f64,
        intervals: RandomIntervalSource<U>,
        time_unit: Duration,
    ) -> Result<Self> {
        if !(arrival_rate.is_finite() && arrival_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "arrival rate must be positive, got {}",
                arrival_rate
            )));
        }
        Ok(SimulationDriver {
            total_requests,
            arrival_rate,
            intervals,
            time_unit,
        })
    }

    /// Issue every arrival, then wait until the pool has settled
    pub fn run(&mut self, pool: &WorkerPool) -> SimulationReport {
        let started = Instant::now();

        for id in 1..=self.total_requests {
            let delay = self.intervals.next(self.arrival_rate);
            thread::sleep(scaled(self.time_unit, delay));

            if pool.submit(Request { id }) == Outcome::Rejected {
                log::trace!("λ={:.3}: arrival {} lost", self.arrival_rate, id);
            }
        }

        let counters = pool.wait_for_settled(self.total_requests);
        let report = SimulationReport {
            counters,
            peak_busy: pool.peak_busy(),
            elapsed: started.elapsed(),
        };
        log::debug!(
            "λ={:.3}: {} submitted, {} admitted, {} rejected, peak {} busy, {:.2?}",
            self.arrival_rate,
            counters.submitted,
            counters.admitted,
            counters.rejected,
            report.peak_busy,
            report.elapsed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use des::random::FixedUniform;

    #[test]
    fn rejects_non_positive_rate() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let driver = SimulationDriver::new(
                5,
                rate,
                RandomIntervalSource::new(FixedUniform(0.0)),
                Duration::from_millis(1),
            );
            assert!(driver.is_err(), "rate {} accepted", rate);
        }
    }

    #[test]
    fn zero_requests_returns_immediately() {
        let pool = WorkerPool::new(5, 0.5, Duration::from_secs(10));
        let mut driver = SimulationDriver::new(
            0,
            1.0,
            RandomIntervalSource::new(FixedUniform(0.5)),
            Duration::from_secs(10),
        )
        .unwrap();

        let report = driver.run(&pool);

        assert_eq!(report.counters, PoolCounters::default());
        assert_eq!(report.peak_busy, 0);
        assert!(report.elapsed < Duration::from_secs(1));
    }

    #[test]
    fn paced_arrivals_take_at_least_their_delays() {
        // FixedUniform(0.5) gives ln 2 / 1.0 ≈ 0.693 units per arrival
        let unit = Duration::from_millis(20);
        let pool = WorkerPool::new(1, 10.0, unit);
        let mut driver =
            SimulationDriver::new(3, 1.0, RandomIntervalSource::new(FixedUniform(0.5)), unit)
                .unwrap();

        let report = driver.run(&pool);

        assert!(report.elapsed >= scaled(unit, 0.99 * 3.0 * std::f64::consts::LN_2));
        assert_eq!(report.counters.submitted, 3);
        // service (0.1 units) ends long before the next arrival
        assert_eq!(report.counters.admitted, 3);
    }
}
