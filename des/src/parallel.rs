//! Parallel execution of independent scenarios
//!
//! A scenario is any closure `Fn(usize) -> R` that builds and runs one
//! self-contained simulation for the given scenario id. Scenarios share no
//! mutable state, so they can run on separate rayon workers while the results
//! still come back in scenario id order.
//!
//! # Example: sweeping a parameter
//!
//! ```rust
//! use des::parallel::{ParallelRunner, log_progress_reporter};
//!
//! let rates = [0.5, 1.0, 1.5, 2.0];
//! let results = ParallelRunner::new(rates.len(), |id| rates[id] * 10.0)
//!     .progress(log_progress_reporter(2))
//!     .num_threads(2)
//!     .run();
//!
//! assert_eq!(results.len(), 4);
//! assert_eq!(*results[3].as_ref().unwrap(), 20.0);
//! ```
//!
//! # Determinism
//!
//! Results are reproducible when:
//! 1. The scenario closure derives its seed from `scenario_id`
//! 2. Models draw only from their own seeded RNGs (e.g. `StdRng::seed_from_u64(seed)`)
//! 3. No mutable state is shared across scenarios
//!
//! # Error Handling
//!
//! A panic inside one scenario is caught and returned as `Err(ScenarioPanic)`
//! in that scenario's slot. The other scenarios continue.

use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// A scenario panicked instead of returning a result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scenario {scenario_id} panicked: {message}")]
pub struct ScenarioPanic {
    pub scenario_id: usize,
    pub message: String,
}

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Executes independent scenarios in parallel
///
/// The scenario closure must be `Send + Sync` since rayon calls it from
/// several worker threads at once.
pub struct ParallelRunner<R, F>
where
    F: Fn(usize) -> R + Send + Sync,
    R: Send,
{
    num_scenarios: usize,
    scenario: F,
    num_threads: Option<usize>,
    progress_callback: Option<ProgressCallback>,
}

impl<R, F> ParallelRunner<R, F>
where
    F: Fn(usize) -> R + Send + Sync,
    R: Send,
{
    /// Create a runner for `num_scenarios` invocations of `scenario`
    pub fn new(num_scenarios: usize, scenario: F) -> Self {
        ParallelRunner {
            num_scenarios,
            scenario,
            num_threads: None,
            progress_callback: None,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set progress callback, called with `(completed, total)` after each scenario
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Execute all scenarios and return their results in scenario id order
    pub fn run(self) -> Vec<Result<R, ScenarioPanic>> {
        let progress_counter = AtomicUsize::new(0);

        let pool = self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| log::warn!("falling back to the global rayon pool: {}", e))
                .ok()
        });

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        (self.scenario)(scenario_id)
                    }));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_scenarios);
                    }

                    result.map_err(|panic| ScenarioPanic {
                        scenario_id,
                        message: panic_message(&*panic),
                    })
                })
                .collect()
        };

        match pool {
            Some(pool) => pool.install(execute),
            None => execute(),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run scenarios in parallel on the global pool
pub fn run_parallel<R, F>(num_scenarios: usize, scenario: F) -> Vec<Result<R, ScenarioPanic>>
where
    F: Fn(usize) -> R + Send + Sync,
    R: Send,
{
    ParallelRunner::new(num_scenarios, scenario).run()
}

/// Progress callback that logs every `interval` completed scenarios
///
/// The final scenario is always reported.
pub fn log_progress_reporter(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            log::info!("completed {}/{} scenarios", completed, total);
        }
    }
}
