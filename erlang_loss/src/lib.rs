//! M/M/n/n loss system: Erlang-B theory versus a threaded simulation
//!
//! Each point of an arrival-rate sweep is computed twice. [`theory`] gives the
//! closed-form Erlang-loss characteristics; [`driver`] paces exponential
//! arrivals into a fresh [`pool::WorkerPool`] whose slots are served on their
//! own threads, and the counters it leaves behind give the simulated
//! characteristics. [`experiment`] pairs them up per arrival rate.
//!
//! ```no_run
//! use erlang_loss::{ExperimentRunner, ModelConfig};
//!
//! let runner = ExperimentRunner::new(ModelConfig::baseline()).unwrap();
//! let results = runner.run().unwrap();
//! for point in &results.points {
//!     let (theory, simulated) = (point.theory.p_reject, point.practice.p_reject);
//!     println!("{:.2}: {:.4} vs {:.4}", point.arrival_rate, theory, simulated);
//! }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod experiment;
pub mod plot;
pub mod pool;
pub mod report;
pub mod theory;

pub use config::{ModelConfig, ServiceTime};
pub use error::{Error, Result};
pub use experiment::{ExperimentRunner, Metric, MetricPoint, SweepResults};
pub use pool::{Outcome, PoolCounters, Request, WorkerPool};
pub use theory::LossMetrics;
