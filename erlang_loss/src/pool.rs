//! Bounded pool of service channels with immediate loss on overflow
//!
//! All slot state and counters live behind one mutex. An admitted request is
//! served on its own thread: the thread sleeps for the service time without
//! holding the lock, then re-locks to free its slot. A request that finds
//! every slot busy is rejected on the spot; nothing ever queues.

use crate::config::ServiceTime;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};
use serde::Serialize;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// An arriving request; only its id survives into the logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub id: usize,
}

/// Result of offering a request to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Admitted { slot: usize },
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolCounters {
    pub submitted: usize,
    pub admitted: usize,
    pub rejected: usize,
    /// Admitted requests whose service has finished
    pub completed: usize,
}

impl PoolCounters {
    /// Every submission has either been rejected or served to completion
    pub fn is_settled(&self) -> bool {
        self.completed + self.rejected >= self.submitted
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    occupied: bool,
}

struct PoolState {
    slots: Vec<Slot>,
    counters: PoolCounters,
    busy: usize,
    peak_busy: usize,
    service_rng: StdRng,
}

type ServiceTask = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    state: Mutex<PoolState>,
    released: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // no code panics while holding the guard, so the state is consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed-capacity set of service slots
///
/// Cloning yields another handle to the same pool.
#[derive(Clone)]
pub struct WorkerPool {
    shared: Arc<Shared>,
    capacity: usize,
    service_rate: f64,
    service_time: ServiceTime,
    time_unit: Duration,
}

impl WorkerPool {
    /// Create a pool with deterministic service times of `1 / service_rate`
    ///
    /// `time_unit` is the wall-clock length of one model time unit.
    pub fn new(capacity: usize, service_rate: f64, time_unit: Duration) -> Self {
        WorkerPool::with_service_time(
            capacity,
            service_rate,
            time_unit,
            ServiceTime::Deterministic,
            0,
        )
    }

    /// Create a pool with the given service-time model
    ///
    /// `seed` drives exponential service draws and is unused otherwise.
    pub fn with_service_time(
        capacity: usize,
        service_rate: f64,
        time_unit: Duration,
        service_time: ServiceTime,
        seed: u64,
    ) -> Self {
        let state = PoolState {
            slots: vec![Slot::default(); capacity],
            counters: PoolCounters::default(),
            busy: 0,
            peak_busy: 0,
            service_rng: StdRng::seed_from_u64(seed),
        };
        WorkerPool {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                released: Condvar::new(),
            }),
            capacity,
            service_rate,
            service_time,
            time_unit,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Offer a request; admitted requests start service immediately
    ///
    /// A request whose service thread cannot be started is counted as
    /// rejected and its slot stays free.
    pub fn submit(&self, request: Request) -> Outcome {
        self.submit_with(request, |name, task| {
            thread::Builder::new().name(name).spawn(task).map(drop)
        })
    }

    fn submit_with<S>(&self, request: Request, spawn: S) -> Outcome
    where
        S: FnOnce(String, ServiceTask) -> io::Result<()>,
    {
        let mut state = self.shared.lock();
        state.counters.submitted += 1;

        let Some(slot) = state.slots.iter().position(|s| !s.occupied) else {
            state.counters.rejected += 1;
            log::trace!("request {} rejected, all {} slots busy", request.id, self.capacity);
            return Outcome::Rejected;
        };

        let units = self.draw_service_units(&mut state.service_rng);
        let hold = des::random::scaled(self.time_unit, units);
        let shared = Arc::clone(&self.shared);
        let task: ServiceTask = Box::new(move || {
            thread::sleep(hold);
            let mut state = shared.lock();
            state.slots[slot].occupied = false;
            state.busy -= 1;
            state.counters.completed += 1;
            log::trace!("request {} released slot {}", request.id, slot);
            shared.released.notify_all();
        });

        // the lock is held until the thread exists, so a failed spawn leaves
        // no trace beyond the rejection
        if let Err(e) = spawn(format!("service-{}", slot), task) {
            state.counters.rejected += 1;
            log::warn!("request {} rejected, cannot start service thread: {}", request.id, e);
            self.shared.released.notify_all();
            return Outcome::Rejected;
        }

        state.slots[slot].occupied = true;
        state.counters.admitted += 1;
        state.busy += 1;
        state.peak_busy = state.peak_busy.max(state.busy);
        log::trace!("request {} admitted to slot {} for {:.3} units", request.id, slot, units);
        Outcome::Admitted { slot }
    }

    fn draw_service_units(&self, rng: &mut StdRng) -> f64 {
        match self.service_time {
            ServiceTime::Deterministic => 1.0 / self.service_rate,
            ServiceTime::Exponential => match Exp::new(self.service_rate) {
                Ok(exp) => exp.sample(rng),
                Err(_) => 1.0 / self.service_rate,
            },
        }
    }

    pub fn counters(&self) -> PoolCounters {
        self.shared.lock().counters
    }

    /// Slots occupied right now
    pub fn busy(&self) -> usize {
        self.shared.lock().busy
    }

    /// Highest number of simultaneously occupied slots so far
    pub fn peak_busy(&self) -> usize {
        self.shared.lock().peak_busy
    }

    /// Block until `expected` requests have been submitted and each was
    /// rejected or has finished service; returns the counters at that moment
    pub fn wait_for_settled(&self, expected: usize) -> PoolCounters {
        let state = self.shared.lock();
        let state = self
            .shared
            .released
            .wait_while(state, |s| {
                s.counters.submitted < expected || !s.counters.is_settled()
            })
            .unwrap_or_else(PoisonError::into_inner);
        state.counters
    }
}
