use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use web_time::Instant;

use crate::context::{Context, ContextError, get_context};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock you can drive deterministically. Clones share the same time.
#[derive(Clone)]
pub struct TestClock {
    t: Arc<Mutex<Instant>>,
}

impl TestClock {
    pub fn new(t: Instant) -> Self {
        Self {
            t: Arc::new(Mutex::new(t)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.t.lock() += by;
    }

    pub fn set(&self, t: Instant) {
        *self.t.lock() = t;
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        *self.t.lock()
    }
}

static CLOCK: RwLock<Option<Arc<dyn Clock>>> = parking_lot::const_rwlock(None);

/// Install the process-wide clock. Later calls replace it.
pub fn set_clock(clock: Arc<dyn Clock>) {
    *CLOCK.write() = Some(clock);
}

/// The installed clock, or the system clock if none was installed.
pub fn clock() -> Arc<dyn Clock> {
    CLOCK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(SystemClock))
}

pub fn now() -> Instant {
    match CLOCK.read().as_ref() {
        Some(c) => c.now(),
        None => Instant::now(),
    }
}

/// Frame timing shared with game code.
///
/// The game loop calls [`ClockContext::tick`] once per frame; totals are
/// measured from the context's start, deltas from the previous tick.
pub struct ClockContext {
    source: Arc<dyn Clock>,
    start: Cell<Instant>,
    last: Cell<Instant>,
    total_us: Cell<u64>,
    delta_us: Cell<u64>,
}

impl Default for ClockContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockContext {
    /// Uses the process-wide clock.
    pub fn new() -> Self {
        Self::with_clock(clock())
    }

    pub fn with_clock(source: Arc<dyn Clock>) -> Self {
        let start = source.now();
        Self {
            source,
            start: Cell::new(start),
            last: Cell::new(start),
            total_us: Cell::new(0),
            delta_us: Cell::new(0),
        }
    }

    pub fn tick(&self) {
        let now = self.source.now();
        let total = now.saturating_duration_since(self.start.get());
        let delta = now.saturating_duration_since(self.last.get());
        self.total_us.set(total.as_micros() as u64);
        self.delta_us.set(delta.as_micros() as u64);
        self.last.set(now);
    }

    /// Microseconds since the start, sampled now rather than at the last tick.
    pub fn elapsed_us(&self) -> u64 {
        self.source
            .now()
            .saturating_duration_since(self.start.get())
            .as_micros() as u64
    }

    pub fn total_time_us(&self) -> u64 {
        self.total_us.get()
    }

    pub fn total_time_ms(&self) -> u64 {
        self.total_us.get() / 1_000
    }

    pub fn total_time_sec(&self) -> f64 {
        self.total_us.get() as f64 / 1_000_000.0
    }

    pub fn delta_time_us(&self) -> u64 {
        self.delta_us.get()
    }

    pub fn delta_time_ms(&self) -> u64 {
        self.delta_us.get() / 1_000
    }

    pub fn delta_time_sec(&self) -> f64 {
        self.delta_us.get() as f64 / 1_000_000.0
    }
}

impl Context for ClockContext {
    fn cleanup(&self) {
        let now = self.source.now();
        self.start.set(now);
        self.last.set(now);
        self.total_us.set(0);
        self.delta_us.set(0);
    }
}

/// Milliseconds elapsed between `time_ms` and now, on the registered clock.
pub fn time_since_ms(time_ms: u64) -> Result<i64, ContextError> {
    let clock = get_context::<ClockContext>()?;
    Ok((clock.elapsed_us() / 1_000) as i64 - time_ms as i64)
}

pub fn time_since_sec(time_sec: f64) -> Result<f64, ContextError> {
    let clock = get_context::<ClockContext>()?;
    Ok(clock.elapsed_us() as f64 / 1_000_000.0 - time_sec)
}
