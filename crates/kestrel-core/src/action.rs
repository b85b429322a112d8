use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::clock::ClockContext;
use crate::context::{Context, ContextError, get_context};

/// Per-frame work item. `update` returns `true` once the action is finished.
pub trait Action {
    fn update(&mut self, now_ms: u64) -> bool;
}

struct TimerAction {
    start_ms: u64,
    delay_ms: u64,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl Action for TimerAction {
    fn update(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.start_ms) > self.delay_ms {
            if let Some(f) = self.on_complete.take() {
                f();
            }
            return true;
        }
        false
    }
}

struct IntervalAction {
    interval_ms: u64,
    last_tick_ms: u64,
    on_tick: Box<dyn FnMut()>,
    running: Rc<Cell<bool>>,
}

impl Action for IntervalAction {
    fn update(&mut self, now_ms: u64) -> bool {
        if !self.running.get() {
            return true;
        }
        if now_ms.saturating_sub(self.last_tick_ms) >= self.interval_ms {
            self.last_tick_ms = now_ms;
            (self.on_tick)();
        }
        !self.running.get()
    }
}

/// Stops the interval it was returned for.
#[derive(Clone)]
pub struct IntervalHandle(Rc<Cell<bool>>);

impl IntervalHandle {
    pub fn stop(&self) {
        self.0.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.0.get()
    }
}

/// Timers and intervals driven by the frame clock.
///
/// Actions added while `update` runs become active at the end of that update.
pub struct ActionContext {
    clock: Rc<ClockContext>,
    actions: RefCell<Vec<Box<dyn Action>>>,
    pending: RefCell<Vec<Box<dyn Action>>>,
    epoch: Cell<u64>,
}

impl ActionContext {
    pub fn new(clock: Rc<ClockContext>) -> Self {
        Self {
            clock,
            actions: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            epoch: Cell::new(0),
        }
    }

    /// Runs `on_complete` once, on the first update more than `delay_ms` after now.
    pub fn timer(&self, delay_ms: u64, on_complete: impl FnOnce() + 'static) {
        self.add(Box::new(TimerAction {
            start_ms: self.clock.total_time_ms(),
            delay_ms,
            on_complete: Some(Box::new(on_complete)),
        }));
    }

    /// Runs `on_tick` on every update at least `interval_ms` after the previous tick.
    pub fn interval(&self, interval_ms: u64, on_tick: impl FnMut() + 'static) -> IntervalHandle {
        let running = Rc::new(Cell::new(true));
        self.add(Box::new(IntervalAction {
            interval_ms,
            last_tick_ms: self.clock.total_time_ms(),
            on_tick: Box::new(on_tick),
            running: running.clone(),
        }));
        IntervalHandle(running)
    }

    pub fn add(&self, action: Box<dyn Action>) {
        self.pending.borrow_mut().push(action);
    }

    pub fn update(&self) {
        if self.actions.borrow().is_empty() && self.pending.borrow().is_empty() {
            return;
        }

        let epoch = self.epoch.get();
        let now_ms = self.clock.total_time_ms();
        // taken out so callbacks can schedule more actions
        let mut active = std::mem::take(&mut *self.actions.borrow_mut());
        active.retain_mut(|action| !action.update(now_ms));

        if self.epoch.get() != epoch {
            // cleaned up from inside a callback
            return;
        }
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        active.extend(pending);
        *self.actions.borrow_mut() = active;
    }

    /// Active actions, not counting ones added since the last update.
    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Context for ActionContext {
    fn cleanup(&self) {
        log::info!("cleaning up ActionContext");
        self.epoch.set(self.epoch.get() + 1);
        self.actions.borrow_mut().clear();
        self.pending.borrow_mut().clear();
    }
}

pub fn use_timer(delay_ms: u64, on_complete: impl FnOnce() + 'static) -> Result<(), ContextError> {
    get_context::<ActionContext>()?.timer(delay_ms, on_complete);
    Ok(())
}

pub fn use_interval(
    interval_ms: u64,
    on_tick: impl FnMut() + 'static,
) -> Result<IntervalHandle, ContextError> {
    Ok(get_context::<ActionContext>()?.interval(interval_ms, on_tick))
}
