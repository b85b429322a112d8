use std::cell::Cell;
use std::rc::Rc;

use web_time::Instant;

use kestrel_core::{
    ActionContext, ClockContext, Context, ContextRegistry, EffectContext, get_context,
    set_max_cascade_depth,
};

use crate::config::{ConfigError, LoopConfig};

/// Lets game code stop the loop and read the frame counter.
pub struct LoopControl {
    running: Cell<bool>,
    frame: Cell<u64>,
}

impl Default for LoopControl {
    fn default() -> Self {
        Self {
            running: Cell::new(true),
            frame: Cell::new(0),
        }
    }
}

impl LoopControl {
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame.get()
    }
}

impl Context for LoopControl {
    fn cleanup(&self) {
        self.running.set(false);
    }
}

/// Drives `update` once per frame at the configured rate.
pub struct GameLoop {
    config: LoopConfig,
    clock: Rc<ClockContext>,
    actions: Rc<ActionContext>,
    control: Rc<LoopControl>,
}

// Cleans up every registered context when the loop exits, panics included.
struct ShutdownGuard;

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        ContextRegistry::cleanup_all();
    }
}

impl GameLoop {
    /// Registers the clock, action and effect contexts unless they already are,
    /// and a fresh [`LoopControl`].
    pub fn new(config: LoopConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        set_max_cascade_depth(config.max_cascade_depth);

        let clock = get_context::<ClockContext>()
            .unwrap_or_else(|_| ContextRegistry::register(ClockContext::new()));
        let actions = get_context::<ActionContext>()
            .unwrap_or_else(|_| ContextRegistry::register(ActionContext::new(clock.clone())));
        if !ContextRegistry::is_registered::<EffectContext>() {
            ContextRegistry::register(EffectContext::new());
        }
        let control = ContextRegistry::register(LoopControl::default());

        Ok(Self {
            config,
            clock,
            actions,
            control,
        })
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn control(&self) -> &LoopControl {
        &self.control
    }

    /// Runs a single frame without pacing.
    pub fn step(&self, update: &mut impl FnMut(f64)) {
        self.clock.tick();
        self.actions.update();
        update(self.clock.delta_time_sec());
        self.control.frame.set(self.control.frame.get() + 1);
    }

    fn should_continue(&self) -> bool {
        self.control.is_running()
            && self
                .config
                .max_frames
                .is_none_or(|max| self.control.frame() < max)
    }

    /// Runs frames until [`LoopControl::stop`] or `max_frames`, sleeping out the
    /// rest of each frame. All registered contexts are cleaned up on exit.
    pub fn run(&self, mut update: impl FnMut(f64)) -> anyhow::Result<()> {
        let target = self.config.frame_duration();
        log::info!("game loop started at {} fps", self.config.target_fps);

        let _shutdown = ShutdownGuard;
        while self.should_continue() {
            // paced on wall time even when game time comes from a test clock
            let started = Instant::now();
            self.step(&mut update);

            let spent = started.elapsed();
            if spent < target {
                std::thread::sleep(target - spent);
            } else {
                log::trace!("frame {} overran by {:?}", self.control.frame(), spent - target);
            }
        }

        log::info!("game loop exited cleanly after {} frames", self.control.frame());
        Ok(())
    }
}

/// Builds a [`GameLoop`] from `config` and runs it.
pub fn run_game(config: LoopConfig, update: impl FnMut(f64)) -> anyhow::Result<()> {
    GameLoop::new(config)?.run(update)
}
