use std::cell::RefCell;

use kestrel_core::prelude::*;
use kestrel_runtime::{GameLoop, LoopConfig, LoopControl};

/// Stand-in for an audio backend: records what would have been played.
#[derive(Default)]
struct SoundContext {
    played: RefCell<Vec<&'static str>>,
}

impl SoundContext {
    fn play(&self, sound: &'static str) {
        log::info!("play {sound}");
        self.played.borrow_mut().push(sound);
    }
}

impl Context for SoundContext {
    fn cleanup(&self) {
        log::info!("sound stopped after {} clips", self.played.borrow().len());
        self.played.borrow_mut().clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Playing,
    Won,
}

enum Event {
    Collect(u32),
    Finish,
}

struct Game;

impl StateHolder for Game {
    type State = (Phase, u32);
    type Event = Event;

    fn initial_state() -> Self::State {
        (Phase::Playing, 0)
    }

    fn reduce(state: &Self::State, event: Event) -> Self::State {
        match (state.0, event) {
            (Phase::Playing, Event::Collect(n)) => (Phase::Playing, state.1 + n),
            (Phase::Playing, Event::Finish) => (Phase::Won, state.1),
            _ => *state,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => LoopConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => LoopConfig {
            target_fps: 30,
            max_frames: Some(300),
            ..LoopConfig::default()
        },
    };
    let game = GameLoop::new(config)?;
    ContextRegistry::register(SoundContext::default());

    let game_state = Reducer::from_holder::<Game>();
    let dispatch = game_state.dispatcher();
    let mut coins = FixedSizeCache::new(8);

    let score_label = use_memo(
        {
            let state = game_state.state().clone();
            move || format!("score: {}", state.get().1)
        },
        [game_state.state().as_dep()],
    );

    use_effect(
        {
            let state = game_state.state().clone();
            let label = score_label.clone();
            move || {
                let (phase, _) = state.get();
                log::info!("{} ({phase:?})", label.get());
                if phase == Phase::Won {
                    expect_context::<SoundContext>().play("fanfare");
                    expect_context::<LoopControl>().stop();
                }
            }
        },
        [game_state.state().as_dep()],
    )?;

    let spawner = use_interval(250, {
        let dispatch = dispatch.clone();
        let mut next = 0u32;
        move || {
            next += 1;
            let value = *coins.get_or_put(next % 12, || next % 5 + 1);
            expect_context::<SoundContext>().play("coin");
            dispatch(Event::Collect(value));
        }
    })?;

    use_timer(5_000, move || {
        spawner.stop();
        dispatch(Event::Finish);
    })?;

    game.run(|_| {})?;
    log::info!("final {}", score_label.get());
    Ok(())
}
