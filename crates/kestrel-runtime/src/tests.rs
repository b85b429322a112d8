#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Duration;

    use kestrel_core::*;

    use crate::config::*;
    use crate::game_loop::*;

    #[test]
    fn test_config_defaults() {
        let config = LoopConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LoopConfig::default());
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.max_cascade_depth, DEFAULT_MAX_CASCADE_DEPTH);
    }

    #[test]
    fn test_config_partial_and_invalid() {
        let config =
            LoopConfig::from_json_str(r#"{ "target_fps": 50, "max_frames": 10 }"#).unwrap();
        assert_eq!(config.max_frames, Some(10));
        assert_eq!(config.frame_duration(), Duration::from_millis(20));

        assert!(matches!(
            LoopConfig::from_json_str(r#"{ "target_fps": 0 }"#),
            Err(ConfigError::ZeroFrameRate)
        ));
        assert!(matches!(
            LoopConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    fn install_test_clock() -> TestClock {
        ContextRegistry::clear_all();
        let t = TestClock::default();
        ContextRegistry::register(ClockContext::with_clock(Arc::new(t.clone())));
        t
    }

    #[test]
    fn test_new_registers_core_contexts() {
        ContextRegistry::clear_all();
        let _game = GameLoop::new(LoopConfig::default()).unwrap();
        assert!(ContextRegistry::is_registered::<ClockContext>());
        assert!(ContextRegistry::is_registered::<ActionContext>());
        assert!(ContextRegistry::is_registered::<EffectContext>());
        assert!(ContextRegistry::is_registered::<LoopControl>());
    }

    #[test]
    fn test_step_ticks_clock_and_actions() {
        let t = install_test_clock();
        let game = GameLoop::new(LoopConfig::default()).unwrap();

        let fired = Rc::new(Cell::new(false));
        {
            let fired = fired.clone();
            use_timer(30, move || fired.set(true)).unwrap();
        }

        let deltas = Rc::new(Cell::new(0.0));
        let mut update = {
            let deltas = deltas.clone();
            move |dt: f64| deltas.set(deltas.get() + dt)
        };

        for _ in 0..3 {
            t.advance(Duration::from_millis(20));
            game.step(&mut update);
        }
        assert!(fired.get());
        assert_eq!(game.control().frame(), 3);
        assert!((deltas.get() - 0.06).abs() < 1e-9);
        assert_eq!(expect_context::<ClockContext>().total_time_ms(), 60);
    }

    #[test]
    fn test_run_stops_at_max_frames_and_cleans_up() {
        install_test_clock();
        let config = LoopConfig {
            target_fps: 1000,
            max_frames: Some(3),
            ..LoopConfig::default()
        };
        let game = GameLoop::new(config).unwrap();
        use_interval(1_000_000, || {}).unwrap();

        let frames = Rc::new(Cell::new(0));
        {
            let frames = frames.clone();
            game.run(move |_| frames.set(frames.get() + 1)).unwrap();
        }
        assert_eq!(frames.get(), 3);
        assert!(!game.control().is_running());
        assert!(expect_context::<ActionContext>().is_empty());
    }

    #[test]
    fn test_update_can_stop_the_loop() {
        install_test_clock();
        let config = LoopConfig {
            target_fps: 1000,
            ..LoopConfig::default()
        };
        let game = GameLoop::new(config).unwrap();
        let frames = Rc::new(Cell::new(0u32));
        {
            let frames = frames.clone();
            game.run(move |_| {
                frames.set(frames.get() + 1);
                if frames.get() == 2 {
                    expect_context::<LoopControl>().stop();
                }
            })
            .unwrap();
        }
        assert_eq!(frames.get(), 2);
    }

    #[test]
    fn test_effects_react_inside_frames() {
        install_test_clock();
        let game = GameLoop::new(LoopConfig::default()).unwrap();
        let score = use_state(0);
        let renders = Rc::new(Cell::new(0));
        {
            let renders = renders.clone();
            use_effect(move || renders.set(renders.get() + 1), [score.as_dep()]).unwrap();
        }

        let mut update = {
            let score = score.clone();
            move |_dt: f64| score.update(|s| *s += 1)
        };
        game.step(&mut update);
        game.step(&mut update);
        assert_eq!(renders.get(), 3);

        ContextRegistry::cleanup_all();
        score.set(100);
        assert_eq!(renders.get(), 3);
    }

    #[test]
    fn test_effect_stops_loop_through_registry() {
        install_test_clock();
        let config = LoopConfig {
            target_fps: 1000,
            max_frames: Some(50),
            ..LoopConfig::default()
        };
        let game = GameLoop::new(config).unwrap();
        let (score, dispatch) = use_reducer(0u32, |s: &u32, by: u32| s + by);
        let label = use_memo(
            {
                let score = score.clone();
                move || format!("score: {}", score.get())
            },
            [score.as_dep()],
        );
        let shown = Rc::new(std::cell::RefCell::new(Vec::new()));
        {
            let (score, label, shown) = (score.clone(), label.clone(), shown.clone());
            use_effect(
                {
                    let score = score.clone();
                    move || {
                        shown.borrow_mut().push(label.get());
                        if score.get() >= 3 {
                            expect_context::<LoopControl>().stop();
                        }
                    }
                },
                [score.as_dep()],
            )
            .unwrap();
        }

        game.run(move |_| dispatch(1)).unwrap();
        assert_eq!(game.control().frame(), 3);
        assert_eq!(
            *shown.borrow(),
            vec!["score: 0", "score: 1", "score: 2", "score: 3"]
        );
    }
}
