//! # State, Effects, and Contexts
//!
//! Kestrel game code keeps its mutable data in observable cells and wires
//! engine subsystems together through a type-keyed registry. There are four
//! main pieces:
//!
//! - `State<T>`: observable value holder.
//! - `Effect` / `MemoizedValue`: side effects and derived values that re-run
//!   when their dependencies change.
//! - `Reducer`: pure state transitions over a `State`.
//! - `ContextRegistry`: one shared instance per subsystem type.
//!
//! ## State
//!
//! ```rust
//! use kestrel_core::*;
//!
//! let lives = use_state(3);
//! lives.subscribe(|v| log::info!("lives: {v}"));
//! lives.set(3); // unchanged, nobody is notified
//! lives.set(2);
//! lives.update(|v| *v -= 1);
//! assert_eq!(lives.get(), 1);
//! ```
//!
//! Subscribers run synchronously, in subscription order, before `set`
//! returns. A subscriber that sets another cell recurses into that cell's
//! subscribers right away, so dependency graphs must be acyclic or settle on
//! a fixed point; runaway cascades panic past [`max_cascade_depth`].
//!
//! ## Effects and memos
//!
//! ```rust
//! use kestrel_core::*;
//!
//! let score = use_state(0);
//!
//! let doubled = use_memo({
//!     let score = score.clone();
//!     move || score.get() * 2
//! }, [score.as_dep()]);
//!
//! let effect = Effect::new(
//!     { let doubled = doubled.clone(); move || log::info!("doubled = {}", doubled.get()) },
//!     [score.as_dep()],
//! );
//! effect.execute();
//!
//! score.set(21);
//! assert_eq!(doubled.get(), 42);
//!
//! effect.cleanup();
//! doubled.cleanup();
//! ```
//!
//! Dependencies are non-owning: an effect or memo never keeps a cell alive.
//! Call `cleanup` (or drop the last handle) to stop tracking.
//!
//! ## Contexts
//!
//! See [`context`] for registering and using subsystem contexts.

pub mod action;
pub mod cache;
pub mod clock;
pub mod context;
pub mod effect;
pub mod error;
pub mod memo;
pub mod prelude;
pub mod reducer;
pub mod state;

pub use action::*;
pub use cache::*;
pub use clock::*;
pub use context::*;
pub use effect::*;
pub use memo::*;
pub use reducer::*;
pub use state::*;
