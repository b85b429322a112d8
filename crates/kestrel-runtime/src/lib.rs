//! Frame driver for Kestrel games.
//!
//! ```rust,no_run
//! use kestrel_core::*;
//! use kestrel_runtime::{LoopConfig, run_game};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LoopConfig { max_frames: Some(600), ..LoopConfig::default() };
//!     run_game(config, |delta| {
//!         log::trace!("frame took {delta:.4}s");
//!     })
//! }
//! ```
//!
//! Each frame ticks the [`ClockContext`](kestrel_core::ClockContext), runs
//! due timers in the [`ActionContext`](kestrel_core::ActionContext), then
//! calls the update closure with the frame's delta in seconds.

pub mod config;
pub mod game_loop;
mod tests;

pub use config::*;
pub use game_loop::*;
