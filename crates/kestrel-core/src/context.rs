//! # Contexts
//!
//! Engine subsystems (clock, timers, effects, audio, rendering) are shared as
//! *contexts*: one instance per type, registered once and looked up by type
//! from anywhere on the game thread.
//!
//! ```rust
//! use kestrel_core::*;
//!
//! #[derive(Default)]
//! struct Score {
//!     points: State<u32>,
//! }
//! impl Context for Score {}
//!
//! ContextRegistry::register(Score::default());
//!
//! use_context::<Score, _>(false, |score| {
//!     score.points.update(|p| *p += 10);
//! })
//! .unwrap();
//!
//! assert_eq!(get_context::<Score>().unwrap().points.get(), 10);
//! ```
//!
//! The registry is thread-local. Contexts hold `Rc` state, so they are confined
//! to the thread that runs the game loop; register them there before the first
//! frame.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub use crate::error::ContextError;

/// A subsystem handle stored in the [`ContextRegistry`].
///
/// Contexts are shared through `Rc`, so mutable parts use interior mutability
/// (`Cell`, `RefCell` or [`State`](crate::State)).
pub trait Context: Any {
    /// Releases whatever the context holds. Called by scoped use with
    /// `cleanup = true` and by [`ContextRegistry::cleanup_all`].
    fn cleanup(&self) {}
}

struct Entry {
    name: &'static str,
    instance: Rc<dyn Any>,
    context: Rc<dyn Context>,
}

thread_local! {
    static REGISTRY: RefCell<HashMap<TypeId, Entry>> = RefCell::new(HashMap::new());
}

pub struct ContextRegistry;

impl ContextRegistry {
    /// Registers `context` under its type, replacing any previous instance of
    /// that type. Returns the shared handle.
    pub fn register<C: Context>(context: C) -> Rc<C> {
        let rc = Rc::new(context);
        Self::register_rc(rc.clone());
        rc
    }

    pub fn register_rc<C: Context>(context: Rc<C>) {
        let name = type_name::<C>();
        let entry = Entry {
            name,
            instance: context.clone(),
            context,
        };
        let previous = REGISTRY.with(|r| r.borrow_mut().insert(TypeId::of::<C>(), entry));
        if previous.is_some() {
            log::debug!("context {name} replaced");
        } else {
            log::debug!("context {name} registered");
        }
        // dropped outside the borrow; a context's Drop may touch the registry
        drop(previous);
    }

    pub fn get<C: Context>() -> Result<Rc<C>, ContextError> {
        let name = type_name::<C>();
        let instance = REGISTRY
            .with(|r| {
                r.borrow()
                    .get(&TypeId::of::<C>())
                    .map(|e| e.instance.clone())
            })
            .ok_or(ContextError::NotRegistered { name })?;
        instance
            .downcast::<C>()
            .map_err(|_| ContextError::TypeMismatch { name })
    }

    pub fn is_registered<C: Context>() -> bool {
        REGISTRY.with(|r| r.borrow().contains_key(&TypeId::of::<C>()))
    }

    /// Checks the registry by the type of `context`, not by identity.
    pub fn is_registered_instance<C: Context>(_context: &C) -> bool {
        Self::is_registered::<C>()
    }

    pub fn len() -> usize {
        REGISTRY.with(|r| r.borrow().len())
    }

    pub fn is_empty() -> bool {
        Self::len() == 0
    }

    pub fn registered_names() -> Vec<&'static str> {
        let mut names: Vec<_> = REGISTRY.with(|r| r.borrow().values().map(|e| e.name).collect());
        names.sort_unstable();
        names
    }

    /// Runs `cleanup` on every registered context. Registrations are kept.
    pub fn cleanup_all() {
        let contexts: Vec<(&'static str, Rc<dyn Context>)> = REGISTRY.with(|r| {
            r.borrow()
                .values()
                .map(|e| (e.name, e.context.clone()))
                .collect()
        });
        for (name, context) in contexts {
            log::debug!("cleaning up context {name}");
            context.cleanup();
        }
    }

    /// Drops every registration. Meant for test isolation and shutdown.
    pub fn clear_all() {
        let entries = REGISTRY.with(|r| std::mem::take(&mut *r.borrow_mut()));
        drop(entries);
    }
}

/// Looks up the registered context of type `C`.
pub fn get_context<C: Context>() -> Result<Rc<C>, ContextError> {
    ContextRegistry::get::<C>()
}

/// Like [`get_context`], but a missing context is a panic.
#[track_caller]
pub fn expect_context<C: Context>() -> Rc<C> {
    match ContextRegistry::get::<C>() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{e}");
            panic!("{e}")
        }
    }
}

// Runs the context's cleanup when dropped, including during unwinding.
struct CleanupGuard<C: Context>(Option<Rc<C>>);

impl<C: Context> Drop for CleanupGuard<C> {
    fn drop(&mut self) {
        if let Some(context) = self.0.take() {
            log::debug!("scoped use of {} finished, cleaning up", type_name::<C>());
            context.cleanup();
        }
    }
}

/// Runs `block` with the registered `C`. With `cleanup`, the context's
/// `cleanup` runs afterwards, whether `block` returns or panics.
pub fn use_context<C: Context, R>(
    cleanup: bool,
    block: impl FnOnce(&C) -> R,
) -> Result<R, ContextError> {
    let context = ContextRegistry::get::<C>()?;
    let _guard = CleanupGuard(cleanup.then(|| context.clone()));
    Ok(block(&context))
}

/// Registers `context` if no context of its type is registered yet, then runs
/// `block` with it. Cleanup follows [`use_context`].
pub fn use_context_with<C: Context, R>(
    context: Rc<C>,
    cleanup: bool,
    block: impl FnOnce(&C) -> R,
) -> R {
    if !ContextRegistry::is_registered::<C>() {
        ContextRegistry::register_rc(context.clone());
    }
    let _guard = CleanupGuard(cleanup.then(|| context.clone()));
    block(&context)
}
