use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{Context, ContextError, get_context};
use crate::state::{Dependency, Subscriptions};

/// A side effect bound to a set of state cells.
///
/// Nothing runs on construction. `execute` runs the action and then re-runs it
/// whenever any dependency changes, until `cleanup` is called or the last
/// handle is dropped.
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

struct EffectInner {
    action: Rc<dyn Fn()>,
    deps: Vec<Rc<dyn Dependency>>,
    subs: Subscriptions,
}

impl Effect {
    pub fn new(
        action: impl Fn() + 'static,
        deps: impl IntoIterator<Item = Rc<dyn Dependency>>,
    ) -> Self {
        Self {
            inner: Rc::new(EffectInner {
                action: Rc::new(action),
                deps: deps.into_iter().collect(),
                subs: Subscriptions::default(),
            }),
        }
    }

    /// Drops previous subscriptions, runs the action once and subscribes afresh.
    ///
    /// Calling this twice in a row leaves exactly one subscription per
    /// dependency. A panicking action leaves the effect unsubscribed.
    pub fn execute(&self) {
        self.cleanup();
        (self.inner.action)();
        let action = self.inner.action.clone();
        self.inner
            .subs
            .subscribe_all(&self.inner.deps, || action.clone());
    }

    /// Removes exactly the subscriptions this effect registered.
    pub fn cleanup(&self) {
        self.inner.subs.release(&self.inner.deps);
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.subs.len() > 0
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        self.subs.release(&self.deps);
    }
}

/// Owns a group of effects so they can be torn down together.
#[derive(Default)]
pub struct EffectManager {
    effects: RefCell<Vec<Effect>>,
}

impl EffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes `effect` immediately and keeps it until `cleanup`.
    pub fn add_effect(&self, effect: Effect) {
        // not borrowed while running: the action may add effects of its own
        effect.execute();
        self.effects.borrow_mut().push(effect);
    }

    pub fn cleanup(&self) {
        let effects = std::mem::take(&mut *self.effects.borrow_mut());
        for effect in &effects {
            effect.cleanup();
        }
    }

    pub fn len(&self) -> usize {
        self.effects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.borrow().is_empty()
    }
}

/// Registry capability that owns effects created through [`use_effect`].
#[derive(Default)]
pub struct EffectContext {
    manager: EffectManager,
}

impl EffectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_effect(
        &self,
        action: impl Fn() + 'static,
        deps: impl IntoIterator<Item = Rc<dyn Dependency>>,
    ) -> Effect {
        let effect = Effect::new(action, deps);
        self.manager.add_effect(effect.clone());
        effect
    }

    pub fn len(&self) -> usize {
        self.manager.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manager.is_empty()
    }
}

impl Context for EffectContext {
    fn cleanup(&self) {
        self.manager.cleanup();
    }
}

/// Creates an effect owned by the registered [`EffectContext`] and runs it.
pub fn use_effect(
    action: impl Fn() + 'static,
    deps: impl IntoIterator<Item = Rc<dyn Dependency>>,
) -> Result<Effect, ContextError> {
    let effects = get_context::<EffectContext>()?;
    Ok(effects.use_effect(action, deps))
}
