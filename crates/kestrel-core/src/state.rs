use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use smallvec::SmallVec;

pub type SubId = u64;

type Subscriber<T> = Rc<dyn Fn(&T)>;

pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 256;

static MAX_CASCADE_DEPTH: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_CASCADE_DEPTH);

thread_local! {
    static CASCADE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Bounds how many notifications may be nested inside one another on a thread.
///
/// A subscriber that sets another cell notifies that cell's subscribers before
/// returning, so a cycle between cells recurses. Past this depth the
/// notification panics instead of exhausting the stack.
pub fn set_max_cascade_depth(depth: usize) {
    MAX_CASCADE_DEPTH.store(depth.max(1), Ordering::Relaxed);
}

pub fn max_cascade_depth() -> usize {
    MAX_CASCADE_DEPTH.load(Ordering::Relaxed)
}

struct CascadeGuard;

impl CascadeGuard {
    fn enter() -> Self {
        let depth = CASCADE_DEPTH.with(|d| {
            let next = d.get() + 1;
            d.set(next);
            next
        });
        // constructed before the check so the depth is restored while unwinding
        let guard = CascadeGuard;
        let limit = max_cascade_depth();
        if depth > limit {
            log::error!("state notification cascade exceeded depth {limit}; dependency cycle?");
            panic!("state notification cascade exceeded max depth of {limit}");
        }
        guard
    }
}

impl Drop for CascadeGuard {
    fn drop(&mut self) {
        CASCADE_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Observable value holder.
///
/// `State` is a cheap handle; clones share the same value and subscriber list.
/// Subscribers run synchronously, in subscription order, before `set` returns.
pub struct State<T: 'static>(Rc<RefCell<Inner<T>>>);

struct Inner<T> {
    value: T,
    subs: Vec<(SubId, Subscriber<T>)>,
    next_id: SubId,
}

impl<T> Inner<T> {
    fn is_live(&self, id: SubId) -> bool {
        self.subs.iter().any(|(s, _)| *s == id)
    }
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("State")
            .field("value", &inner.value)
            .field("subscribers", &inner.subs.len())
            .finish()
    }
}

impl<T> State<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            subs: Vec::new(),
            next_id: 0,
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().value.clone()
    }

    /// Reads the value in place. Calling `set` on this cell from `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow().value)
    }

    /// Stores `v` and notifies subscribers, unless `v` equals the current value.
    pub fn set(&self, v: T)
    where
        T: PartialEq + Clone,
    {
        {
            let mut inner = self.0.borrow_mut();
            if inner.value == v {
                return;
            }
            inner.value = v;
        }
        self.notify();
    }

    /// Applies `f` to a copy of the value and stores the result with `set` semantics.
    pub fn update<F: FnOnce(&mut T)>(&self, f: F)
    where
        T: PartialEq + Clone,
    {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Appends `f` to the subscriber list. Subscribing the same closure twice
    /// registers it twice.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        let mut inner = self.0.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subs.push((id, Rc::new(f)));
        id
    }

    /// Swaps the callback of subscription `id` in place under a fresh id, so it
    /// keeps its position in the notification order. Appends if `id` is gone.
    pub(crate) fn resubscribe(&self, id: SubId, f: impl Fn(&T) + 'static) -> SubId {
        let mut inner = self.0.borrow_mut();
        let new_id = inner.next_id;
        inner.next_id += 1;
        match inner.subs.iter().position(|(s, _)| *s == id) {
            Some(pos) => inner.subs[pos] = (new_id, Rc::new(f)),
            None => inner.subs.push((new_id, Rc::new(f))),
        }
        new_id
    }

    /// Removes the subscription `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubId) {
        let mut inner = self.0.borrow_mut();
        if let Some(pos) = inner.subs.iter().position(|(s, _)| *s == id) {
            inner.subs.remove(pos);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().subs.len()
    }

    /// Type-erased, non-owning handle used as an effect or memo dependency.
    pub fn as_dep(&self) -> Rc<dyn Dependency> {
        Rc::new(WeakState(Rc::downgrade(&self.0)))
    }

    fn notify(&self)
    where
        T: Clone,
    {
        let snapshot: SmallVec<[(SubId, Subscriber<T>); 4]> = self
            .0
            .borrow()
            .subs
            .iter()
            .map(|(id, f)| (*id, f.clone()))
            .collect();
        if snapshot.is_empty() {
            return;
        }

        let _depth = CascadeGuard::enter();
        for (id, f) in snapshot {
            // an earlier subscriber in this round may have removed this one
            let value = {
                let inner = self.0.borrow();
                if !inner.is_live(id) {
                    continue;
                }
                inner.value.clone()
            };
            f(&value);
        }
    }
}

pub fn use_state<T>(initial: T) -> State<T> {
    State::new(initial)
}

/// A cell that effects and memos can watch without knowing its value type.
pub trait Dependency {
    /// Registers `f` to run on every change. Returns `None` if the cell is gone.
    fn watch(&self, f: Rc<dyn Fn()>) -> Option<SubId>;
    /// Replaces subscription `id` with `f` at the same position.
    fn rewatch(&self, id: SubId, f: Rc<dyn Fn()>) -> Option<SubId>;
    fn unwatch(&self, id: SubId);
}

struct WeakState<T>(Weak<RefCell<Inner<T>>>);

impl<T: 'static> Dependency for WeakState<T> {
    fn watch(&self, f: Rc<dyn Fn()>) -> Option<SubId> {
        let inner = self.0.upgrade()?;
        Some(State(inner).subscribe(move |_| f()))
    }

    fn rewatch(&self, id: SubId, f: Rc<dyn Fn()>) -> Option<SubId> {
        let inner = self.0.upgrade()?;
        Some(State(inner).resubscribe(id, move |_| f()))
    }

    fn unwatch(&self, id: SubId) {
        if let Some(inner) = self.0.upgrade() {
            State(inner).unsubscribe(id);
        }
    }
}

/// Subscriptions held by an effect or memo, keyed by dependency index.
#[derive(Default)]
pub(crate) struct Subscriptions(RefCell<SmallVec<[(usize, SubId); 4]>>);

impl Subscriptions {
    pub(crate) fn subscribe_all(
        &self,
        deps: &[Rc<dyn Dependency>],
        f: impl Fn() -> Rc<dyn Fn()>,
    ) {
        for (index, dep) in deps.iter().enumerate() {
            if let Some(id) = dep.watch(f()) {
                self.0.borrow_mut().push((index, id));
            }
        }
    }

    /// Like `subscribe_all`, but an existing subscription is swapped in place
    /// and keeps its slot in the cell's notification order.
    pub(crate) fn resubscribe_all(
        &self,
        deps: &[Rc<dyn Dependency>],
        f: impl Fn() -> Rc<dyn Fn()>,
    ) {
        let old = std::mem::take(&mut *self.0.borrow_mut());
        for (index, dep) in deps.iter().enumerate() {
            let id = match old.iter().find(|(i, _)| *i == index) {
                Some(&(_, prev)) => dep.rewatch(prev, f()),
                None => dep.watch(f()),
            };
            if let Some(id) = id {
                self.0.borrow_mut().push((index, id));
            }
        }
    }

    /// Idempotent: a second call finds nothing to remove.
    pub(crate) fn release(&self, deps: &[Rc<dyn Dependency>]) {
        let subs = std::mem::take(&mut *self.0.borrow_mut());
        for (index, id) in subs {
            if let Some(dep) = deps.get(index) {
                dep.unwatch(id);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.0.borrow().len()
    }
}
