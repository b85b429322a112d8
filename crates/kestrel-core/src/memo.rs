use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::state::{Dependency, Subscriptions};

/// Cached derived value.
///
/// Computed on first `get`, then recomputed eagerly whenever a dependency
/// changes. `cleanup` stops tracking but keeps the last value.
pub struct MemoizedValue<T: 'static> {
    inner: Rc<MemoInner<T>>,
}

struct MemoInner<T> {
    compute: Box<dyn Fn() -> T>,
    deps: Vec<Rc<dyn Dependency>>,
    value: RefCell<Option<T>>,
    subs: Subscriptions,
}

impl<T> Clone for MemoizedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> MemoizedValue<T> {
    pub fn new(
        compute: impl Fn() -> T + 'static,
        deps: impl IntoIterator<Item = Rc<dyn Dependency>>,
    ) -> Self {
        Self {
            inner: Rc::new(MemoInner {
                compute: Box::new(compute),
                deps: deps.into_iter().collect(),
                value: RefCell::new(None),
                subs: Subscriptions::default(),
            }),
        }
    }

    /// Returns the cached value, computing it if there is none.
    ///
    /// A panic in the compute function propagates and leaves the cache empty,
    /// so the next call tries again.
    pub fn get(&self) -> T {
        if let Some(v) = self.inner.value.borrow().as_ref() {
            return v.clone();
        }
        MemoInner::calculate(&self.inner)
    }

    pub fn is_computed(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    pub fn cleanup(&self) {
        self.inner.subs.release(&self.inner.deps);
    }
}

impl<T: Clone + 'static> MemoInner<T> {
    fn calculate(this: &Rc<Self>) -> T {
        this.value.borrow_mut().take();

        let v = (this.compute)();
        *this.value.borrow_mut() = Some(v.clone());

        // in place, so readers subscribed after the memo still see the new value
        let weak: Weak<Self> = Rc::downgrade(this);
        this.subs.resubscribe_all(&this.deps, || {
            let weak = weak.clone();
            Rc::new(move || {
                if let Some(memo) = weak.upgrade() {
                    MemoInner::calculate(&memo);
                }
            }) as Rc<dyn Fn()>
        });
        v
    }
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        self.subs.release(&self.deps);
    }
}

pub fn use_memo<T: Clone + 'static>(
    compute: impl Fn() -> T + 'static,
    deps: impl IntoIterator<Item = Rc<dyn Dependency>>,
) -> MemoizedValue<T> {
    MemoizedValue::new(compute, deps)
}
