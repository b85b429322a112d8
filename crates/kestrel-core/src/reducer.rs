use std::rc::Rc;

use crate::state::State;

/// State holder pattern: a state type plus the pure transition over its events.
pub trait StateHolder: 'static {
    type State: Clone + PartialEq;
    type Event;

    fn initial_state() -> Self::State;
    fn reduce(state: &Self::State, event: Self::Event) -> Self::State;
}

/// Pure state machine over a [`State`] cell.
///
/// Each `dispatch` stores its result through the cell, so subscribers see one
/// notification per dispatch that changes the state.
pub struct Reducer<S: 'static, A: 'static> {
    state: State<S>,
    reduce: Rc<dyn Fn(&S, A) -> S>,
}

impl<S, A> Clone for Reducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            reduce: self.reduce.clone(),
        }
    }
}

impl<S: Clone + PartialEq + 'static, A: 'static> Reducer<S, A> {
    pub fn new(initial: S, reduce: impl Fn(&S, A) -> S + 'static) -> Self {
        Self {
            state: State::new(initial),
            reduce: Rc::new(reduce),
        }
    }

    pub fn from_holder<H>() -> Self
    where
        H: StateHolder<State = S, Event = A>,
    {
        Self::new(H::initial_state(), H::reduce)
    }

    pub fn get_state(&self) -> S {
        self.state.get()
    }

    /// The backing cell, for subscribing or using as a dependency.
    pub fn state(&self) -> &State<S> {
        &self.state
    }

    pub fn dispatch(&self, action: A) {
        let next = self.state.with(|current| (self.reduce)(current, action));
        self.state.set(next);
    }

    pub fn dispatcher(&self) -> impl Fn(A) + Clone + 'static + use<S, A> {
        let reducer = self.clone();
        move |action| reducer.dispatch(action)
    }
}

/// Returns the state cell and a dispatch function for `reduce`.
pub fn use_reducer<S, A>(
    initial: S,
    reduce: impl Fn(&S, A) -> S + 'static,
) -> (State<S>, impl Fn(A) + Clone + 'static)
where
    S: Clone + PartialEq + 'static,
    A: 'static,
{
    let reducer = Reducer::new(initial, reduce);
    (reducer.state().clone(), reducer.dispatcher())
}
