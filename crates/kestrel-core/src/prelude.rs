pub use crate::action::{ActionContext, IntervalHandle, use_interval, use_timer};
pub use crate::cache::FixedSizeCache;
pub use crate::clock::{Clock, ClockContext, SystemClock, TestClock, set_clock};
pub use crate::context::{
    Context, ContextError, ContextRegistry, expect_context, get_context, use_context,
    use_context_with,
};
pub use crate::effect::{Effect, EffectContext, EffectManager, use_effect};
pub use crate::memo::{MemoizedValue, use_memo};
pub use crate::reducer::{Reducer, StateHolder, use_reducer};
pub use crate::state::{Dependency, State, SubId, use_state};
