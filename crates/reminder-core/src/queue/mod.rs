//! Queue module: the time-ordered heap and its guarded, shareable handle.

mod handle;
mod heap;

pub use handle::ScheduleHandle;
pub use heap::TimeOrderedQueue;
