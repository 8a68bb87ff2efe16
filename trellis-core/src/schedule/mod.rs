//! Render Scheduling
//!
//! State writes never render inline. They mark the owning instance dirty
//! through the [`RenderScheduler`], and the accumulated dirty set is
//! drained by one coalesced flush per logical tick. Scheduling requests
//! that arrive while a flush is executing are queued for the next tick,
//! never flushed recursively; that single rule is what bounds render
//! recursion and keeps an unrelated sibling's write from re-entering a
//! render in progress.

mod scheduler;

pub use scheduler::RenderScheduler;
