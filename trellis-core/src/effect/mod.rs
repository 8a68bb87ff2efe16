//! Dependency-Gated Side Effects
//!
//! Render functions stay pure; side effects live in effect records that
//! the [`EffectScheduler`] runs after a commit. Whether an effect re-runs
//! is decided by comparing its dependency tuple against the snapshot
//! captured at its last run, element-wise and by value.
//!
//! # The dependency contract is explicit
//!
//! Every policy is a named constructor on [`Deps`]; none of them is an
//! accidental default:
//!
//! - [`Deps::watch`] - re-run when any element of the tuple changed since
//!   the last run. The tuple must be non-empty.
//! - [`Deps::once`] - run exactly once, on the owner's first commit.
//! - [`Deps::always`] - run after every commit of the owner. This is the
//!   "no dependency list" configuration; it is valid, but choosing it is
//!   visible at the call site and auditable in review.
//!
//! An empty tuple handed to `watch` is rejected as a configuration error
//! rather than silently meaning either of the other two policies.
//!
//! # Cleanup
//!
//! An effect body may return a cleanup closure. The cleanup runs
//! immediately before the body's next run, and once more when the owning
//! instance unmounts.
//!
//! # Ordering
//!
//! Effects run strictly after reconciliation of the same commit, in
//! declaration order within an instance, depth-first pre-order across
//! the instance tree.

mod record;
mod scheduler;

pub use record::{Cleanup, Deps, EffectBody};
pub use scheduler::EffectScheduler;

pub(crate) use record::EffectRecord;
pub(crate) use scheduler::DeclaredEffect;
