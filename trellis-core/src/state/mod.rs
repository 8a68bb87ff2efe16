//! Per-Instance State Storage
//!
//! Every piece of mutable state in the tree lives in a [`StateStore`]
//! cell owned by exactly one component instance. Mutation goes through
//! [`StateStore::write`], which compares the new value against the
//! current one and, when they differ, marks the owning instance dirty
//! with the render scheduler. A write never re-renders inline.
//!
//! # Coalescing
//!
//! Multiple writes to one cell within a tick overwrite each other in the
//! store; the render triggered by the tick's flush observes only the last
//! value. Writes issued *while* a flush is executing are staged and
//! applied when the flush ends, so a render in progress never observes a
//! value changing under it.
//!
//! # Stale references
//!
//! Writing to a cell of an unmounted instance is a silent no-op with a
//! `debug!` diagnostic. Asynchronous callbacks legitimately outlive the
//! instances that spawned them, and a discarded write is the correct
//! outcome of that race.

mod store;

pub use store::{CellId, Setter, StateStore};
