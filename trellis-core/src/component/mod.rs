//! Components and Instances
//!
//! A [`Component`] is a pure render function with a name: given its props
//! and a [`Scope`] over its own state cells, it produces a [`ViewNode`]
//! tree. The runtime materializes each usage site as an *instance* whose
//! identity is the component's type plus its slot in the parent's output
//! (position, or explicit key inside a keyed collection).
//!
//! An instance owns its state cells and effect records from its first
//! render until its slot disappears from the parent's output. Unmounting
//! releases the cells, runs pending effect cleanups, and discards any
//! renders or effect runs still scheduled for the instance.
//!
//! Render functions must not perform side effects; those belong in
//! effect records declared through [`Scope::effect`]. Reading props and
//! cells and computing derived values (totals, labels) inline is exactly
//! what the render function is for - derived values are recomputed every
//! render rather than cached, so they can never drift from their inputs.

mod instance;
mod render;
mod scope;

pub use instance::InstanceId;
pub use render::{component, Component};
pub use scope::Scope;

pub(crate) use instance::{Instance, PathSeg, SlotPath};
