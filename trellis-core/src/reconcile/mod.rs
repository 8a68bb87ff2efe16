//! Reconciliation
//!
//! Given the committed host tree of an instance and the tree its latest
//! render produced, the reconciler emits the minimal [`PatchSet`] that
//! transforms one into the other.
//!
//! # Design Decisions
//!
//! 1. Keyed collections are matched through a key-to-previous-child
//!    mapping, never by position. A child whose key reappears is patched
//!    in place - which is what lets the runtime keep that child's state
//!    cells and effect records across reorders. Keys missing from the
//!    new list unmount; keys new to the list mount fresh.
//!
//! 2. Non-keyed nodes compare by kind and tag: matching nodes patch in
//!    place, mismatched nodes replace wholesale.
//!
//! 3. Patches address `(instance, path)` pairs, where the path indexes
//!    into that instance's committed tree. Child component content never
//!    leaks into the parent's patches; it lives in the child instance's
//!    own patch space behind a `HostNode::Child` reference.
//!
//! The diff itself is pure: it reads two trees and writes patches. All
//! mounting and unmounting decisions happen before it runs, when the
//! runtime lowers the new view tree.

mod diff;
mod patch;

pub use diff::reconcile;
pub use patch::{NodePath, Patch, PatchOp, PatchSet, RenderFailure};

pub(crate) use diff::diff_into;
