//! View Model
//!
//! This module defines the data that flows through a render: the
//! [`ViewNode`] tree a render function produces, the [`Props`] a parent
//! hands to a child, and the [`HostNode`] tree the runtime commits and
//! diffs.
//!
//! # Concepts
//!
//! ## View nodes
//!
//! A `ViewNode` is the immutable output of one render pass. It is either
//! text, an element with props and children, or a component node that the
//! runtime resolves to a child instance. View nodes are consumed by the
//! commit; a render function builds a fresh tree every time it runs.
//!
//! ## Keys
//!
//! Children of a keyed collection carry an explicit [`Key`]. The key is
//! the child's identity across renders, independent of its position, and
//! is what lets a reordered child keep its state cells and effects. The
//! builder surface makes a keyed child without a key unrepresentable:
//! [`Element::keyed`] only accepts `(Key, ViewNode)` pairs, and mixing
//! keyed and unkeyed children is reported as a configuration error at
//! render time.
//!
//! ## Props
//!
//! [`Props`] is an immutable, insertion-ordered mapping of names to
//! values. A child never mutates its props; the runtime compares them by
//! value to decide whether a child must re-render.
//!
//! ## Derived values
//!
//! Anything computable from props and cells (totals, labels, filtered
//! lists) is recomputed inside the render function each time it runs.
//! There is deliberately no cached-aggregate storage in the view model:
//! a stored aggregate can drift from its inputs, a recomputed one cannot.
//!
//! ## Host nodes
//!
//! A [`HostNode`] is the committed, lowered form of a view node: component
//! nodes are replaced by references to their mounted child instances.
//! Host trees are what the reconciler diffs and what patches address.

mod host;
mod node;
mod props;

pub use host::{HostChildren, HostNode};
pub use node::{ComponentNode, Element, Fallback, Key, ViewNode};
pub use props::Props;

pub(crate) use node::Children;

/// Dynamic value stored in cells, props, and dependency tuples.
///
/// Re-exported from `serde_json` so that values compare by structural
/// equality and serialize with the rest of the patch protocol.
pub use serde_json::Value;
