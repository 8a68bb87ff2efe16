//! The host-facing patch protocol.

use serde::Serialize;
use serde_json::Value;

use crate::component::InstanceId;
use crate::view::{HostNode, Key};

/// Index path from an instance's root to one of its host nodes.
pub type NodePath = Vec<u32>;

/// One view difference.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    /// Replace the addressed node wholesale.
    Replace {
        /// The new node, including its subtree.
        node: HostNode,
    },
    /// Update the text of the addressed text node.
    SetText {
        /// The new text content.
        value: String,
    },
    /// Set or update one prop of the addressed element.
    SetProp {
        /// Prop name.
        name: String,
        /// New prop value.
        value: Value,
    },
    /// Remove one prop of the addressed element.
    RemoveProp {
        /// Prop name.
        name: String,
    },
    /// Insert a child at `index`, shifting later siblings right.
    InsertChild {
        /// Insertion position.
        index: u32,
        /// The child's key, for keyed collections.
        key: Option<Key>,
        /// The inserted subtree.
        node: HostNode,
    },
    /// Remove the child at `index`, shifting later siblings left.
    RemoveChild {
        /// Removal position.
        index: u32,
    },
    /// Move the child at `from` to `to`, preserving its subtree.
    MoveChild {
        /// Current position.
        from: u32,
        /// Target position.
        to: u32,
    },
    /// The addressed instance was unmounted; its patch space is dead.
    Unmounted,
}

/// A patch addressed to one node of one instance's committed tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Patch {
    /// The instance whose tree the patch addresses.
    pub instance: InstanceId,
    /// Path from that instance's root node.
    pub path: NodePath,
    /// The operation to apply.
    pub op: PatchOp,
}

/// A render failure that was contained rather than propagated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderFailure {
    /// The instance whose render failed.
    pub instance: InstanceId,
    /// Its component name.
    pub component: String,
    /// The failure message.
    pub message: String,
}

/// Everything one flush tells the host surface: the view differences to
/// apply, plus any subtree failures that were contained by a boundary or
/// left visibly broken.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PatchSet {
    /// View differences, in application order.
    pub patches: Vec<Patch>,
    /// Contained render failures.
    pub failures: Vec<RenderFailure>,
}

impl PatchSet {
    /// An empty patch set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the flush produced no differences and no failures.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty() && self.failures.is_empty()
    }

    /// Number of patches.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Append another patch set, preserving order.
    pub fn extend(&mut self, other: PatchSet) {
        self.patches.extend(other.patches);
        self.failures.extend(other.failures);
    }

    /// Iterate the patches addressed to one instance.
    pub fn for_instance(&self, id: InstanceId) -> impl Iterator<Item = &Patch> + '_ {
        self.patches.iter().filter(move |patch| patch.instance == id)
    }

    pub(crate) fn push(&mut self, instance: InstanceId, path: NodePath, op: PatchOp) {
        self.patches.push(Patch { instance, path, op });
    }
}
