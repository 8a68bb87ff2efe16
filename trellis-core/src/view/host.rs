//! Committed Host Trees
//!
//! A [`HostNode`] is the lowered form of a [`ViewNode`](super::ViewNode)
//! after a commit: component nodes have been resolved to mounted child
//! instances and appear as [`HostNode::Child`] references. The runtime
//! keeps one committed host tree per instance; the reconciler diffs the
//! previous tree against the next one, and patches address positions
//! within it.
//!
//! Host trees serialize with `serde` so a display surface can consume the
//! initial tree and every subsequent patch as plain data.

use serde::Serialize;

use crate::component::InstanceId;

use super::node::Key;
use super::props::Props;

/// One node of a committed view tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostNode {
    /// A text node.
    Text {
        /// The text content.
        value: String,
    },
    /// An element with props and children.
    Element {
        /// The element tag.
        tag: String,
        /// The element's props.
        props: Props,
        /// The element's children.
        children: HostChildren,
    },
    /// The boundary to a child component instance. The child's own
    /// committed tree lives in that instance's patch space.
    Child {
        /// The mounted child instance.
        instance: InstanceId,
    },
}

/// Children of a committed element.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostChildren {
    /// Positional children.
    Plain(Vec<HostNode>),
    /// Keyed children, in document order.
    Keyed(Vec<(Key, HostNode)>),
}

impl HostChildren {
    /// Number of children.
    pub fn len(&self) -> usize {
        match self {
            Self::Plain(nodes) => nodes.len(),
            Self::Keyed(entries) => entries.len(),
        }
    }

    /// Whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HostNode {
    /// The text content, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { value } => Some(value),
            _ => None,
        }
    }

    /// Collect referenced child instances in document order.
    pub(crate) fn child_refs(&self, out: &mut Vec<InstanceId>) {
        match self {
            Self::Text { .. } => {}
            Self::Child { instance } => out.push(*instance),
            Self::Element { children, .. } => match children {
                HostChildren::Plain(nodes) => {
                    for node in nodes {
                        node.child_refs(out);
                    }
                }
                HostChildren::Keyed(entries) => {
                    for (_, node) in entries {
                        node.child_refs(out);
                    }
                }
            },
        }
    }
}
