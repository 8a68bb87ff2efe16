//! View Nodes
//!
//! The immutable tree a render function produces. Three kinds of node:
//! plain text, elements with props and children, and component nodes that
//! the runtime mounts as child instances.
//!
//! # Keyed collections
//!
//! An element's children are either *plain* (positional identity) or
//! *keyed* (identity by explicit [`Key`]). The two cannot be mixed: a
//! keyed collection requires a key on every child, and the builders
//! record an attempt to mix as a [`ConfigError`] that halts the render
//! which committed the tree. There is no silent key-equals-index
//! fallback.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::component::Component;
use crate::error::{ConfigError, RenderError};

use super::props::Props;

/// A stable identity token for a child within a keyed collection,
/// independent of the child's position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Create a key from anything string-like.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The key's textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// Fallback view factory for an error boundary.
///
/// Invoked with the failure that reached the boundary; the returned view
/// replaces the boundary instance's output.
pub type Fallback = Arc<dyn Fn(&RenderError) -> ViewNode + Send + Sync>;

/// Immutable output of one render pass.
#[derive(Clone, Debug)]
pub enum ViewNode {
    /// A text node.
    Text(String),
    /// An element with props and children.
    Element(Element),
    /// A component to be mounted or updated as a child instance.
    Component(ComponentNode),
}

impl ViewNode {
    /// Build a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Start building an element.
    pub fn element(tag: impl Into<String>) -> Element {
        Element::new(tag)
    }

    /// Build a component node.
    pub fn component(component: Arc<dyn Component>, props: Props) -> ComponentNode {
        ComponentNode {
            component,
            props,
            fallback: None,
        }
    }
}

/// Children of an element: positional or keyed, never both.
#[derive(Clone, Debug)]
pub(crate) enum Children {
    Plain(Vec<ViewNode>),
    Keyed(Vec<(Key, ViewNode)>),
}

impl Default for Children {
    fn default() -> Self {
        Children::Plain(Vec::new())
    }
}

/// An element node under construction.
#[derive(Clone, Debug)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) props: Props,
    pub(crate) children: Children,
    pub(crate) invalid: Option<ConfigError>,
}

impl Element {
    /// Start an element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: Props::new(),
            children: Children::default(),
            invalid: None,
        }
    }

    /// The element's tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Add a prop.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props = self.props.with(name, value);
        self
    }

    /// Append a positional child.
    pub fn child(mut self, node: impl Into<ViewNode>) -> Self {
        if let Children::Plain(nodes) = &mut self.children {
            nodes.push(node.into());
        } else {
            self.flag_mixed();
        }
        self
    }

    /// Append several positional children.
    pub fn children(mut self, nodes: impl IntoIterator<Item = ViewNode>) -> Self {
        for node in nodes {
            self = self.child(node);
        }
        self
    }

    /// Set keyed children. Every child carries its key; appending to an
    /// element that already has positional children is a configuration
    /// error surfaced when the tree is committed.
    pub fn keyed(mut self, entries: impl IntoIterator<Item = (Key, ViewNode)>) -> Self {
        self.children = match std::mem::take(&mut self.children) {
            Children::Keyed(mut existing) => {
                existing.extend(entries);
                Children::Keyed(existing)
            }
            Children::Plain(nodes) if nodes.is_empty() => {
                Children::Keyed(entries.into_iter().collect())
            }
            Children::Plain(nodes) => {
                self.flag_mixed();
                Children::Plain(nodes)
            }
        };
        self
    }

    fn flag_mixed(&mut self) {
        if self.invalid.is_none() {
            self.invalid = Some(ConfigError::MixedChildren {
                tag: self.tag.clone(),
            });
        }
    }
}

impl From<Element> for ViewNode {
    fn from(element: Element) -> Self {
        ViewNode::Element(element)
    }
}

/// A component child declaration: which component, with which props, and
/// optionally an error boundary fallback.
#[derive(Clone)]
pub struct ComponentNode {
    pub(crate) component: Arc<dyn Component>,
    pub(crate) props: Props,
    pub(crate) fallback: Option<Fallback>,
}

impl ComponentNode {
    /// The declared component's name.
    pub fn name(&self) -> &str {
        self.component.name()
    }

    /// Declare this instance as an error boundary. A render failure in
    /// any descendant substitutes this instance's output with the view
    /// the fallback produces.
    pub fn boundary(
        mut self,
        fallback: impl Fn(&RenderError) -> ViewNode + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("component", &self.component.name())
            .field("props", &self.props)
            .field("boundary", &self.fallback.is_some())
            .finish()
    }
}

impl From<ComponentNode> for ViewNode {
    fn from(node: ComponentNode) -> Self {
        ViewNode::Component(node)
    }
}
