//! The component contract and function components.

use std::sync::Arc;

use crate::error::RenderError;
use crate::view::{Props, ViewNode};

use super::scope::Scope;

/// A named, pure render function.
///
/// `render` must depend only on `props` and the values of the cells it
/// reads through `scope`. Side effects belong in effect records declared
/// on the scope, not in the render body.
pub trait Component: Send + Sync {
    /// The component's type name. Instances are matched across renders
    /// by this name together with their slot.
    fn name(&self) -> &str;

    /// Produce the view for the current props and state.
    fn render(&self, props: &Props, scope: &mut Scope<'_>) -> Result<ViewNode, RenderError>;
}

struct FnComponent<F> {
    name: String,
    render: F,
}

impl<F> Component for FnComponent<F>
where
    F: Fn(&Props, &mut Scope<'_>) -> Result<ViewNode, RenderError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, props: &Props, scope: &mut Scope<'_>) -> Result<ViewNode, RenderError> {
        (self.render)(props, scope)
    }
}

/// Wrap a closure as a component.
///
/// # Example
///
/// ```rust,ignore
/// let greeter = component("greeter", |props, _scope| {
///     let name = props.string("name").unwrap_or("world");
///     Ok(ViewNode::text(format!("hello, {name}")))
/// });
/// ```
pub fn component<F>(name: impl Into<String>, render: F) -> Arc<dyn Component>
where
    F: Fn(&Props, &mut Scope<'_>) -> Result<ViewNode, RenderError> + Send + Sync + 'static,
{
    Arc::new(FnComponent {
        name: name.into(),
        render,
    })
}
