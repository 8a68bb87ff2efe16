//! Trellis Core
//!
//! This crate provides the reactive state and render core of the Trellis
//! UI framework. It implements:
//!
//! - Per-instance state cells with coalesced, schedule-only mutation
//! - Dependency-gated side effects with explicit re-run policies
//! - Keyed reconciliation producing a serializable patch protocol
//! - A tick-based render scheduler that batches writes into one flush
//!
//! The crate is a library, not a display surface: a host consumes the
//! [`PatchSet`] each flush produces and is responsible for translating it
//! into visual updates.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `state`: state cell storage and the write path
//! - `effect`: effect records and the post-commit pass
//! - `reconcile`: tree diffing and the patch protocol
//! - `schedule`: the pending-dirty set and tick discipline
//! - `component`: the component contract, scopes, and instances
//! - `runtime`: the coordinator driving the commit cycle
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::{component, Deps, Props, Runtime, ViewNode};
//!
//! let counter = component("counter", |props, scope| {
//!     let count = scope.cell(props.number("initial").unwrap_or(0.0))?;
//!     let value = scope.read(count)?;
//!
//!     // Logs only when the count actually changed.
//!     let snapshot = value.clone();
//!     scope.effect(Deps::watch([value.clone()]), move || {
//!         println!("count is now {snapshot}");
//!         None
//!     })?;
//!
//!     Ok(ViewNode::text(format!("count: {value}")))
//! });
//!
//! let mut rt = Runtime::new();
//! let patches = rt.mount(counter, Props::new().with("initial", 10))?;
//! // hand `patches` to the display surface, write cells, flush again...
//! ```

pub mod component;
pub mod effect;
pub mod error;
pub mod reconcile;
pub mod runtime;
pub mod schedule;
pub mod state;
pub mod view;

pub use component::{component, Component, InstanceId, Scope};
pub use effect::{Cleanup, Deps, EffectScheduler};
pub use error::{ConfigError, RenderError};
pub use reconcile::{reconcile, NodePath, Patch, PatchOp, PatchSet, RenderFailure};
pub use runtime::Runtime;
pub use schedule::RenderScheduler;
pub use state::{CellId, Setter, StateStore};
pub use view::{
    ComponentNode, Element, Fallback, HostChildren, HostNode, Key, Props, Value, ViewNode,
};
