//! Error Taxonomy
//!
//! The core distinguishes two families of failure:
//!
//! - [`ConfigError`]: a broken invariant in how components are declared
//!   (duplicate keys, malformed dependency tuples, conditional hooks).
//!   These are developer mistakes. They are reported synchronously at
//!   render time and halt the render that produced them.
//!
//! - [`RenderError`]: a failure while computing a view. Configuration
//!   errors are a sub-case (via `From`); the other case is a component
//!   body signalling that it cannot produce output. Component failures
//!   propagate to the nearest error boundary rather than aborting the
//!   whole flush.
//!
//! A third family is deliberately *not* an error: writes or effect
//! registrations against an unmounted instance. Those arise from
//! legitimate races between asynchronous callbacks and teardown and are
//! recovered silently with a `debug!` diagnostic.

use thiserror::Error;

use crate::state::CellId;
use crate::view::Key;

/// A broken declaration invariant, detected while rendering.
///
/// Configuration errors are fail-fast: they abort the flush that
/// discovered them instead of being absorbed by error boundaries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Two children of one keyed collection carry the same key.
    #[error("duplicate key `{0}` among keyed siblings")]
    DuplicateKey(Key),

    /// An element mixed keyed and unkeyed children. A keyed collection
    /// requires a key on every child; there is no index fallback.
    #[error("element `{tag}` mixes keyed and unkeyed children")]
    MixedChildren {
        /// Tag of the offending element.
        tag: String,
    },

    /// `Deps::watch` was given an empty tuple. An empty tuple is
    /// indistinguishable from "forgot the dependencies", so run-once
    /// effects must say so explicitly.
    #[error("empty dependency tuple; use `Deps::once()` for a run-once effect")]
    EmptyDeps,

    /// A render requested more state cells than it created on its first
    /// render. Cells must be declared unconditionally, in a fixed order.
    #[error("state cell requested past the slots created on first render")]
    CellSlotMismatch,

    /// The number of declared effects changed between renders. Effects
    /// must be declared unconditionally, in a fixed order.
    #[error("effect count changed between renders; declare effects unconditionally")]
    EffectSlotMismatch,

    /// A render read a cell the store does not know about.
    #[error("read of unknown state cell {0:?}")]
    UnknownCell(CellId),
}

/// Failure while computing a component's view.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A declaration invariant was broken. Never caught by boundaries.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The component body could not produce a view. Propagates to the
    /// nearest ancestor with a declared error boundary.
    #[error("component `{component}` failed to render: {message}")]
    Failed {
        /// Name of the component that failed.
        component: String,
        /// Human-readable description of what went wrong.
        message: String,
    },
}

impl RenderError {
    /// Build a component failure.
    pub fn failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
