//! Effect records: a body, a dependency policy, and the snapshot from
//! the last run.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;

use crate::error::ConfigError;

/// Cleanup closure returned by an effect body. Runs before the body's
/// next run and once on unmount.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// An effect body. Returns an optional cleanup closure.
pub type EffectBody = Arc<dyn Fn() -> Option<Cleanup> + Send + Sync>;

/// The re-run policy of an effect, declared explicitly at registration.
#[derive(Clone, Debug, PartialEq)]
pub enum Deps {
    /// Run after every commit of the owning instance.
    Always,
    /// Run exactly once, on the owner's first commit.
    Once,
    /// Run when any element differs by value from the snapshot captured
    /// at the last run.
    Values(SmallVec<[Value; 4]>),
}

impl Deps {
    /// The run-after-every-commit policy.
    pub fn always() -> Self {
        Self::Always
    }

    /// The run-exactly-once policy.
    pub fn once() -> Self {
        Self::Once
    }

    /// Watch a tuple of values. The tuple must be non-empty; an empty
    /// tuple is rejected at registration with
    /// [`ConfigError::EmptyDeps`].
    pub fn watch(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Values(values.into_iter().collect())
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Values(values) if values.is_empty() => Err(ConfigError::EmptyDeps),
            _ => Ok(()),
        }
    }
}

/// One effect slot of an instance.
pub(crate) struct EffectRecord {
    /// Policy declared at the most recent render.
    deps: Deps,
    /// Policy snapshot at the last run. `None` until the first run.
    last: Option<Deps>,
    body: EffectBody,
    cleanup: Option<Cleanup>,
}

impl EffectRecord {
    pub(crate) fn new(deps: Deps, body: EffectBody) -> Self {
        Self {
            deps,
            last: None,
            body,
            cleanup: None,
        }
    }

    /// Refresh the slot with the declaration from a new render. The last
    /// snapshot and any pending cleanup are preserved.
    pub(crate) fn update(&mut self, deps: Deps, body: EffectBody) {
        self.deps = deps;
        self.body = body;
    }

    /// Whether the effect must run for the commit in progress.
    pub(crate) fn due(&self) -> bool {
        match &self.last {
            None => true,
            Some(prev) => match (&self.deps, prev) {
                (Deps::Always, _) => true,
                (Deps::Once, _) => false,
                (Deps::Values(now), Deps::Values(then)) => now != then,
                // The policy itself changed between renders.
                (Deps::Values(_), _) => true,
            },
        }
    }

    /// Run the body: previous cleanup first, then the body, then record
    /// the snapshot.
    pub(crate) fn run(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
        self.cleanup = (self.body)();
        self.last = Some(self.deps.clone());
    }

    /// Run the pending cleanup at unmount.
    pub(crate) fn teardown(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl fmt::Debug for EffectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRecord")
            .field("deps", &self.deps)
            .field("ran", &self.last.is_some())
            .field("has_cleanup", &self.cleanup.is_some())
            .finish()
    }
}
