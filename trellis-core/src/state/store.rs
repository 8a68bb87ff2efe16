//! State cell storage and the write path.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::component::InstanceId;
use crate::schedule::RenderScheduler;

/// Counter for generating unique cell IDs.
static CELL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for one state cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CellId(u64);

impl CellId {
    fn next() -> Self {
        Self(CELL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct CellEntry {
    owner: InstanceId,
    value: Value,
}

#[derive(Debug, Default)]
struct StoreInner {
    cells: HashMap<CellId, CellEntry>,
    /// Writes received mid-flush, applied when the flush ends.
    staged: Vec<(CellId, Value)>,
}

/// Storage for every instance's state cells.
///
/// Cloning shares the underlying storage; handles can be held by setters
/// and effect bodies while the runtime drives renders.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<RwLock<StoreInner>>,
    scheduler: RenderScheduler,
}

impl StateStore {
    /// Create an empty store wired to the given scheduler.
    pub fn new(scheduler: RenderScheduler) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            scheduler,
        }
    }

    /// Create a cell owned by `owner` with the given initial value.
    pub fn create_cell(&self, owner: InstanceId, initial: Value) -> CellId {
        let id = CellId::next();
        self.inner.write().cells.insert(
            id,
            CellEntry {
                owner,
                value: initial,
            },
        );
        id
    }

    /// Read a cell's current value. `None` if the cell's owner has been
    /// unmounted.
    pub fn read(&self, id: CellId) -> Option<Value> {
        self.inner.read().cells.get(&id).map(|entry| entry.value.clone())
    }

    /// Write a new value to a cell.
    ///
    /// Compares against the current value; an unequal write marks the
    /// owning instance dirty and returns without rendering. A write to a
    /// released cell is discarded. A write during a flush is staged and
    /// applied at end of flush, visible to the next tick's renders.
    pub fn write(&self, id: CellId, value: Value) {
        if self.scheduler.is_flushing() {
            let mut inner = self.inner.write();
            if inner.cells.contains_key(&id) {
                inner.staged.push((id, value));
            } else {
                debug!(cell = id.raw(), "write to released cell dropped");
            }
            return;
        }

        let owner = {
            let mut inner = self.inner.write();
            match inner.cells.get_mut(&id) {
                None => {
                    debug!(cell = id.raw(), "write to released cell dropped");
                    return;
                }
                Some(entry) => {
                    if entry.value == value {
                        return;
                    }
                    entry.value = value;
                    entry.owner
                }
            }
        };

        self.scheduler.schedule(owner);
    }

    /// Build a cloneable handle that writes one cell.
    pub fn setter(&self, cell: CellId) -> Setter {
        Setter {
            cell,
            store: self.clone(),
        }
    }

    /// Apply writes staged during the flush that just ended. Staged
    /// writes go through the normal write path, so coalescing and dirty
    /// marking behave as if the writes had just arrived.
    pub(crate) fn apply_staged(&self) {
        let staged: Vec<(CellId, Value)> = {
            let mut inner = self.inner.write();
            std::mem::take(&mut inner.staged)
        };
        for (id, value) in staged {
            self.write(id, value);
        }
    }

    /// Release every cell owned by an unmounted instance. Returns how
    /// many cells were dropped.
    pub(crate) fn release_instance(&self, owner: InstanceId) -> usize {
        let mut inner = self.inner.write();
        let before = inner.cells.len();
        inner.cells.retain(|_, entry| entry.owner != owner);
        before - inner.cells.len()
    }

    /// Number of live cells.
    pub fn cell_count(&self) -> usize {
        self.inner.read().cells.len()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("cell_count", &self.cell_count())
            .finish()
    }
}

/// Cloneable, sendable handle writing one cell. The handle stays valid
/// after the owning instance unmounts; writes through it then become
/// silent no-ops.
#[derive(Clone, Debug)]
pub struct Setter {
    cell: CellId,
    store: StateStore,
}

impl Setter {
    /// The cell this handle writes.
    pub fn cell(&self) -> CellId {
        self.cell
    }

    /// Write a new value through the normal write path.
    pub fn set(&self, value: impl Into<Value>) {
        self.store.write(self.cell, value.into());
    }
}
