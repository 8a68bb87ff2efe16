//! Instance bookkeeping: identity, ownership, child slots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::effect::EffectRecord;
use crate::state::CellId;
use crate::view::{Fallback, HostNode, Key, Props};

use super::render::Component;

/// Counter for generating unique instance IDs.
static INSTANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for one mounted component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(INSTANCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// One segment of a child slot path. Children of a keyed collection are
/// addressed by key rather than index, so their slot survives reordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum PathSeg {
    Index(u32),
    Key(Key),
}

/// Where a child component sits inside its parent's output.
pub(crate) type SlotPath = SmallVec<[PathSeg; 8]>;

/// A mounted component instance.
pub(crate) struct Instance {
    pub(crate) id: InstanceId,
    pub(crate) parent: Option<InstanceId>,
    /// Distance from the root. Flushes render in ascending depth so
    /// parents go before the children they own.
    pub(crate) depth: usize,
    pub(crate) component: Arc<dyn Component>,
    pub(crate) props: Props,
    pub(crate) fallback: Option<Fallback>,
    /// State cell slots, in first-render declaration order.
    pub(crate) cells: Vec<CellId>,
    /// Effect slots, in declaration order.
    pub(crate) effects: Vec<EffectRecord>,
    /// Effects registered outside a render.
    pub(crate) extra_effects: Vec<EffectRecord>,
    pub(crate) effects_installed: bool,
    /// Committed output of the last successful render.
    pub(crate) output: Option<HostNode>,
    /// Mounted children by slot.
    pub(crate) children: IndexMap<SlotPath, InstanceId>,
    /// Serial of the flush that last invoked this instance's render.
    pub(crate) rendered_in_flush: u64,
    /// Serial of the flush that last committed this instance's output.
    pub(crate) committed_in_flush: u64,
}

impl Instance {
    pub(crate) fn new(
        id: InstanceId,
        parent: Option<InstanceId>,
        depth: usize,
        component: Arc<dyn Component>,
        props: Props,
        fallback: Option<Fallback>,
    ) -> Self {
        Self {
            id,
            parent,
            depth,
            component,
            props,
            fallback,
            cells: Vec::new(),
            effects: Vec::new(),
            extra_effects: Vec::new(),
            effects_installed: false,
            output: None,
            children: IndexMap::new(),
            rendered_in_flush: 0,
            committed_in_flush: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_ids_are_unique() {
        let first = InstanceId::next();
        let second = InstanceId::next();
        let third = InstanceId::next();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_ne!(first, third);
    }

    #[test]
    fn keyed_slots_differ_from_positional_slots() {
        let mut keyed: SlotPath = SmallVec::new();
        keyed.push(PathSeg::Index(0));
        keyed.push(PathSeg::Key(Key::from("b")));

        let mut positional: SlotPath = SmallVec::new();
        positional.push(PathSeg::Index(0));
        positional.push(PathSeg::Index(1));

        assert_ne!(keyed, positional);
        assert_eq!(keyed, keyed.clone());
    }
}
