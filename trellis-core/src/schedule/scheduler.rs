//! The pending-dirty set and its tick discipline.

use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::Mutex;
use tracing::trace;

use crate::component::InstanceId;

#[derive(Default)]
struct SchedState {
    /// Instances to re-render on the next flush, in scheduling order.
    pending: IndexSet<InstanceId>,
    /// Requests that arrived mid-flush; promoted to `pending` when the
    /// flush ends.
    deferred: IndexSet<InstanceId>,
    flushing: bool,
}

/// Collects render requests and coalesces them into ticks.
///
/// Cloning shares the underlying state, so the scheduler can be handed
/// to the state store and to setter handles while the runtime drives
/// flushes.
#[derive(Clone, Default)]
pub struct RenderScheduler {
    inner: Arc<Mutex<SchedState>>,
}

impl RenderScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an instance dirty. Duplicate requests within one tick
    /// coalesce; requests made during a flush land in the next tick.
    pub fn schedule(&self, id: InstanceId) {
        let mut state = self.inner.lock();
        if state.flushing {
            if state.deferred.insert(id) {
                trace!(instance = id.raw(), "render deferred to next tick");
            }
        } else if state.pending.insert(id) {
            trace!(instance = id.raw(), "render scheduled");
        }
    }

    /// Whether a flush is currently executing.
    pub fn is_flushing(&self) -> bool {
        self.inner.lock().flushing
    }

    /// Whether any instance is waiting for the next flush.
    pub fn has_pending(&self) -> bool {
        !self.inner.lock().pending.is_empty()
    }

    /// Number of instances waiting for the next flush.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Take the pending set and enter the flushing state.
    pub(crate) fn begin_flush(&self) -> Vec<InstanceId> {
        let mut state = self.inner.lock();
        state.flushing = true;
        state.pending.drain(..).collect()
    }

    /// Leave the flushing state and promote deferred requests.
    pub(crate) fn end_flush(&self) {
        let mut state = self.inner.lock();
        state.flushing = false;
        let deferred: Vec<InstanceId> = state.deferred.drain(..).collect();
        for id in deferred {
            state.pending.insert(id);
        }
    }

    /// Drop all requests for an unmounted instance.
    pub(crate) fn discard(&self, id: InstanceId) {
        let mut state = self.inner.lock();
        state.pending.shift_remove(&id);
        state.deferred.shift_remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_requests_coalesce() {
        let scheduler = RenderScheduler::new();
        let id = InstanceId::next();

        scheduler.schedule(id);
        scheduler.schedule(id);
        scheduler.schedule(id);

        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn requests_during_flush_wait_for_next_tick() {
        let scheduler = RenderScheduler::new();
        let first = InstanceId::next();
        let second = InstanceId::next();

        scheduler.schedule(first);
        let drained = scheduler.begin_flush();
        assert_eq!(drained, vec![first]);
        assert!(scheduler.is_flushing());

        // Mid-flush request must not appear in the current tick.
        scheduler.schedule(second);
        assert!(!scheduler.has_pending());

        scheduler.end_flush();
        assert!(!scheduler.is_flushing());
        assert!(scheduler.has_pending());
        assert_eq!(scheduler.begin_flush(), vec![second]);
        scheduler.end_flush();
    }

    #[test]
    fn discard_removes_both_queues() {
        let scheduler = RenderScheduler::new();
        let id = InstanceId::next();

        scheduler.schedule(id);
        scheduler.discard(id);
        assert!(!scheduler.has_pending());

        scheduler.begin_flush();
        scheduler.schedule(id);
        scheduler.discard(id);
        scheduler.end_flush();
        assert!(!scheduler.has_pending());
    }
}
