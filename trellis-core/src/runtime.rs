//! Runtime Coordinator
//!
//! The runtime owns the instance tree and drives the commit cycle:
//!
//! 1. A state write marks its owning instance dirty with the
//!    [`RenderScheduler`]; nothing renders inline.
//!
//! 2. [`Runtime::flush`] drains the dirty set once per logical tick and
//!    re-invokes each pending instance's render function exactly once,
//!    parents before the children they own (a parent's render may change
//!    a child's props).
//!
//! 3. Each render's [`ViewNode`] tree is *lowered*: component nodes are
//!    resolved against the instance's child slots, mounting new children,
//!    updating surviving ones (re-rendering them only when their props
//!    changed by value or they were themselves dirty), and unmounting the
//!    children whose slot vanished.
//!
//! 4. The lowered tree is diffed against the committed tree, extending
//!    the flush's [`PatchSet`].
//!
//! 5. After every pending instance has committed, the effect pass runs:
//!    depth-first pre-order over the instance tree, declaration order
//!    within an instance, dependency-gated per record. An instance
//!    unmounted earlier in the same flush is skipped entirely.
//!
//! Scheduling requests and state writes that arrive while a flush is
//! executing are deferred to the next tick, so one flush can never
//! recurse into another.
//!
//! # Error containment
//!
//! Configuration errors abort the flush; they indicate broken
//! declarations, not runtime data. A component failure instead looks for
//! the nearest ancestor declared as an error boundary and substitutes
//! that ancestor's output with its fallback view. Without a boundary the
//! failing subtree keeps its previous committed output and the failure
//! is reported in [`PatchSet::failures`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};

use crate::component::{Component, Instance, InstanceId, PathSeg, Scope, SlotPath};
use crate::effect::{Cleanup, Deps, EffectScheduler};
use crate::error::{ConfigError, RenderError};
use crate::reconcile::{diff_into, NodePath, PatchOp, PatchSet, RenderFailure};
use crate::schedule::RenderScheduler;
use crate::state::{CellId, StateStore};
use crate::view::{Children, ComponentNode, Element, HostChildren, HostNode, Key, Props, ViewNode};

/// The coordinator connecting state, scheduling, reconciliation, and
/// effects for one component tree.
pub struct Runtime {
    scheduler: RenderScheduler,
    store: StateStore,
    effects: EffectScheduler,
    instances: HashMap<InstanceId, Instance>,
    root: Option<InstanceId>,
    /// Monotonic flush counter; instances record the serial of the flush
    /// that last rendered and last committed them.
    flush_serial: u64,
    /// Snapshot of the dirty set for the flush in progress.
    flush_dirty: HashSet<InstanceId>,
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        let scheduler = RenderScheduler::new();
        let store = StateStore::new(scheduler.clone());
        Self {
            scheduler,
            store,
            effects: EffectScheduler::new(),
            instances: HashMap::new(),
            root: None,
            flush_serial: 0,
            flush_dirty: HashSet::new(),
        }
    }

    /// The state store backing this runtime.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// The render scheduler backing this runtime.
    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// The root instance, once mounted.
    pub fn root(&self) -> Option<InstanceId> {
        self.root
    }

    /// The committed output of an instance.
    pub fn committed(&self, id: InstanceId) -> Option<&HostNode> {
        self.instances.get(&id).and_then(|inst| inst.output.as_ref())
    }

    /// Whether the instance is currently mounted.
    pub fn is_mounted(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Number of mounted instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Total effect bodies run since creation.
    pub fn effect_runs(&self) -> u64 {
        self.effects.total_runs()
    }

    /// Whether any instance is waiting for the next flush.
    pub fn has_pending(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Write a cell through the store's normal write path.
    pub fn write(&self, cell: CellId, value: impl Into<Value>) {
        self.store.write(cell, value.into());
    }

    /// Read a cell's current value.
    pub fn read(&self, cell: CellId) -> Option<Value> {
        self.store.read(cell)
    }

    /// Request a re-render of an instance on the next flush.
    pub fn invalidate(&self, id: InstanceId) {
        if self.instances.contains_key(&id) {
            self.scheduler.schedule(id);
        } else {
            debug!(instance = id.raw(), "render request for unmounted instance dropped");
        }
    }

    /// Register an effect on an instance from outside a render. Against
    /// an unmounted instance this is a silent no-op; stale registrations
    /// are a legitimate race with teardown.
    pub fn register_effect<F>(
        &mut self,
        owner: InstanceId,
        deps: Deps,
        body: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn() -> Option<Cleanup> + Send + Sync + 'static,
    {
        match self.instances.get_mut(&owner) {
            None => {
                debug!(
                    instance = owner.raw(),
                    "effect registration for unmounted instance dropped"
                );
                Ok(())
            }
            Some(instance) => self.effects.register_extra(instance, deps, Arc::new(body)),
        }
    }

    /// Mount a root component and run the initial flush. Remounting
    /// replaces the previous root tree.
    pub fn mount(
        &mut self,
        component: Arc<dyn Component>,
        props: Props,
    ) -> Result<PatchSet, RenderError> {
        let mut patches = PatchSet::new();
        if let Some(previous) = self.root.take() {
            self.unmount(previous, &mut patches);
        }

        let id = InstanceId::next();
        self.instances
            .insert(id, Instance::new(id, None, 0, component, props, None));
        self.root = Some(id);
        debug!(instance = id.raw(), "root mounted");

        self.scheduler.schedule(id);
        let flushed = self.flush()?;
        patches.extend(flushed);
        Ok(patches)
    }

    /// Run one coalesced render/reconcile/effect cycle over everything
    /// scheduled since the previous flush.
    pub fn flush(&mut self) -> Result<PatchSet, RenderError> {
        self.flush_serial += 1;
        let mut dirty = self.scheduler.begin_flush();
        dirty.retain(|id| self.instances.contains_key(id));
        dirty.sort_by_key(|id| self.instances.get(id).map_or(usize::MAX, |inst| inst.depth));
        self.flush_dirty = dirty.iter().copied().collect();
        trace!(serial = self.flush_serial, dirty = dirty.len(), "flush");

        let mut patches = PatchSet::new();
        let mut failure = None;
        for id in dirty {
            let skip = self
                .instances
                .get(&id)
                .map_or(true, |inst| inst.rendered_in_flush == self.flush_serial);
            if skip {
                continue;
            }
            if let Err(err) = self.render_dirty(id, &mut patches) {
                failure = Some(err);
                break;
            }
        }

        if failure.is_none() {
            self.effect_pass();
        }
        self.flush_dirty.clear();
        self.scheduler.end_flush();
        self.store.apply_staged();

        match failure {
            Some(err) => Err(err),
            None => Ok(patches),
        }
    }

    /// Flush repeatedly until no renders are pending, up to `max_ticks`.
    /// Effects that write state schedule follow-up ticks; a tree that
    /// never settles is reported with a warning and the patches so far.
    pub fn settle(&mut self, max_ticks: usize) -> Result<PatchSet, RenderError> {
        let mut all = PatchSet::new();
        let mut ticks = 0;
        while self.scheduler.has_pending() {
            if ticks >= max_ticks {
                warn!(ticks, "renders did not settle within the tick budget");
                break;
            }
            let batch = self.flush()?;
            all.extend(batch);
            ticks += 1;
        }
        Ok(all)
    }

    // ------------------------------------------------------------------
    // Flush internals
    // ------------------------------------------------------------------

    /// Render one instance from the dirty set, containing component
    /// failures at the nearest boundary.
    fn render_dirty(&mut self, id: InstanceId, patches: &mut PatchSet) -> Result<(), RenderError> {
        match self.render_instance(id, patches) {
            Ok(()) => Ok(()),
            Err(err @ RenderError::Config(_)) => Err(err),
            Err(err) => self.contain_failure(id, err, patches),
        }
    }

    /// Invoke the instance's render function, install its declarations,
    /// and commit the resulting view.
    fn render_instance(
        &mut self,
        id: InstanceId,
        patches: &mut PatchSet,
    ) -> Result<(), RenderError> {
        let (component, props, cells, first_render) = match self.instances.get_mut(&id) {
            None => return Ok(()),
            Some(inst) => {
                inst.rendered_in_flush = self.flush_serial;
                (
                    inst.component.clone(),
                    inst.props.clone(),
                    std::mem::take(&mut inst.cells),
                    inst.output.is_none(),
                )
            }
        };
        trace!(instance = id.raw(), component = component.name(), "render");

        let mut scope = Scope::new(&self.store, id, cells, first_render);
        let view = component.render(&props, &mut scope);
        let (cells, declared) = scope.finish();
        if let Some(inst) = self.instances.get_mut(&id) {
            inst.cells = cells;
        }
        let view = view?;

        match self.instances.get_mut(&id) {
            None => return Ok(()),
            Some(inst) => self.effects.install(inst, declared)?,
        }

        match self.commit_view(id, view, patches) {
            Ok(()) => Ok(()),
            Err(err @ RenderError::Config(_)) => Err(err),
            Err(err) => {
                // A descendant failed while lowering. If this instance is
                // a boundary it substitutes its fallback; otherwise the
                // failure keeps propagating toward the next ancestor.
                let fallback = self.instances.get(&id).and_then(|inst| inst.fallback.clone());
                match fallback {
                    None => Err(err),
                    Some(fallback) => {
                        warn!(instance = id.raw(), %err, "boundary substituting fallback");
                        patches.failures.push(Self::failure_from(&err, id));
                        self.commit_view(id, (fallback)(&err), patches)
                    }
                }
            }
        }
    }

    /// Lower a rendered view, reconcile it against the committed output,
    /// and store it as the new committed output.
    fn commit_view(
        &mut self,
        id: InstanceId,
        view: ViewNode,
        patches: &mut PatchSet,
    ) -> Result<(), RenderError> {
        let mut touched: HashSet<SlotPath> = HashSet::new();
        let mut slot_path: SlotPath = SmallVec::new();
        let output = self.lower(id, view, &mut slot_path, &mut touched, patches)?;

        // Children whose slot vanished from the new output unmount now.
        let stale: Vec<(SlotPath, InstanceId)> = match self.instances.get(&id) {
            None => Vec::new(),
            Some(inst) => inst
                .children
                .iter()
                .filter(|(slot, _)| !touched.contains(*slot))
                .map(|(slot, child)| (slot.clone(), *child))
                .collect(),
        };
        for (slot, child) in stale {
            if let Some(inst) = self.instances.get_mut(&id) {
                inst.children.shift_remove(&slot);
            }
            self.unmount(child, patches);
        }

        let serial = self.flush_serial;
        match self.instances.get_mut(&id) {
            None => Ok(()),
            Some(inst) => {
                match &inst.output {
                    Some(previous) => diff_into(id, previous, &output, patches),
                    None => patches.push(
                        id,
                        NodePath::new(),
                        PatchOp::Replace {
                            node: output.clone(),
                        },
                    ),
                }
                inst.output = Some(output);
                inst.committed_in_flush = serial;
                Ok(())
            }
        }
    }

    /// Resolve a view node into committed host form, mounting and
    /// updating child instances along the way.
    fn lower(
        &mut self,
        owner: InstanceId,
        node: ViewNode,
        slot_path: &mut SlotPath,
        touched: &mut HashSet<SlotPath>,
        patches: &mut PatchSet,
    ) -> Result<HostNode, RenderError> {
        match node {
            ViewNode::Text(value) => Ok(HostNode::Text { value }),
            ViewNode::Element(element) => {
                let Element {
                    tag,
                    props,
                    children,
                    invalid,
                } = element;
                if let Some(err) = invalid {
                    return Err(err.into());
                }
                let children = match children {
                    Children::Plain(nodes) => {
                        let mut lowered = Vec::with_capacity(nodes.len());
                        for (index, child) in nodes.into_iter().enumerate() {
                            slot_path.push(PathSeg::Index(index as u32));
                            let result = self.lower(owner, child, slot_path, touched, patches);
                            slot_path.pop();
                            lowered.push(result?);
                        }
                        HostChildren::Plain(lowered)
                    }
                    Children::Keyed(entries) => {
                        let mut seen: HashSet<Key> = HashSet::new();
                        let mut lowered = Vec::with_capacity(entries.len());
                        for (key, child) in entries {
                            if !seen.insert(key.clone()) {
                                return Err(ConfigError::DuplicateKey(key).into());
                            }
                            slot_path.push(PathSeg::Key(key.clone()));
                            let result = self.lower(owner, child, slot_path, touched, patches);
                            slot_path.pop();
                            lowered.push((key, result?));
                        }
                        HostChildren::Keyed(lowered)
                    }
                };
                Ok(HostNode::Element {
                    tag,
                    props,
                    children,
                })
            }
            ViewNode::Component(node) => {
                let slot = slot_path.clone();
                let child = self.child_for_slot(owner, slot, node, patches)?;
                touched.insert(slot_path.clone());
                Ok(HostNode::Child { instance: child })
            }
        }
    }

    /// Find or create the child instance for a component node at the
    /// given slot. Surviving children keep their cells and effects; a
    /// changed component type replaces the instance wholesale.
    fn child_for_slot(
        &mut self,
        owner: InstanceId,
        slot: SlotPath,
        node: ComponentNode,
        patches: &mut PatchSet,
    ) -> Result<InstanceId, RenderError> {
        let existing = self
            .instances
            .get(&owner)
            .and_then(|inst| inst.children.get(&slot).copied());

        if let Some(child_id) = existing {
            let same_type = self
                .instances
                .get(&child_id)
                .map_or(false, |child| child.component.name() == node.name());
            if same_type {
                let needs_render = match self.instances.get_mut(&child_id) {
                    None => false,
                    Some(child) => {
                        let props_changed = child.props != node.props;
                        child.component = node.component;
                        child.fallback = node.fallback;
                        if props_changed {
                            child.props = node.props;
                        }
                        let already_rendered = child.rendered_in_flush == self.flush_serial;
                        (props_changed || self.flush_dirty.contains(&child_id))
                            && !already_rendered
                    }
                };
                if needs_render {
                    self.render_child(child_id, patches)?;
                }
                return Ok(child_id);
            }

            // The slot now holds a different component type.
            if let Some(inst) = self.instances.get_mut(&owner) {
                inst.children.shift_remove(&slot);
            }
            self.unmount(child_id, patches);
        }

        let child_id = InstanceId::next();
        let depth = self.instances.get(&owner).map_or(0, |inst| inst.depth + 1);
        let ComponentNode {
            component,
            props,
            fallback,
        } = node;
        debug!(
            instance = child_id.raw(),
            component = component.name(),
            "child mounted"
        );
        self.instances.insert(
            child_id,
            Instance::new(child_id, Some(owner), depth, component, props, fallback),
        );
        if let Some(inst) = self.instances.get_mut(&owner) {
            inst.children.insert(slot, child_id);
        }
        self.render_child(child_id, patches)?;
        Ok(child_id)
    }

    /// Render a child during its parent's lowering, containing failures
    /// locally when no boundary exists anywhere above it.
    fn render_child(&mut self, child_id: InstanceId, patches: &mut PatchSet) -> Result<(), RenderError> {
        match self.render_instance(child_id, patches) {
            Ok(()) => Ok(()),
            Err(err @ RenderError::Config(_)) => Err(err),
            Err(err) => {
                if self.nearest_boundary(child_id).is_some() {
                    // Keep propagating toward the boundary.
                    Err(err)
                } else {
                    patches.failures.push(Self::failure_from(&err, child_id));
                    error!(
                        instance = child_id.raw(),
                        %err,
                        "render failed with no boundary; subtree left as committed"
                    );
                    Ok(())
                }
            }
        }
    }

    /// Contain a failure that escaped a dirty instance's own render by
    /// substituting the nearest boundary ancestor's fallback.
    fn contain_failure(
        &mut self,
        from: InstanceId,
        err: RenderError,
        patches: &mut PatchSet,
    ) -> Result<(), RenderError> {
        patches.failures.push(Self::failure_from(&err, from));
        if let Some(boundary) = self.nearest_boundary(from) {
            let fallback = self
                .instances
                .get(&boundary)
                .and_then(|inst| inst.fallback.clone());
            if let Some(fallback) = fallback {
                warn!(
                    boundary = boundary.raw(),
                    %err,
                    "boundary substituting fallback for failed subtree"
                );
                if let Some(inst) = self.instances.get_mut(&boundary) {
                    inst.rendered_in_flush = self.flush_serial;
                }
                return match self.commit_view(boundary, (fallback)(&err), patches) {
                    Ok(()) => Ok(()),
                    Err(inner @ RenderError::Config(_)) => Err(inner),
                    Err(inner) => {
                        error!(boundary = boundary.raw(), %inner, "boundary fallback failed");
                        patches.failures.push(Self::failure_from(&inner, boundary));
                        Ok(())
                    }
                };
            }
        }
        error!(
            instance = from.raw(),
            %err,
            "render failed with no boundary; subtree left as committed"
        );
        Ok(())
    }

    /// Tear down an instance subtree: children first, then effect
    /// cleanups, cell release, and scheduler discard.
    fn unmount(&mut self, id: InstanceId, patches: &mut PatchSet) {
        let mut inst = match self.instances.remove(&id) {
            Some(inst) => inst,
            None => return,
        };
        let children: Vec<InstanceId> = inst.children.values().copied().collect();
        for child in children {
            self.unmount(child, patches);
        }
        for record in inst
            .effects
            .iter_mut()
            .chain(inst.extra_effects.iter_mut())
        {
            record.teardown();
        }
        let released = self.store.release_instance(id);
        self.scheduler.discard(id);
        patches.push(id, NodePath::new(), PatchOp::Unmounted);
        debug!(
            instance = id.raw(),
            component = inst.component.name(),
            released,
            "instance unmounted"
        );
    }

    /// Run due effects for every instance committed in this flush, in
    /// depth-first pre-order over the current tree.
    fn effect_pass(&mut self) {
        let serial = self.flush_serial;
        let order = self.effect_order(serial);
        let Runtime {
            effects, instances, ..
        } = self;
        for id in order {
            if let Some(inst) = instances.get_mut(&id) {
                effects.after_commit(inst);
            }
        }
    }

    fn effect_order(&self, serial: u64) -> Vec<InstanceId> {
        let mut order = Vec::new();
        if let Some(root) = self.root {
            self.push_preorder(root, &mut order);
        }
        order.retain(|id| {
            self.instances
                .get(id)
                .map_or(false, |inst| inst.committed_in_flush == serial)
        });
        order
    }

    fn push_preorder(&self, id: InstanceId, out: &mut Vec<InstanceId>) {
        out.push(id);
        if let Some(inst) = self.instances.get(&id) {
            if let Some(output) = &inst.output {
                let mut children = Vec::new();
                output.child_refs(&mut children);
                for child in children {
                    self.push_preorder(child, out);
                }
            }
        }
    }

    fn nearest_boundary(&self, from: InstanceId) -> Option<InstanceId> {
        let mut cursor = self.instances.get(&from).and_then(|inst| inst.parent);
        while let Some(id) = cursor {
            match self.instances.get(&id) {
                Some(inst) if inst.fallback.is_some() => return Some(id),
                Some(inst) => cursor = inst.parent,
                None => return None,
            }
        }
        None
    }

    fn failure_from(err: &RenderError, at: InstanceId) -> RenderFailure {
        let component = match err {
            RenderError::Failed { component, .. } => component.clone(),
            RenderError::Config(_) => String::new(),
        };
        RenderFailure {
            instance: at,
            component,
            message: err.to_string(),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::component;

    #[test]
    fn mount_commits_the_initial_tree() {
        let mut rt = Runtime::new();
        let hello = component("hello", |_props, _scope| Ok(ViewNode::text("hello")));

        let patches = rt.mount(hello, Props::new()).unwrap();
        assert_eq!(patches.len(), 1);
        assert!(matches!(patches.patches[0].op, PatchOp::Replace { .. }));

        let root = rt.root().unwrap();
        assert_eq!(rt.committed(root).and_then(HostNode::as_text), Some("hello"));
    }

    #[test]
    fn invalidate_without_changes_produces_no_patches() {
        let mut rt = Runtime::new();
        let stable = component("stable", |props, _scope| {
            let label = props.string("label").unwrap_or_default().to_owned();
            Ok(ViewNode::text(label))
        });

        rt.mount(stable, Props::new().with("label", "same")).unwrap();
        let root = rt.root().unwrap();

        rt.invalidate(root);
        let patches = rt.flush().unwrap();
        assert!(patches.is_empty());
    }

    #[test]
    fn duplicate_keys_abort_the_flush() {
        let mut rt = Runtime::new();
        let broken = component("broken", |_props, _scope| {
            Ok(ViewNode::element("ul")
                .keyed([
                    (Key::from("a"), ViewNode::text("first")),
                    (Key::from("a"), ViewNode::text("second")),
                ])
                .into())
        });

        let err = rt.mount(broken, Props::new()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Config(ConfigError::DuplicateKey(_))
        ));
    }
}
