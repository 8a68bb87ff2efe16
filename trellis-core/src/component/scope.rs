//! The state accessor handed to render functions.

use std::sync::Arc;

use serde_json::Value;

use crate::effect::{Cleanup, DeclaredEffect, Deps};
use crate::error::ConfigError;
use crate::state::{CellId, Setter, StateStore};

use super::instance::InstanceId;

/// Per-render access to an instance's cells and effect slots.
///
/// Cells and effects are slot-based: the first render creates the slots
/// in call order, and every later render walks the same slots in the
/// same order. Declaring them conditionally breaks the slot walk and is
/// reported as a configuration error.
pub struct Scope<'rt> {
    store: &'rt StateStore,
    owner: InstanceId,
    cells: Vec<CellId>,
    cursor: usize,
    first_render: bool,
    declared: Vec<DeclaredEffect>,
}

impl<'rt> Scope<'rt> {
    pub(crate) fn new(
        store: &'rt StateStore,
        owner: InstanceId,
        cells: Vec<CellId>,
        first_render: bool,
    ) -> Self {
        Self {
            store,
            owner,
            cells,
            cursor: 0,
            first_render,
            declared: Vec::new(),
        }
    }

    /// The instance this scope belongs to.
    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    /// Claim the next state cell slot. On the first render the cell is
    /// created with `initial`; on later renders the existing cell is
    /// returned and `initial` is ignored.
    pub fn cell(&mut self, initial: impl Into<Value>) -> Result<CellId, ConfigError> {
        if self.cursor < self.cells.len() {
            let id = self.cells[self.cursor];
            self.cursor += 1;
            return Ok(id);
        }
        if !self.first_render {
            return Err(ConfigError::CellSlotMismatch);
        }
        let id = self.store.create_cell(self.owner, initial.into());
        self.cells.push(id);
        self.cursor += 1;
        Ok(id)
    }

    /// Read a cell's current value.
    pub fn read(&self, cell: CellId) -> Result<Value, ConfigError> {
        self.store.read(cell).ok_or(ConfigError::UnknownCell(cell))
    }

    /// Build a setter handle for event callbacks and effect bodies.
    pub fn setter(&self, cell: CellId) -> Setter {
        self.store.setter(cell)
    }

    /// Declare the next effect slot with an explicit dependency policy.
    pub fn effect<F>(&mut self, deps: Deps, body: F) -> Result<(), ConfigError>
    where
        F: Fn() -> Option<Cleanup> + Send + Sync + 'static,
    {
        deps.validate()?;
        self.declared.push(DeclaredEffect {
            deps,
            body: Arc::new(body),
        });
        Ok(())
    }

    pub(crate) fn finish(self) -> (Vec<CellId>, Vec<DeclaredEffect>) {
        (self.cells, self.declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::RenderScheduler;

    fn store() -> StateStore {
        StateStore::new(RenderScheduler::new())
    }

    #[test]
    fn first_render_creates_slots_in_order() {
        let store = store();
        let owner = InstanceId::next();

        let mut scope = Scope::new(&store, owner, Vec::new(), true);
        let first = scope.cell(1).unwrap();
        let second = scope.cell(2).unwrap();
        assert_ne!(first, second);
        assert_eq!(scope.read(first).unwrap(), Value::from(1));
        assert_eq!(scope.read(second).unwrap(), Value::from(2));

        let (cells, _) = scope.finish();
        assert_eq!(cells, vec![first, second]);
    }

    #[test]
    fn later_renders_reuse_slots_and_ignore_initial() {
        let store = store();
        let owner = InstanceId::next();

        let mut scope = Scope::new(&store, owner, Vec::new(), true);
        let cell = scope.cell(10).unwrap();
        let (cells, _) = scope.finish();

        store.write(cell, Value::from(99));
        let mut scope = Scope::new(&store, owner, cells, false);
        let again = scope.cell(10).unwrap();
        assert_eq!(again, cell);
        assert_eq!(scope.read(again).unwrap(), Value::from(99));
    }

    #[test]
    fn slot_overflow_after_first_render_is_an_error() {
        let store = store();
        let owner = InstanceId::next();

        let mut scope = Scope::new(&store, owner, Vec::new(), true);
        scope.cell(0).unwrap();
        let (cells, _) = scope.finish();

        let mut scope = Scope::new(&store, owner, cells, false);
        scope.cell(0).unwrap();
        assert_eq!(scope.cell(1), Err(ConfigError::CellSlotMismatch));
    }

    #[test]
    fn empty_watch_tuple_is_rejected_at_declaration() {
        let store = store();
        let owner = InstanceId::next();
        let mut scope = Scope::new(&store, owner, Vec::new(), true);

        let result = scope.effect(Deps::watch(Vec::new()), || None);
        assert_eq!(result, Err(ConfigError::EmptyDeps));

        scope.effect(Deps::once(), || None).unwrap();
        let (_, declared) = scope.finish();
        assert_eq!(declared.len(), 1);
    }
}
