//! The post-commit effect pass.
//!
//! Effects are declared each render through the component's scope, in
//! slot order. After the reconciler has produced the commit's patches,
//! the runtime walks the re-rendered instances in depth-first pre-order
//! and hands each one to [`EffectScheduler::after_commit`], which runs
//! the records that are due and refreshes their snapshots.

use tracing::trace;

use crate::component::Instance;
use crate::error::ConfigError;

use super::record::{Deps, EffectBody, EffectRecord};

/// One effect declaration collected during a render.
pub(crate) struct DeclaredEffect {
    pub(crate) deps: Deps,
    pub(crate) body: EffectBody,
}

/// Runs dependency-gated effects after each commit.
#[derive(Debug, Default)]
pub struct EffectScheduler {
    total_runs: u64,
}

impl EffectScheduler {
    /// Create a scheduler with no runs recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total effect bodies executed since creation.
    pub fn total_runs(&self) -> u64 {
        self.total_runs
    }

    /// Install the effect declarations collected by a render into the
    /// instance's slots.
    ///
    /// The first render creates the slots; later renders must declare
    /// the same number of effects, in the same order, and only refresh
    /// each slot's policy and body. Snapshots and pending cleanups are
    /// preserved across renders.
    pub(crate) fn install(
        &self,
        instance: &mut Instance,
        declared: Vec<DeclaredEffect>,
    ) -> Result<(), ConfigError> {
        if !instance.effects_installed {
            instance.effects = declared
                .into_iter()
                .map(|effect| EffectRecord::new(effect.deps, effect.body))
                .collect();
            instance.effects_installed = true;
            return Ok(());
        }

        if declared.len() != instance.effects.len() {
            return Err(ConfigError::EffectSlotMismatch);
        }
        for (record, effect) in instance.effects.iter_mut().zip(declared) {
            record.update(effect.deps, effect.body);
        }
        Ok(())
    }

    /// Register an effect outside a render, e.g. from host code. The
    /// record joins the instance's post-commit evaluation after its
    /// declared slots.
    pub(crate) fn register_extra(
        &self,
        instance: &mut Instance,
        deps: Deps,
        body: EffectBody,
    ) -> Result<(), ConfigError> {
        deps.validate()?;
        instance.extra_effects.push(EffectRecord::new(deps, body));
        Ok(())
    }

    /// Run every due effect of one committed instance, declaration order
    /// first, externally registered records after. Returns how many
    /// bodies ran.
    pub(crate) fn after_commit(&mut self, instance: &mut Instance) -> usize {
        let mut ran = 0;
        for record in instance
            .effects
            .iter_mut()
            .chain(instance.extra_effects.iter_mut())
        {
            if record.due() {
                record.run();
                ran += 1;
            }
        }
        self.total_runs += ran as u64;
        if ran > 0 {
            trace!(instance = instance.id.raw(), ran, "effects committed");
        }
        ran
    }
}
