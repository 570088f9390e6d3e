//! Rename coordination.
//!
//! A rename moves through `Validating → Renaming → Propagating → Done`.
//! Validation failures stop before anything is touched. Once the registry
//! has been swapped, a failure to persist puts the old name back before the
//! error is returned, so no caller ever observes half a rename.
//!
//! Service discovery is told about the new name after the lock is released.
//! That step is best effort: a resolver that is down must not undo a rename
//! that already succeeded locally.

use crate::{
    error::{ContainerError, Result},
    event::Event,
    manager::{ContainerManager, Inner},
    names::RenamePlan,
    state::ContainerId,
    store::StateStore,
};
use tracing::{info, trace};

/// Phase of a rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenamePhase {
    /// Resolving the container and checking the new name.
    Validating,
    /// Swapping the name in the registry and the container record.
    Renaming,
    /// Computing affected links and persisting the result.
    Propagating,
    /// Committed.
    Done,
    /// Aborted; nothing changed.
    Failed,
}

/// Result of a committed rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    /// Renamed container.
    pub id: ContainerId,
    /// Name before the rename.
    pub old_name: String,
    /// Name after the rename.
    pub new_name: String,
    /// Containers whose rendered links changed.
    pub dependents: Vec<ContainerId>,
}

/// A rename in progress over exclusively held state.
pub(crate) struct RenameTxn<'a> {
    inner: &'a mut Inner,
    phase: RenamePhase,
    plan: Option<RenamePlan>,
    prev_generated: bool,
    dependents: Vec<ContainerId>,
}

impl<'a> RenameTxn<'a> {
    pub(crate) fn new(inner: &'a mut Inner) -> Self {
        Self {
            inner,
            phase: RenamePhase::Validating,
            plan: None,
            prev_generated: false,
            dependents: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn phase(&self) -> RenamePhase {
        self.phase
    }

    fn enter(&mut self, phase: RenamePhase) {
        trace!(from = ?self.phase, to = ?phase, "rename phase");
        self.phase = phase;
    }

    /// Checks the request without mutating anything.
    pub(crate) fn validate(&mut self, name_or_id: &str, new_name: &str) -> Result<()> {
        match self.inner.names.plan_rename(name_or_id, new_name) {
            Ok(plan) if self.inner.containers.contains_key(&plan.id) => {
                self.plan = Some(plan);
                Ok(())
            }
            Ok(_) => {
                self.enter(RenamePhase::Failed);
                Err(ContainerError::not_found(name_or_id))
            }
            Err(e) => {
                self.enter(RenamePhase::Failed);
                Err(e)
            }
        }
    }

    /// Swaps the name in the registry and in the container record.
    pub(crate) fn apply(&mut self) -> Result<()> {
        let plan = self.validated_plan()?.clone();
        self.enter(RenamePhase::Renaming);

        self.inner.names.commit(&plan);
        if let Some(container) = self.inner.containers.get_mut(&plan.id) {
            self.prev_generated = container.generated_name;
            container.name.clone_from(&plan.new_name);
            container.generated_name = false;
        }
        Ok(())
    }

    /// Collects the affected links and persists the new state, rolling back
    /// on failure.
    pub(crate) fn propagate(&mut self, store: &dyn StateStore) -> Result<()> {
        let plan = self.validated_plan()?.clone();
        self.enter(RenamePhase::Propagating);

        // Links are stored by ID; only their rendering changes.
        self.dependents = self.inner.links.rewrite_on_rename(&plan.id);

        if let Err(e) = store.save(&self.inner.snapshot()) {
            self.rollback(&plan);
            return Err(e);
        }
        Ok(())
    }

    fn rollback(&mut self, plan: &RenamePlan) {
        self.inner.names.commit(&plan.reversed());
        if let Some(container) = self.inner.containers.get_mut(&plan.id) {
            container.name.clone_from(&plan.old_name);
            container.generated_name = self.prev_generated;
        }
        self.dependents.clear();
        self.enter(RenamePhase::Failed);
    }

    pub(crate) fn finish(mut self) -> Result<RenameOutcome> {
        let plan = self.validated_plan()?.clone();
        self.enter(RenamePhase::Done);
        Ok(RenameOutcome {
            id: plan.id,
            old_name: plan.old_name,
            new_name: plan.new_name,
            dependents: self.dependents,
        })
    }

    fn validated_plan(&self) -> Result<&RenamePlan> {
        match (&self.plan, self.phase) {
            (Some(plan), phase) if phase != RenamePhase::Failed => Ok(plan),
            _ => Err(ContainerError::Runtime(format!(
                "rename in phase {:?} has no valid plan",
                self.phase
            ))),
        }
    }
}

impl ContainerManager {
    /// Renames a container.
    ///
    /// `name_or_id` is a name or a full ID; see [`Self::resolve`] for
    /// prefixes. The new name may carry a leading `/`. Links from and to
    /// the container keep working and render with the new name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `SameName`, `InvalidName` or `NameConflict` on
    /// validation failure, or a store error if the result cannot be
    /// persisted. In every error case the container keeps its old name.
    pub async fn rename(&self, name_or_id: &str, new_name: &str) -> Result<RenameOutcome> {
        let outcome = self.rename_committed(name_or_id, new_name)?;

        info!(
            id = %outcome.id.short(),
            old_name = %outcome.old_name,
            new_name = %outcome.new_name,
            dependents = outcome.dependents.len(),
            "container renamed"
        );

        self.register(&outcome.id).await;
        self.events().publish(Event::Renamed {
            id: outcome.id.clone(),
            old_name: outcome.old_name.clone(),
            new_name: outcome.new_name.clone(),
            dependents: outcome.dependents.clone(),
        });
        Ok(outcome)
    }

    /// Runs the local part of a rename under the write lock.
    fn rename_committed(&self, name_or_id: &str, new_name: &str) -> Result<RenameOutcome> {
        let mut inner = self.write()?;
        let mut txn = RenameTxn::new(&mut inner);

        txn.validate(name_or_id, new_name)?;
        txn.apply()?;
        txn.propagate(self.store())?;
        txn.finish()
    }
}
