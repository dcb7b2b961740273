//! Plan execution: applying actions against the profile, one committed
//! action at a time.
//!
//! Each action's persistence is atomic, but the plan as a whole is not
//! transactional: a failure stops execution, keeps everything committed so
//! far, and the report says exactly how far it got. Re-running the same
//! logical operation resumes naturally, since re-resolution against the
//! updated profile skips already satisfied dependencies.

use std::collections::BTreeSet;
use std::fs;

use mp_core::{
    Action, ActionKind, Error, InstalledMod, ModId, Plan, Profile, Reason, collect_orphans,
};

use super::Manager;

/// The action execution stopped at, and why.
#[derive(Debug, Clone)]
pub struct FailedAction {
    pub action: Action,
    pub error: Error,
}

/// Outcome of one plan execution: what was committed, what the end-of-plan
/// orphan sweep reclaimed, and where execution stopped if it did.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub completed: Vec<Action>,
    pub removed_orphans: Vec<ModId>,
    pub failed: Option<FailedAction>,
}

impl ExecutionReport {
    pub fn fully_applied(&self) -> bool {
        self.failed.is_none()
    }

    /// The partial-failure error form of this report, if it stopped early.
    pub fn to_error(&self) -> Option<Error> {
        self.failed.as_ref().map(|f| Error::PartialPlanFailure {
            completed: self.completed.iter().map(|a| a.mod_id).collect(),
            failed: f.action.mod_id,
            message: f.error.to_string(),
        })
    }
}

impl Manager {
    /// Apply a plan's actions strictly in order, persisting the profile
    /// after every action. Completed actions are never rolled back; after
    /// a fully executed plan, mods the plan left orphaned (an upgrade that
    /// dropped a dependency) are swept out.
    pub async fn execute(&self, profile: &mut Profile, plan: Plan) -> Result<ExecutionReport, Error> {
        let mut report = ExecutionReport::default();

        for action in plan.actions {
            let committed = match self.apply(profile, &action).await {
                Ok(()) => self.store.save(profile),
                Err(e) => Err(e),
            };

            match committed {
                Ok(()) => report.completed.push(action),
                Err(error) => {
                    report.failed = Some(FailedAction { action, error });
                    return Ok(report);
                }
            }
        }

        let orphans = collect_orphans(profile);
        if !orphans.is_empty() {
            for mod_id in &orphans {
                if let Some(rec) = profile.remove(*mod_id) {
                    self.discard_artifact(&rec.file_name);
                }
            }
            self.store.save(profile)?;
            report.removed_orphans = orphans;
        }

        Ok(report)
    }

    async fn apply(&self, profile: &mut Profile, action: &Action) -> Result<(), Error> {
        match &action.kind {
            ActionKind::Install { file } | ActionKind::Upgrade { file } => {
                self.transfer.fetch(file, &self.mods_dir).await?;

                let previous = profile.get(action.mod_id).cloned();

                // An upgrade that renames the artifact leaves the old one
                // behind; drop it once the new one is in place.
                if let Some(ref prev) = previous
                    && prev.file_name != file.file_name
                {
                    self.discard_artifact(&prev.file_name);
                }

                // Retire dependent edges the old file held but the new one
                // dropped; the end-of-plan sweep reclaims anything that
                // loses its last dependent this way.
                let new_deps: BTreeSet<ModId> =
                    file.dependencies.iter().map(|d| d.mod_id).collect();
                for (other, rec) in profile.mods.iter_mut() {
                    if *other != action.mod_id && !new_deps.contains(other) {
                        rec.dependents.remove(&action.mod_id);
                    }
                }

                // A Direct action always promotes, even when the mod
                // pre-existed as a dependency-only install; a Dependency
                // action never demotes.
                let direct = action.reason == Reason::Direct
                    || previous.as_ref().is_some_and(|p| p.direct);

                profile.record(InstalledMod {
                    mod_id: action.mod_id,
                    slug: action.slug.clone(),
                    file_id: file.id,
                    version_label: file.display_name.clone(),
                    file_name: file.file_name.clone(),
                    direct,
                    dependents: previous.map(|p| p.dependents).unwrap_or_default(),
                });

                // Plan order guarantees dependencies committed first, so
                // every resolved dependency already has a record to update.
                for dep in &file.dependencies {
                    if let Some(rec) = profile.mods.get_mut(&dep.mod_id) {
                        rec.dependents.insert(action.mod_id);
                    }
                }

                Ok(())
            }
            ActionKind::Remove => {
                if let Some(rec) = profile.remove(action.mod_id) {
                    self.discard_artifact(&rec.file_name);
                }
                Ok(())
            }
        }
    }

    /// Best-effort artifact deletion; bookkeeping consistency matters more
    /// than a stray file in the mods directory.
    fn discard_artifact(&self, file_name: &str) {
        let path = self.mods_dir.join(file_name);
        if path.exists()
            && let Err(e) = fs::remove_file(&path)
        {
            eprintln!("    Warning: failed to remove {}: {e}", path.display());
        }
    }
}
