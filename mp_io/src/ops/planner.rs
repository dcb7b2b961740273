//! Plan construction: turning resolver output and upgrade/removal intents
//! into ordered, conflict-checked action plans.

use std::collections::BTreeMap;

use mp_core::{
    Action, ConflictSide, Decision, Error, ModId, Plan, Profile, Reason, Resolution, Resolved,
    cascade_removal, forced_cascade, order_actions,
};

use super::{Manager, ResolveOpts};

impl Manager {
    /// Build an install (or upgrade) plan rooted at `target`.
    ///
    /// Each Fetch decision becomes an Upgrade when the mod is already
    /// installed with a different file, else an Install; reused installs
    /// contribute no action. Actions are ordered dependency-first. An
    /// already satisfied target yields an empty plan.
    pub async fn plan_install(
        &self,
        profile: &Profile,
        target: ModId,
        opts: &ResolveOpts,
    ) -> Result<Plan, Error> {
        let resolution = self.resolve(profile, target, opts).await?;
        Ok(Plan::new(actions_from(profile, resolution)?))
    }

    /// Upgrade one installed mod to its most-preferred compatible file.
    /// A no-op (empty plan) when the installed file is already preferred.
    pub async fn plan_upgrade_one(
        &self,
        profile: &Profile,
        target: ModId,
        opts: &ResolveOpts,
    ) -> Result<Plan, Error> {
        let installed = profile.get(target).ok_or_else(|| Error::NotInstalled {
            name: target.to_string(),
        })?;

        let preferred = self
            .preferred_file(target, &installed.slug, &profile.game_version, opts)
            .await?;
        if preferred.id == installed.file_id {
            return Ok(Plan::default());
        }

        self.plan_install(profile, target, opts).await
    }

    /// Upgrade every directly installed mod that has a newer preferred
    /// file. Sub-plans are merged with shared dependency actions appearing
    /// once; mods that are already up to date are silently omitted, and
    /// mods the catalog no longer serves are skipped with a note.
    pub async fn plan_upgrade_all(
        &self,
        profile: &Profile,
        opts: &ResolveOpts,
    ) -> Result<Plan, Error> {
        let directs: Vec<_> = profile
            .direct_mods()
            .map(|rec| (rec.mod_id, rec.file_id, rec.slug.clone()))
            .collect();

        // Preference queries are independent; fetch order has no bearing
        // on the outcome.
        let futures: Vec<_> = directs
            .iter()
            .map(|(mod_id, _, _)| self.catalog.get_files_for(*mod_id, &profile.game_version))
            .collect();
        let results = futures::future::join_all(futures).await;

        let mut merged: Vec<Action> = Vec::new();
        let mut provenance: BTreeMap<ModId, (usize, ModId)> = BTreeMap::new();

        for ((mod_id, installed_file, slug), files) in directs.iter().zip(results) {
            let files = match files {
                Ok(files) => files,
                Err(Error::NotFound { .. }) => {
                    eprintln!("    Note: skipping '{slug}' (no longer in the catalog)");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let preferred = files
                .iter()
                .find(|f| f.is_candidate(&profile.game_version, opts.min_channel));
            let Some(preferred) = preferred else {
                eprintln!(
                    "    Warning: no compatible file for '{slug}' on {}",
                    profile.game_version
                );
                continue;
            };

            if preferred.id == *installed_file {
                continue;
            }

            let sub = self.plan_install(profile, *mod_id, opts).await?;
            merge_actions(&mut merged, &mut provenance, *mod_id, sub)?;
        }

        Ok(Plan::new(order_actions(merged)?))
    }

    /// Build a removal plan for `target`.
    ///
    /// Fails with `DependencyConflict` while other mods still require the
    /// target, unless forced; a forced removal also takes down dependents
    /// whose own dependents are all being removed. Actions are emitted
    /// dependents-before-dependency, the commit order the executor needs.
    pub fn plan_removal(
        &self,
        profile: &Profile,
        target: ModId,
        force: bool,
    ) -> Result<Plan, Error> {
        let installed = profile.get(target).ok_or_else(|| Error::NotInstalled {
            name: target.to_string(),
        })?;

        if !installed.dependents.is_empty() && !force {
            return Err(Error::DependencyConflict {
                slug: installed.slug.clone(),
                dependents: installed.dependents.iter().copied().collect(),
            });
        }

        let ids = if force && !installed.dependents.is_empty() {
            forced_cascade(profile, target)
        } else {
            cascade_removal(profile, target)
        };

        let actions = ids
            .into_iter()
            .map(|mod_id| {
                let slug = profile
                    .get(mod_id)
                    .map(|rec| rec.slug.clone())
                    .unwrap_or_else(|| mod_id.to_string());
                let reason = if mod_id == target {
                    Reason::Direct
                } else {
                    Reason::Dependency
                };
                Action::remove(mod_id, slug, reason)
            })
            .collect();

        Ok(Plan::new(actions))
    }
}

/// Convert resolution decisions into actions and order them
/// dependency-first.
fn actions_from(profile: &Profile, resolution: Resolution) -> Result<Vec<Action>, Error> {
    let mut actions = Vec::new();

    for (mod_id, resolved) in resolution.mods {
        let Resolved {
            slug,
            reason,
            decision,
        } = resolved;

        match decision {
            Decision::Reuse { .. } => {}
            Decision::Fetch { file } => {
                let action = match profile.get(mod_id) {
                    Some(installed) if installed.file_id != file.id => {
                        Action::upgrade(mod_id, slug, file, reason)
                    }
                    _ => Action::install(mod_id, slug, file, reason),
                };
                actions.push(action);
            }
        }
    }

    order_actions(actions)
}

/// Merge one upgrade sub-plan into the combined action list. A mod shared
/// between sub-plans appears once; a Direct reason outranks Dependency.
/// Divergent file choices for the same mod are a conflict, never silently
/// collapsed.
fn merge_actions(
    merged: &mut Vec<Action>,
    provenance: &mut BTreeMap<ModId, (usize, ModId)>,
    root: ModId,
    sub: Plan,
) -> Result<(), Error> {
    for action in sub.actions {
        match provenance.get(&action.mod_id) {
            None => {
                provenance.insert(action.mod_id, (merged.len(), root));
                merged.push(action);
            }
            Some((idx, first_root)) => {
                let existing = &mut merged[*idx];
                let existing_file = existing.file().map(|f| f.id).unwrap_or_default();
                let new_file = action.file().map(|f| f.id).unwrap_or_default();

                if existing_file != new_file {
                    return Err(Error::VersionConflict {
                        mod_id: action.mod_id,
                        first: ConflictSide {
                            file_id: existing_file,
                            path: vec![*first_root, action.mod_id],
                        },
                        second: ConflictSide {
                            file_id: new_file,
                            path: vec![root, action.mod_id],
                        },
                    });
                }

                if action.reason == Reason::Direct {
                    existing.reason = Reason::Direct;
                }
            }
        }
    }

    Ok(())
}
