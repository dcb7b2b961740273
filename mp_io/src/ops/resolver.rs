//! Dependency resolution: breadth-first expansion of a target mod's
//! dependency graph against the catalog and the current profile.
//!
//! The resolver is a read-only function of a profile snapshot. It produces
//! the minimal set of required changes: one decision per reached mod,
//! either reusing a compatible installed file or fetching the
//! most-preferred compatible one. Conflicts and cycles fail resolution;
//! the engine never guesses a side and never truncates a cycle.

use std::collections::{BTreeMap, VecDeque};

use mp_core::{
    ConflictSide, Decision, Dependency, Error, File, ModId, Profile, Reason, Resolution, Resolved,
};

use super::{Manager, ResolveOpts};

/// A dependency waiting to be expanded, together with the chain of
/// requesters that led to it (starting at the resolution root).
struct PendingDep {
    dep: Dependency,
    path: Vec<ModId>,
}

/// A decision made during this resolution, with the requiring path kept
/// for conflict reporting.
struct ChosenMod {
    resolved: Resolved,
    path: Vec<ModId>,
}

impl Manager {
    /// Expand the dependency graph for `target` and decide, for every mod
    /// reached, whether an existing install is reused or which file gets
    /// fetched. The root decision carries reason Direct, everything else
    /// Dependency.
    ///
    /// Returns an empty resolution when the target is already directly
    /// installed at the chosen file.
    pub async fn resolve(
        &self,
        profile: &Profile,
        target: ModId,
        opts: &ResolveOpts,
    ) -> Result<Resolution, Error> {
        let game_version = profile.game_version.clone();
        let root_mod = self.catalog.get_mod(target).await?;

        let root_file = match opts.requested_file {
            Some(file_id) => {
                let file = self.catalog.get_file(file_id).await?;
                if file.mod_id != target {
                    return Err(Error::MetadataCorrupt {
                        message: format!(
                            "file {file_id} belongs to mod {}, not {}",
                            file.mod_id, target
                        ),
                    });
                }
                if !file.supports(&game_version) {
                    return Err(Error::IncompatibleGameVersion {
                        slug: root_mod.slug.clone(),
                        game_version,
                    });
                }
                file
            }
            None => {
                self.preferred_file(target, &root_mod.slug, &game_version, opts)
                    .await?
            }
        };

        // Already directly installed at this exact file: nothing to change.
        if let Some(installed) = profile.get(target)
            && installed.file_id == root_file.id
            && installed.direct
        {
            return Ok(Resolution::default());
        }

        let mut chosen: BTreeMap<ModId, ChosenMod> = BTreeMap::new();
        let mut queue: VecDeque<PendingDep> = root_file
            .dependencies
            .iter()
            .map(|dep| PendingDep {
                dep: *dep,
                path: vec![target],
            })
            .collect();

        chosen.insert(
            target,
            ChosenMod {
                resolved: Resolved {
                    slug: root_mod.slug,
                    reason: Reason::Direct,
                    decision: Decision::Fetch { file: root_file },
                },
                path: vec![target],
            },
        );

        while let Some(PendingDep { dep, path }) = queue.pop_front() {
            // A mod already on its own requiring path is a cycle, never
            // resolved by truncation.
            if let Some(pos) = path.iter().position(|id| *id == dep.mod_id) {
                let mut cycle: Vec<ModId> = path[pos..].to_vec();
                cycle.push(dep.mod_id);
                return Err(Error::DependencyCycle { cycle });
            }

            let mut dep_path = path;
            dep_path.push(dep.mod_id);

            if let Some(existing) = chosen.get(&dep.mod_id) {
                // Reached again through another path. Only a pinned demand
                // for a different build is irreconcilable.
                if let Some(pinned) = dep.file_id
                    && pinned != existing.resolved.chosen_file_id()
                {
                    return Err(Error::VersionConflict {
                        mod_id: dep.mod_id,
                        first: ConflictSide {
                            file_id: existing.resolved.chosen_file_id(),
                            path: existing.path.clone(),
                        },
                        second: ConflictSide {
                            file_id: pinned,
                            path: dep_path,
                        },
                    });
                }
                continue;
            }

            // The slug is already known for installed mods; only fresh
            // dependencies need a catalog round-trip for their metadata.
            let slug = match profile.get(dep.mod_id) {
                Some(installed) => installed.slug.clone(),
                None => self.catalog.get_mod(dep.mod_id).await?.slug,
            };

            let decision = match dep.file_id {
                Some(pinned) => {
                    if profile
                        .get(dep.mod_id)
                        .is_some_and(|rec| rec.file_id == pinned)
                    {
                        Decision::Reuse { file_id: pinned }
                    } else {
                        let file = self.catalog.get_file(pinned).await?;
                        if file.mod_id != dep.mod_id {
                            return Err(Error::MetadataCorrupt {
                                message: format!(
                                    "file {pinned} belongs to mod {}, not {}",
                                    file.mod_id, dep.mod_id
                                ),
                            });
                        }
                        if !file.supports(&game_version) {
                            return Err(Error::IncompatibleGameVersion {
                                slug,
                                game_version,
                            });
                        }
                        self.queue_dependencies(&mut queue, &file, &dep_path);
                        Decision::Fetch { file }
                    }
                }
                None => {
                    if let Some(installed) = profile.get(dep.mod_id) {
                        // A compatible file is already installed; it simply
                        // gains the requester as a dependent at commit time.
                        Decision::Reuse {
                            file_id: installed.file_id,
                        }
                    } else {
                        let file = self
                            .preferred_file(dep.mod_id, &slug, &game_version, opts)
                            .await?;
                        self.queue_dependencies(&mut queue, &file, &dep_path);
                        Decision::Fetch { file }
                    }
                }
            };

            chosen.insert(
                dep.mod_id,
                ChosenMod {
                    resolved: Resolved {
                        slug,
                        reason: Reason::Dependency,
                        decision,
                    },
                    path: dep_path,
                },
            );
        }

        Ok(Resolution {
            mods: chosen
                .into_iter()
                .map(|(id, c)| (id, c.resolved))
                .collect(),
        })
    }

    fn queue_dependencies(&self, queue: &mut VecDeque<PendingDep>, file: &File, path: &[ModId]) {
        for dep in &file.dependencies {
            queue.push_back(PendingDep {
                dep: *dep,
                path: path.to_vec(),
            });
        }
    }

    /// The most-preferred file of a mod for the profile's game version,
    /// honoring the release-channel floor. The catalog returns files best
    /// first, so the first candidate wins.
    pub(crate) async fn preferred_file(
        &self,
        mod_id: ModId,
        slug: &str,
        game_version: &str,
        opts: &ResolveOpts,
    ) -> Result<File, Error> {
        let files = self.catalog.get_files_for(mod_id, game_version).await?;

        files
            .into_iter()
            .find(|f| f.is_candidate(game_version, opts.min_channel))
            .ok_or_else(|| Error::IncompatibleGameVersion {
                slug: slug.to_string(),
                game_version: game_version.to_string(),
            })
    }
}
