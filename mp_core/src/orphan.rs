//! Orphan collection: reachability after removals and upgrades.
//!
//! All functions here are read-only over a profile snapshot. They simulate
//! removals on a copied view of the dependents sets and describe what an
//! executor commit must do; they never mutate state. The cascade is an
//! iterative worklist with an explicit queued set, so a mod can never be
//! scheduled for removal twice and cycle safety is structural.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::addon::ModId;
use crate::profile::Profile;

/// Simulated view of the profile: direct flag plus remaining dependents.
struct SimEntry {
    direct: bool,
    dependents: BTreeSet<ModId>,
}

fn simulate(profile: &Profile) -> BTreeMap<ModId, SimEntry> {
    profile
        .mods
        .iter()
        .map(|(id, rec)| {
            (
                *id,
                SimEntry {
                    direct: rec.direct,
                    dependents: rec.dependents.clone(),
                },
            )
        })
        .collect()
}

/// Drain a removal worklist: each removed mod is detached from every
/// remaining dependents set, and any dependency-only mod that just lost its
/// last dependent is appended in discovery order.
fn drain(sim: &mut BTreeMap<ModId, SimEntry>, seeds: Vec<ModId>) -> Vec<ModId> {
    let mut queued: BTreeSet<ModId> = seeds.iter().copied().collect();
    let mut queue: VecDeque<ModId> = seeds.into();
    let mut order = Vec::new();

    while let Some(id) = queue.pop_front() {
        if sim.remove(&id).is_none() {
            continue;
        }
        order.push(id);

        let mut newly_orphaned = Vec::new();
        for (other, entry) in sim.iter_mut() {
            if entry.dependents.remove(&id) && entry.dependents.is_empty() && !entry.direct {
                newly_orphaned.push(*other);
            }
        }
        for other in newly_orphaned {
            if queued.insert(other) {
                queue.push_back(other);
            }
        }
    }

    order
}

/// Compute the full removal cascade for one mod.
///
/// The target is always first, followed by each newly orphaned
/// dependency-only mod in discovery order — the dependents-before-dependency
/// order the plan builder commits in.
pub fn cascade_removal(profile: &Profile, target: ModId) -> Vec<ModId> {
    let mut sim = simulate(profile);
    drain(&mut sim, vec![target])
}

/// Forced removal cascade: the target's transitive dependents whose own
/// dependents are all being removed go first (dependents before the mods
/// they require), then the target, then the ordinary orphan cascade for
/// everything that lost its last dependent.
pub fn forced_cascade(profile: &Profile, target: ModId) -> Vec<ModId> {
    let mut sim = simulate(profile);
    drain(&mut sim, forced_roots(profile, target))
}

/// Peel the target's transitive dependents in dependents-first order. A
/// dependent is included only once everything requiring it is itself being
/// removed; the target closes the list regardless of remaining dependents.
fn forced_roots(profile: &Profile, target: ModId) -> Vec<ModId> {
    // Transitive dependents of the target, excluding the target itself.
    let mut closure: BTreeSet<ModId> = BTreeSet::new();
    let mut frontier = vec![target];
    while let Some(id) = frontier.pop() {
        let Some(rec) = profile.get(id) else { continue };
        for dep in &rec.dependents {
            if *dep != target && closure.insert(*dep) {
                frontier.push(*dep);
            }
        }
    }

    let mut emitted: BTreeSet<ModId> = BTreeSet::new();
    let mut order = Vec::with_capacity(closure.len() + 1);
    loop {
        let next = closure.iter().copied().find(|id| {
            !emitted.contains(id)
                && profile
                    .get(*id)
                    .map(|rec| rec.dependents.iter().all(|d| emitted.contains(d)))
                    .unwrap_or(false)
        });
        match next {
            Some(id) => {
                emitted.insert(id);
                order.push(id);
            }
            None => break,
        }
    }

    order.push(target);
    order
}

/// All mods currently orphaned, expanded through the cascade: removing an
/// orphan can orphan the mods it was the last dependent of. Backs the
/// executor's end-of-plan sweep.
pub fn collect_orphans(profile: &Profile) -> Vec<ModId> {
    let seeds: Vec<ModId> = profile
        .mods
        .values()
        .filter(|rec| rec.is_orphan())
        .map(|rec| rec.mod_id)
        .collect();

    if seeds.is_empty() {
        return Vec::new();
    }

    let mut sim = simulate(profile);
    drain(&mut sim, seeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::InstalledMod;

    fn installed(mod_id: ModId, direct: bool, dependents: &[ModId]) -> InstalledMod {
        InstalledMod {
            mod_id,
            slug: format!("mod-{mod_id}"),
            file_id: mod_id * 10,
            version_label: "1.0".to_string(),
            file_name: format!("mod-{mod_id}.jar"),
            direct,
            dependents: dependents.iter().copied().collect(),
        }
    }

    /// A(direct) and C(direct) both depend on B.
    fn shared_dependency_profile() -> Profile {
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(1, true, &[])); // A
        profile.record(installed(2, false, &[1, 3])); // B
        profile.record(installed(3, true, &[])); // C
        profile
    }

    #[test]
    fn shared_dependency_survives_first_removal() {
        let profile = shared_dependency_profile();
        assert_eq!(cascade_removal(&profile, 1), vec![1]);
    }

    #[test]
    fn last_dependent_removal_cascades() {
        let mut profile = shared_dependency_profile();
        profile.remove(1);
        assert_eq!(cascade_removal(&profile, 3), vec![3, 2]);
    }

    #[test]
    fn cascade_runs_through_chains() {
        // top -> mid -> leaf, all dependency-only below top.
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(1, true, &[]));
        profile.record(installed(2, false, &[1]));
        profile.record(installed(3, false, &[2]));

        assert_eq!(cascade_removal(&profile, 1), vec![1, 2, 3]);
    }

    #[test]
    fn direct_mods_are_never_collected() {
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(1, true, &[]));
        profile.record(installed(2, true, &[1]));

        assert_eq!(cascade_removal(&profile, 1), vec![1]);
    }

    #[test]
    fn forced_cascade_removes_dependents_first() {
        // 100 depends on 50; removing 50 with force drops 100 first.
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(50, false, &[100]));
        profile.record(installed(100, true, &[]));

        assert_eq!(forced_cascade(&profile, 50), vec![100, 50]);
    }

    #[test]
    fn forced_cascade_peels_transitive_dependents_in_order() {
        // 100 depends on 50, 200 depends on 100: chain peels 200, 100, 50.
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(50, false, &[100]));
        profile.record(installed(100, true, &[200]));
        profile.record(installed(200, true, &[]));

        assert_eq!(forced_cascade(&profile, 50), vec![200, 100, 50]);
    }

    #[test]
    fn collect_orphans_expands_through_cascade() {
        // 2 is orphaned; once gone, 3 (only dependent was 2) follows.
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(1, true, &[]));
        profile.record(installed(2, false, &[]));
        profile.record(installed(3, false, &[2]));

        assert_eq!(collect_orphans(&profile), vec![2, 3]);
    }

    #[test]
    fn collect_orphans_is_empty_on_consistent_profiles() {
        assert!(collect_orphans(&shared_dependency_profile()).is_empty());
    }

    #[test]
    fn cascade_never_queues_twice() {
        // Diamond: 1 -> {2, 3} -> 4; all dependency-only below 1.
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(1, true, &[]));
        profile.record(installed(2, false, &[1]));
        profile.record(installed(3, false, &[1]));
        profile.record(installed(4, false, &[2, 3]));

        let order = cascade_removal(&profile, 1);
        assert_eq!(order, vec![1, 2, 3, 4]);
    }
}
