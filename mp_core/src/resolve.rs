//! Resolution output and dependency-first ordering.
//!
//! The resolver (an I/O concern, it talks to the catalog) produces a
//! [`Resolution`]: one decision per mod in the expanded subgraph. This
//! module orders the resulting actions with Kahn's algorithm so that every
//! dependency is installed before the mods that require it.
//!
//! # Determinism
//!
//! Mods at the same dependency level are processed in identifier order via
//! `BTreeMap`/`BTreeSet`, so the same resolution always yields the same plan.

use std::collections::{BTreeMap, BTreeSet};

use crate::addon::{File, FileId, ModId};
use crate::errors::Error;
use crate::plan::{Action, Reason};

/// Decision for one mod in a resolution subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A compatible file is already installed; the existing record only
    /// gains its requesters as dependents when the plan commits.
    Reuse { file_id: FileId },
    /// Install or upgrade to this file.
    Fetch { file: File },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub slug: String,
    pub reason: Reason,
    pub decision: Decision,
}

impl Resolved {
    pub fn chosen_file_id(&self) -> FileId {
        match &self.decision {
            Decision::Reuse { file_id } => *file_id,
            Decision::Fetch { file } => file.id,
        }
    }
}

/// The minimal set of required changes for one resolution: a decision for
/// every mod in the subgraph, keyed by mod identifier. Dependency edges are
/// carried by the chosen files themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub mods: BTreeMap<ModId, Resolved>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}

/// Map from mod id to number of unordered dependencies within the set
type InDegreeMap = BTreeMap<ModId, usize>;

/// Map from mod id to the set of actions that depend on it
type AdjacencyMap = BTreeMap<ModId, BTreeSet<ModId>>;

/// Order install/upgrade actions dependency-first.
///
/// Edges are taken from each action's resolved file: a dependency that also
/// has an action in the set must be committed earlier. Dependencies without
/// an action (reused installs) impose no ordering.
///
/// # Errors
/// `DependencyCycle` if not every action can be ordered. The resolver
/// rejects cycles while expanding, so this is a backstop for merged plans.
pub fn order_actions(actions: Vec<Action>) -> Result<Vec<Action>, Error> {
    let mut by_id: BTreeMap<ModId, Action> = BTreeMap::new();
    for action in actions {
        by_id.insert(action.mod_id, action);
    }

    let (mut indegree, adjacency) = build_graph(&by_id);

    let mut ready: BTreeSet<ModId> = indegree
        .iter()
        .filter_map(|(id, count)| if *count == 0 { Some(*id) } else { None })
        .collect();

    let mut ordered = Vec::with_capacity(by_id.len());
    while let Some(id) = ready.iter().next().copied() {
        ready.remove(&id);
        ordered.push(id);
        if let Some(children) = adjacency.get(&id) {
            for child in children {
                if let Some(count) = indegree.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*child);
                    }
                }
            }
        }
    }

    if ordered.len() != by_id.len() {
        let cycle: Vec<ModId> = indegree
            .into_iter()
            .filter_map(|(id, count)| if count > 0 { Some(id) } else { None })
            .collect();
        return Err(Error::DependencyCycle { cycle });
    }

    Ok(ordered
        .into_iter()
        .map(|id| by_id.remove(&id).unwrap())
        .collect())
}

fn build_graph(by_id: &BTreeMap<ModId, Action>) -> (InDegreeMap, AdjacencyMap) {
    let mut indegree: InDegreeMap = by_id.keys().map(|id| (*id, 0)).collect();
    let mut adjacency: AdjacencyMap = BTreeMap::new();

    for (id, action) in by_id {
        let Some(file) = action.file() else {
            continue;
        };
        for dep in &file.dependencies {
            if !by_id.contains_key(&dep.mod_id) || dep.mod_id == *id {
                continue;
            }
            if let Some(count) = indegree.get_mut(id) {
                *count += 1;
            }
            adjacency.entry(dep.mod_id).or_default().insert(*id);
        }
    }

    (indegree, adjacency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addon::Dependency;
    use crate::addon::ReleaseChannel;
    use crate::plan::Reason;
    use chrono::TimeZone;
    use chrono::Utc;
    use std::collections::BTreeSet as Set;

    fn file_with_deps(id: FileId, mod_id: ModId, deps: &[ModId]) -> File {
        File {
            id,
            mod_id,
            display_name: format!("{mod_id}-1.0"),
            file_name: format!("{mod_id}-1.0.jar"),
            date: Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap(),
            release: ReleaseChannel::Release,
            game_versions: Set::from(["1.10.2".to_string()]),
            dependencies: deps.iter().map(|d| Dependency::on(*d)).collect(),
            url: format!("https://example.invalid/files/{id}"),
        }
    }

    fn install(mod_id: ModId, deps: &[ModId]) -> Action {
        Action::install(
            mod_id,
            format!("mod-{mod_id}"),
            file_with_deps(mod_id * 10, mod_id, deps),
            Reason::Dependency,
        )
    }

    fn position(ordered: &[Action], mod_id: ModId) -> usize {
        ordered.iter().position(|a| a.mod_id == mod_id).unwrap()
    }

    #[test]
    fn orders_diamond_dependency_first() {
        let actions = vec![
            install(1, &[2, 3]),
            install(2, &[4]),
            install(3, &[4]),
            install(4, &[]),
        ];

        let ordered = order_actions(actions).unwrap();
        assert!(position(&ordered, 4) < position(&ordered, 2));
        assert!(position(&ordered, 4) < position(&ordered, 3));
        assert!(position(&ordered, 2) < position(&ordered, 1));
        assert!(position(&ordered, 3) < position(&ordered, 1));
    }

    #[test]
    fn ignores_dependencies_outside_the_action_set() {
        let actions = vec![install(1, &[99])];
        let ordered = order_actions(actions).unwrap();
        assert_eq!(ordered.len(), 1);
    }

    #[test]
    fn detects_cycles_as_backstop() {
        let actions = vec![install(1, &[2]), install(2, &[1])];
        let err = order_actions(actions).unwrap_err();
        assert!(matches!(err, Error::DependencyCycle { .. }));
    }

    proptest::proptest! {
        /// Every dependency action precedes its dependents, for arbitrary
        /// layered graphs of depth >= 4.
        #[test]
        fn topological_invariant_holds(seed in 0u64..500) {
            // Five layers; each mod depends on one mod of the layer above,
            // picked from the seed. Layer k mod ids are 10*k..10*k+3.
            let mut actions = Vec::new();
            for layer in 0u64..5 {
                for slot in 0u64..3 {
                    let id = 10 * layer + slot;
                    let deps: Vec<ModId> = if layer == 0 {
                        Vec::new()
                    } else {
                        vec![10 * (layer - 1) + (seed + id) % 3]
                    };
                    actions.push(install(id, &deps));
                }
            }

            let ordered = order_actions(actions).unwrap();
            for action in &ordered {
                let file = action.file().unwrap();
                for dep in &file.dependencies {
                    let dep_pos = position(&ordered, dep.mod_id);
                    let own_pos = position(&ordered, action.mod_id);
                    proptest::prop_assert!(dep_pos < own_pos);
                }
            }
        }
    }
}
