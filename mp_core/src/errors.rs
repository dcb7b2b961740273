use std::fmt;

use crate::addon::{FileId, ModId};

/// One side of an irreconcilable version demand: the build a requiring
/// path ended up asking for, plus the chain of mod identifiers that led
/// there (starting at the resolution root).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictSide {
    pub file_id: FileId,
    pub path: Vec<ModId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    NotFound {
        what: String,
    },
    NotInstalled {
        name: String,
    },
    IncompatibleGameVersion {
        slug: String,
        game_version: String,
    },
    VersionConflict {
        mod_id: ModId,
        first: ConflictSide,
        second: ConflictSide,
    },
    DependencyCycle {
        cycle: Vec<ModId>,
    },
    DependencyConflict {
        slug: String,
        dependents: Vec<ModId>,
    },
    MetadataCorrupt {
        message: String,
    },
    NetworkFailure {
        message: String,
    },
    PartialPlanFailure {
        completed: Vec<ModId>,
        failed: ModId,
        message: String,
    },
}

fn render_path(path: &[ModId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { what } => {
                write!(
                    f,
                    "{} not found in the catalog\n  hint: run 'mp search' to look up available mods",
                    what
                )
            }
            Error::NotInstalled { name } => {
                write!(
                    f,
                    "mod '{}' is not installed in this profile\n  hint: run 'mp install {}' to install it",
                    name, name
                )
            }
            Error::IncompatibleGameVersion { slug, game_version } => {
                write!(
                    f,
                    "no file of '{}' supports game version {}",
                    slug, game_version
                )
            }
            Error::VersionConflict {
                mod_id,
                first,
                second,
            } => {
                write!(
                    f,
                    "conflicting versions demanded for mod {}:\n  file {} via {}\n  file {} via {}\n  hint: the engine never picks a side; adjust the requested mods",
                    mod_id,
                    first.file_id,
                    render_path(&first.path),
                    second.file_id,
                    render_path(&second.path)
                )
            }
            Error::DependencyCycle { cycle } => {
                write!(
                    f,
                    "dependency cycle detected: {}\n  hint: this is likely a catalog bug; please report it upstream",
                    render_path(cycle)
                )
            }
            Error::DependencyConflict { slug, dependents } => {
                let rendered = dependents
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "cannot remove '{}': still required by {}\n  hint: pass --force to remove it together with its dependents",
                    slug, rendered
                )
            }
            Error::MetadataCorrupt { message } => {
                write!(
                    f,
                    "profile metadata error: {}\n  hint: run 'mp new' to create a fresh profile if the file is damaged",
                    message
                )
            }
            Error::NetworkFailure { message } => {
                write!(
                    f,
                    "network error: {}\n  hint: check your internet connection and try again",
                    message
                )
            }
            Error::PartialPlanFailure {
                completed,
                failed,
                message,
            } => {
                write!(f, "plan stopped at mod {}: {}", failed, message)?;
                if completed.is_empty() {
                    write!(f, "\n  no actions were committed")?;
                } else {
                    write!(
                        f,
                        "\n  committed before the failure: {}",
                        completed
                            .iter()
                            .map(|id| id.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )?;
                }
                write!(
                    f,
                    "\n  hint: re-run the same command to resume; committed mods are kept"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_display_names_both_paths() {
        let err = Error::VersionConflict {
            mod_id: 50,
            first: ConflictSide {
                file_id: 2001,
                path: vec![100, 50],
            },
            second: ConflictSide {
                file_id: 2002,
                path: vec![100, 175, 50],
            },
        };

        let msg = err.to_string();
        assert!(msg.contains("2001"));
        assert!(msg.contains("2002"));
        assert!(msg.contains("100 -> 50"));
        assert!(msg.contains("100 -> 175 -> 50"));
    }

    #[test]
    fn dependency_conflict_display_lists_dependents() {
        let err = Error::DependencyConflict {
            slug: "forge-multipart".to_string(),
            dependents: vec![100, 230],
        };

        let msg = err.to_string();
        assert!(msg.contains("forge-multipart"));
        assert!(msg.contains("100, 230"));
        assert!(msg.contains("--force"));
    }

    #[test]
    fn partial_plan_failure_display_distinguishes_committed() {
        let err = Error::PartialPlanFailure {
            completed: vec![50],
            failed: 100,
            message: "network error".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("stopped at mod 100"));
        assert!(msg.contains("committed before the failure: 50"));
        assert!(msg.contains("re-run"));
    }

    #[test]
    fn not_installed_display_includes_install_hint() {
        let err = Error::NotInstalled {
            name: "iron-chests".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("iron-chests"));
        assert!(msg.contains("mp install"));
    }
}
