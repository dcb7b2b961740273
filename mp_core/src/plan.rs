//! Action plans: the ordered change lists produced by the planner and
//! applied, one committed action at a time, by the executor.

use std::fmt;

use crate::addon::{File, ModId};

/// Why an action exists: the user asked for this mod, or it is only needed
/// to satisfy another mod's requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Direct,
    Dependency,
}

/// What an action does. Install and Upgrade carry the fully resolved file so
/// the executor can transfer it and update dependents bookkeeping without
/// re-querying the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Install { file: File },
    Upgrade { file: File },
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub mod_id: ModId,
    pub slug: String,
    pub kind: ActionKind,
    pub reason: Reason,
}

impl Action {
    pub fn install(mod_id: ModId, slug: impl Into<String>, file: File, reason: Reason) -> Self {
        Self {
            mod_id,
            slug: slug.into(),
            kind: ActionKind::Install { file },
            reason,
        }
    }

    pub fn upgrade(mod_id: ModId, slug: impl Into<String>, file: File, reason: Reason) -> Self {
        Self {
            mod_id,
            slug: slug.into(),
            kind: ActionKind::Upgrade { file },
            reason,
        }
    }

    pub fn remove(mod_id: ModId, slug: impl Into<String>, reason: Reason) -> Self {
        Self {
            mod_id,
            slug: slug.into(),
            kind: ActionKind::Remove,
            reason,
        }
    }

    /// The file an Install or Upgrade will transfer; `None` for Remove.
    pub fn file(&self) -> Option<&File> {
        match &self.kind {
            ActionKind::Install { file } | ActionKind::Upgrade { file } => Some(file),
            ActionKind::Remove => None,
        }
    }

    pub fn is_remove(&self) -> bool {
        matches!(self.kind, ActionKind::Remove)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ActionKind::Install { file } => {
                write!(f, "install {} ({})", self.slug, file.display_name)
            }
            ActionKind::Upgrade { file } => {
                write!(f, "upgrade {} to {}", self.slug, file.display_name)
            }
            ActionKind::Remove => write!(f, "remove {}", self.slug),
        }
    }
}

/// An ordered, conflict-checked sequence of actions. Install/Upgrade plans
/// are dependency-before-dependent; removal plans are
/// dependents-before-dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}
