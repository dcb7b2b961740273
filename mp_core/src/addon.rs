//! Remote add-on data model: mods, files, release channels.
//!
//! These are fixed-shape structures populated from catalog responses and
//! validated at that boundary; the engine never holds live cross-references
//! between them, only identifiers resolved through a lookup.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable catalog identifier of a mod.
pub type ModId = u64;
/// Catalog identifier of a single downloadable build of a mod.
pub type FileId = u64;

/// Release channel of a mod file, ordered by stability.
///
/// `Release > Beta > Alpha`: when two files support the same game version,
/// the more stable channel always wins, regardless of publication date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    Alpha,
    Beta,
    Release,
}

impl ReleaseChannel {
    /// Parse a catalog release-type label ("Release", "beta", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "alpha" => Some(ReleaseChannel::Alpha),
            "beta" => Some(ReleaseChannel::Beta),
            "release" => Some(ReleaseChannel::Release),
            _ => None,
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseChannel::Alpha => write!(f, "alpha"),
            ReleaseChannel::Beta => write!(f, "beta"),
            ReleaseChannel::Release => write!(f, "release"),
        }
    }
}

impl FromStr for ReleaseChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReleaseChannel::from_label(s)
            .ok_or_else(|| format!("unknown release channel '{s}' (expected alpha, beta or release)"))
    }
}

/// A mod as described by the remote catalog. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Mod {
    pub id: ModId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
}

/// A dependency declared by a [`File`].
///
/// The common case is a bare mod identifier, resolved to a concrete file at
/// resolution time. Some catalog entries pin an exact build; a resolution
/// reaching the same mod through paths that demand different builds fails
/// rather than silently picking a side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub mod_id: ModId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<FileId>,
}

impl Dependency {
    pub fn on(mod_id: ModId) -> Self {
        Self {
            mod_id,
            file_id: None,
        }
    }

    pub fn pinned(mod_id: ModId, file_id: FileId) -> Self {
        Self {
            mod_id,
            file_id: Some(file_id),
        }
    }
}

/// A specific downloadable build of a mod.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: FileId,
    pub mod_id: ModId,
    /// Human-readable version label shown to the user.
    pub display_name: String,
    /// Artifact name on disk.
    pub file_name: String,
    pub date: DateTime<Utc>,
    pub release: ReleaseChannel,
    pub game_versions: BTreeSet<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub url: String,
}

impl File {
    /// Whether this file supports the given game version.
    pub fn supports(&self, game_version: &str) -> bool {
        self.game_versions.contains(game_version)
    }

    /// Whether this file is selectable for the given game version and
    /// release-channel floor.
    pub fn is_candidate(&self, game_version: &str, min_channel: ReleaseChannel) -> bool {
        self.supports(game_version) && self.release >= min_channel
    }
}

/// Preference order between two files of the same mod: release channel
/// first (release > beta > alpha), then publication date, ties broken by
/// catalog identifier, highest wins. Most-preferred compares as `Less` so
/// a sorted list starts with the best candidate.
pub fn preference_cmp(a: &File, b: &File) -> Ordering {
    b.release
        .cmp(&a.release)
        .then_with(|| b.date.cmp(&a.date))
        .then_with(|| b.id.cmp(&a.id))
}

/// Sort files most-preferred first. Catalog clients apply this at the
/// boundary so the rest of the engine can rely on the ordering.
pub fn sort_by_preference(files: &mut [File]) {
    files.sort_by(preference_cmp);
}

/// Select the most-preferred file compatible with the game version and
/// channel floor from an arbitrarily ordered slice.
pub fn select_preferred<'a>(
    files: &'a [File],
    game_version: &str,
    min_channel: ReleaseChannel,
) -> Option<&'a File> {
    files
        .iter()
        .filter(|f| f.is_candidate(game_version, min_channel))
        .min_by(|a, b| preference_cmp(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(id: FileId, release: ReleaseChannel, day: u32) -> File {
        File {
            id,
            mod_id: 1,
            display_name: format!("1.0.{id}"),
            file_name: format!("mod-1.0.{id}.jar"),
            date: Utc.with_ymd_and_hms(2017, 3, day, 12, 0, 0).unwrap(),
            release,
            game_versions: BTreeSet::from(["1.10.2".to_string()]),
            dependencies: Vec::new(),
            url: format!("https://example.invalid/files/{id}"),
        }
    }

    #[test]
    fn channel_outranks_recency() {
        let mut files = vec![
            file(1, ReleaseChannel::Beta, 20),
            file(2, ReleaseChannel::Release, 5),
        ];
        sort_by_preference(&mut files);
        assert_eq!(files[0].id, 2);
    }

    #[test]
    fn recency_breaks_ties_within_channel() {
        let mut files = vec![
            file(1, ReleaseChannel::Release, 5),
            file(2, ReleaseChannel::Release, 20),
        ];
        sort_by_preference(&mut files);
        assert_eq!(files[0].id, 2);
    }

    #[test]
    fn identifier_breaks_full_ties() {
        let mut files = vec![
            file(7, ReleaseChannel::Release, 5),
            file(9, ReleaseChannel::Release, 5),
        ];
        sort_by_preference(&mut files);
        assert_eq!(files[0].id, 9);
    }

    #[test]
    fn select_preferred_honors_channel_floor() {
        let files = vec![
            file(1, ReleaseChannel::Alpha, 25),
            file(2, ReleaseChannel::Beta, 10),
        ];
        let chosen = select_preferred(&files, "1.10.2", ReleaseChannel::Beta).unwrap();
        assert_eq!(chosen.id, 2);
        assert!(select_preferred(&files, "1.10.2", ReleaseChannel::Release).is_none());
    }

    #[test]
    fn select_preferred_filters_game_version() {
        let files = vec![file(1, ReleaseChannel::Release, 1)];
        assert!(select_preferred(&files, "1.11", ReleaseChannel::Alpha).is_none());
    }
}
