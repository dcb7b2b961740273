//! Local installation state for one Minecraft profile.
//!
//! A profile is an explicit value passed into every component call; only the
//! executor mutates it, and only the metadata store writes it to disk. The
//! on-disk form is a versioned JSON document with the installed-mod records
//! as a flat array.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::addon::{FileId, ModId};
use crate::errors::Error;

/// Version tag of the persisted metadata format.
pub const SCHEMA_VERSION: u32 = 1;

/// One installed mod. Created by an Install commit, updated in place by an
/// Upgrade commit, destroyed by a Remove commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstalledMod {
    pub mod_id: ModId,
    pub slug: String,
    pub file_id: FileId,
    /// Cached version label, for display without re-querying the catalog.
    pub version_label: String,
    /// Cached artifact name, so removal never needs a catalog round-trip.
    pub file_name: String,
    /// True if the user explicitly requested this mod; never auto-removed.
    pub direct: bool,
    /// Mods currently requiring this one.
    #[serde(default)]
    pub dependents: BTreeSet<ModId>,
}

impl InstalledMod {
    /// A dependency-only install with no remaining dependents. Orphans must
    /// not persist past the end of any completed plan execution.
    pub fn is_orphan(&self) -> bool {
        !self.direct && self.dependents.is_empty()
    }
}

/// In-memory installation state: game version plus the installed-mod map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub game_version: String,
    pub mods: BTreeMap<ModId, InstalledMod>,
}

impl Profile {
    pub fn new(game_version: impl Into<String>) -> Self {
        Self {
            game_version: game_version.into(),
            mods: BTreeMap::new(),
        }
    }

    pub fn get(&self, mod_id: ModId) -> Option<&InstalledMod> {
        self.mods.get(&mod_id)
    }

    pub fn is_installed(&self, mod_id: ModId) -> bool {
        self.mods.contains_key(&mod_id)
    }

    /// Insert or replace the record for a mod.
    pub fn record(&mut self, installed: InstalledMod) {
        self.mods.insert(installed.mod_id, installed);
    }

    /// Drop the record for a mod and detach it from every remaining
    /// dependents set.
    pub fn remove(&mut self, mod_id: ModId) -> Option<InstalledMod> {
        let removed = self.mods.remove(&mod_id);
        if removed.is_some() {
            for rec in self.mods.values_mut() {
                rec.dependents.remove(&mod_id);
            }
        }
        removed
    }

    /// Find an installed mod by slug.
    pub fn find_by_slug(&self, slug: &str) -> Option<&InstalledMod> {
        self.mods.values().find(|rec| rec.slug == slug)
    }

    /// Mods the user explicitly requested, in identifier order.
    pub fn direct_mods(&self) -> impl Iterator<Item = &InstalledMod> {
        self.mods.values().filter(|rec| rec.direct)
    }

    /// Build the persistable document form.
    pub fn to_document(&self) -> ProfileDocument {
        ProfileDocument {
            schema_version: SCHEMA_VERSION,
            game_version: self.game_version.clone(),
            mods: self.mods.values().cloned().collect(),
        }
    }

    /// Validate and adopt a loaded document. Fails with `MetadataCorrupt`
    /// on an unsupported schema version or a duplicated mod identifier.
    pub fn from_document(doc: ProfileDocument) -> Result<Self, Error> {
        if doc.schema_version != SCHEMA_VERSION {
            return Err(Error::MetadataCorrupt {
                message: format!(
                    "unsupported schema version {} (expected {})",
                    doc.schema_version, SCHEMA_VERSION
                ),
            });
        }

        let mut mods = BTreeMap::new();
        for rec in doc.mods {
            let id = rec.mod_id;
            if mods.insert(id, rec).is_some() {
                return Err(Error::MetadataCorrupt {
                    message: format!("mod {id} appears more than once"),
                });
            }
        }

        Ok(Self {
            game_version: doc.game_version,
            mods,
        })
    }
}

/// On-disk shape of the profile metadata file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub schema_version: u32,
    pub game_version: String,
    #[serde(default)]
    pub mods: Vec<InstalledMod>,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn document_round_trip_preserves_records() {
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(50, false, &[100]));
        profile.record(installed(100, true, &[]));

        let doc = profile.to_document();
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: ProfileDocument = serde_json::from_str(&json).unwrap();
        let restored = Profile::from_document(parsed).unwrap();

        assert_eq!(restored, profile);
    }

    #[test]
    fn document_uses_camel_case_wire_names() {
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(50, false, &[100]));

        let json = serde_json::to_value(profile.to_document()).unwrap();
        assert_eq!(json["schemaVersion"], 1);
        assert_eq!(json["gameVersion"], "1.10.2");
        let rec = &json["mods"][0];
        assert_eq!(rec["modId"], 50);
        assert_eq!(rec["fileId"], 500);
        assert_eq!(rec["versionLabel"], "1.0");
        assert_eq!(rec["direct"], false);
        assert_eq!(rec["dependents"][0], 100);
    }

    #[test]
    fn unsupported_schema_version_is_rejected() {
        let doc = ProfileDocument {
            schema_version: 99,
            game_version: "1.10.2".to_string(),
            mods: Vec::new(),
        };

        let err = Profile::from_document(doc).unwrap_err();
        assert!(matches!(err, Error::MetadataCorrupt { .. }));
    }

    #[test]
    fn duplicate_mod_record_is_rejected() {
        let doc = ProfileDocument {
            schema_version: SCHEMA_VERSION,
            game_version: "1.10.2".to_string(),
            mods: vec![installed(50, true, &[]), installed(50, false, &[])],
        };

        let err = Profile::from_document(doc).unwrap_err();
        match err {
            Error::MetadataCorrupt { message } => assert!(message.contains("50")),
            e => panic!("expected MetadataCorrupt, got: {e:?}"),
        }
    }

    #[test]
    fn remove_detaches_dependent_edges() {
        let mut profile = Profile::new("1.10.2");
        profile.record(installed(50, false, &[100, 230]));
        profile.record(installed(100, true, &[]));

        profile.remove(100);

        assert_eq!(
            profile.get(50).unwrap().dependents,
            BTreeSet::from([230])
        );
    }

    #[test]
    fn orphan_predicate() {
        assert!(installed(50, false, &[]).is_orphan());
        assert!(!installed(50, true, &[]).is_orphan());
        assert!(!installed(50, false, &[100]).is_orphan());
    }
}
