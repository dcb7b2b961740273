//! Profile metadata persistence.
//!
//! The metadata file is the only shared resource between invocations. Saves
//! are atomic: serialize to a temporary file in the same directory, flush,
//! then rename over the target, so the on-disk file is always either the
//! previous snapshot or the new one, never a partial write. An advisory
//! file lock serializes whole load-plan-execute spans across processes.
//! No other component writes the metadata file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tempfile::NamedTempFile;

use mp_core::{Error, Profile, ProfileDocument};

pub struct ProfileStore {
    pack_path: PathBuf,
    lock_path: PathBuf,
}

/// Held for the duration of one engine invocation; the advisory lock is
/// released when this is dropped.
pub struct ProfileLock {
    _file: File,
}

impl ProfileStore {
    pub fn new(pack_path: impl Into<PathBuf>) -> Self {
        let pack_path = pack_path.into();
        let lock_path = pack_path.with_extension("lock");
        Self {
            pack_path,
            lock_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.pack_path
    }

    /// Acquire the profile's exclusive advisory lock, blocking until any
    /// concurrent invocation releases it.
    pub fn lock(&self) -> Result<ProfileLock, Error> {
        if let Some(parent) = self.pack_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::MetadataCorrupt {
                message: format!("failed to create profile directory: {e}"),
            })?;
        }

        let lock_file = File::create(&self.lock_path).map_err(|e| Error::MetadataCorrupt {
            message: format!("failed to create lock file: {e}"),
        })?;

        lock_file
            .lock_exclusive()
            .map_err(|e| Error::MetadataCorrupt {
                message: format!("failed to acquire profile lock: {e}"),
            })?;

        Ok(ProfileLock { _file: lock_file })
    }

    /// Create a fresh, empty profile file. Fails if one already exists.
    pub fn init(&self, game_version: &str) -> Result<Profile, Error> {
        if self.pack_path.exists() {
            return Err(Error::MetadataCorrupt {
                message: format!("profile file {} already exists", self.pack_path.display()),
            });
        }

        let profile = Profile::new(game_version);
        self.save(&profile)?;
        Ok(profile)
    }

    /// Load and validate the persisted profile.
    pub fn load(&self) -> Result<Profile, Error> {
        let body = fs::read_to_string(&self.pack_path).map_err(|e| Error::MetadataCorrupt {
            message: format!("failed to read {}: {e}", self.pack_path.display()),
        })?;

        let doc: ProfileDocument =
            serde_json::from_str(&body).map_err(|e| Error::MetadataCorrupt {
                message: format!("failed to parse {}: {e}", self.pack_path.display()),
            })?;

        Profile::from_document(doc)
    }

    /// Atomically persist the profile.
    pub fn save(&self, profile: &Profile) -> Result<(), Error> {
        let doc = profile.to_document();
        let body = serde_json::to_string_pretty(&doc).map_err(|e| Error::MetadataCorrupt {
            message: format!("failed to serialize profile: {e}"),
        })?;

        let dir = match self.pack_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| Error::MetadataCorrupt {
            message: format!("failed to create profile directory: {e}"),
        })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::MetadataCorrupt {
            message: format!("failed to create temporary file: {e}"),
        })?;

        tmp.write_all(body.as_bytes())
            .and_then(|_| tmp.flush())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| Error::MetadataCorrupt {
                message: format!("failed to write profile: {e}"),
            })?;

        tmp.persist(&self.pack_path)
            .map_err(|e| Error::MetadataCorrupt {
                message: format!("failed to replace {}: {e}", self.pack_path.display()),
            })?;

        Ok(())
    }
}
