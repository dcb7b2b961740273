//! Engine operations over one profile.
//!
//! This module wires the catalog, the metadata store and the file transfer
//! into the engine's operations, organized into focused submodules:
//!
//! - `resolver` - dependency graph expansion against the catalog
//! - `planner` - install, upgrade and removal plan construction
//! - `executor` - plan application with per-action committed persistence
//!
//! The resolver and planner never mutate state; only the executor commits,
//! and every commit goes through the metadata store.

mod executor;
mod planner;
mod resolver;


use std::path::PathBuf;
use std::sync::Arc;

use mp_core::{FileId, ReleaseChannel};

use crate::catalog::CatalogClient;
use crate::store::ProfileStore;
use crate::transfer::FileTransfer;

pub use executor::{ExecutionReport, FailedAction};

/// Knobs for one resolution: an exact build requested for the root, and the
/// minimal acceptable release channel (files below the floor are never
/// candidates).
#[derive(Debug, Clone, Copy)]
pub struct ResolveOpts {
    pub requested_file: Option<FileId>,
    pub min_channel: ReleaseChannel,
}

impl Default for ResolveOpts {
    fn default() -> Self {
        Self {
            requested_file: None,
            min_channel: ReleaseChannel::Release,
        }
    }
}

pub struct Manager {
    pub(crate) catalog: Arc<dyn CatalogClient>,
    pub(crate) transfer: Arc<dyn FileTransfer>,
    pub(crate) store: ProfileStore,
    pub(crate) mods_dir: PathBuf,
}

impl Manager {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        transfer: Arc<dyn FileTransfer>,
        store: ProfileStore,
        mods_dir: PathBuf,
    ) -> Self {
        Self {
            catalog,
            transfer,
            store,
            mods_dir,
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn catalog(&self) -> &dyn CatalogClient {
        self.catalog.as_ref()
    }
}
