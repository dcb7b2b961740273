//! Trait abstraction over the remote mod catalog.
//!
//! The engine only depends on this contract; the HTTP implementation lives
//! in [`crate::api`]. Keeping the boundary as a trait lets tests inject
//! in-memory catalogs and mocks that simulate failures.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use mp_core::{Error, File, FileId, Mod, ModId};

/// Operations the engine requires from the remote data source.
///
/// `get_files_for` returns only files compatible with the given game
/// version, ordered most-preferred first: release channel (release > beta >
/// alpha), then recency, ties broken by identifier, highest wins.
/// Implementations enforce the ordering at this boundary.
///
/// Any call may fail with `NetworkFailure`; the engine treats that as
/// non-retryable at its own layer.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch a mod's metadata. Fails with `NotFound` for unknown ids.
    async fn get_mod(&self, mod_id: ModId) -> Result<Mod, Error>;

    /// Files of a mod compatible with the game version, best first.
    async fn get_files_for(&self, mod_id: ModId, game_version: &str) -> Result<Vec<File>, Error>;

    /// Fetch a single file by identifier. Fails with `NotFound` if unknown.
    async fn get_file(&self, file_id: FileId) -> Result<File, Error>;

    /// Full-text search over mod names and summaries. Not used by the
    /// resolution engine itself, only by the search command.
    async fn search(&self, text: &str) -> Result<Vec<Mod>, Error>;
}
