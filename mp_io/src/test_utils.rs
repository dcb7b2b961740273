//! Test utilities for modpacker.
//!
//! Common infrastructure for writing unit and integration tests:
//!
//! - `CatalogFixture` - deterministic in-memory catalog client
//! - `RecordingTransfer` - file transfer double that records fetches and
//!   can fail on demand
//! - `TestContext` - TempDir + store + manager + profile in one place
//! - `mount_catalog` - serve a fixture over wiremock in the proxy wire
//!   format, for tests that exercise the real `ApiClient`
//!
//! # Example
//!
//! ```ignore
//! use mp_io::test_utils::{CatalogFixture, TestContext, file_fixture, mod_fixture};
//!
//! #[tokio::test]
//! async fn installs_with_dependency() {
//!     let mut catalog = CatalogFixture::new();
//!     catalog.add_mod(mod_fixture(50, "forge-multipart"));
//!     catalog.add_file(file_fixture(2001, 50, &[]));
//!
//!     let mut ctx = TestContext::new(catalog);
//!     ctx.install(50).await.unwrap();
//!     assert!(ctx.profile.is_installed(50));
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mp_core::{
    Dependency, Error, File, FileId, Mod, ModId, Plan, Profile, ReleaseChannel, sort_by_preference,
};

use crate::catalog::CatalogClient;
use crate::ops::{ExecutionReport, Manager, ResolveOpts};
use crate::store::ProfileStore;
use crate::transfer::FileTransfer;

/// Game version every fixture targets unless overridden.
pub const GAME_VERSION: &str = "1.10.2";

// ============================================================================
// Fixture builders
// ============================================================================

pub fn mod_fixture(id: ModId, slug: &str) -> Mod {
    Mod {
        id,
        slug: slug.to_string(),
        name: slug
            .split('-')
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
        summary: Some(format!("Summary of {slug}")),
    }
}

/// A release-channel file for `GAME_VERSION`; higher ids are newer, so the
/// preference order between files of one mod follows their ids.
pub fn file_fixture(id: FileId, mod_id: ModId, deps: &[Dependency]) -> File {
    File {
        id,
        mod_id,
        display_name: format!("v{id}"),
        file_name: format!("mod-{mod_id}-{id}.jar"),
        date: Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap() + Duration::hours(id as i64),
        release: ReleaseChannel::Release,
        game_versions: [GAME_VERSION.to_string()].into(),
        dependencies: deps.to_vec(),
        url: format!("https://files.invalid/download/{id}"),
    }
}

// ============================================================================
// In-memory catalog
// ============================================================================

/// Deterministic in-memory catalog client.
#[derive(Default)]
pub struct CatalogFixture {
    mods: BTreeMap<ModId, Mod>,
    files: BTreeMap<ModId, Vec<File>>,
}

impl CatalogFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mod(&mut self, m: Mod) -> &mut Self {
        self.mods.insert(m.id, m);
        self
    }

    pub fn add_file(&mut self, file: File) -> &mut Self {
        self.files.entry(file.mod_id).or_default().push(file);
        self
    }

    pub fn mods(&self) -> impl Iterator<Item = &Mod> {
        self.mods.values()
    }

    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.values().flatten()
    }
}

#[async_trait]
impl CatalogClient for CatalogFixture {
    async fn get_mod(&self, mod_id: ModId) -> Result<Mod, Error> {
        self.mods.get(&mod_id).cloned().ok_or_else(|| Error::NotFound {
            what: format!("mod {mod_id}"),
        })
    }

    async fn get_files_for(&self, mod_id: ModId, game_version: &str) -> Result<Vec<File>, Error> {
        if !self.mods.contains_key(&mod_id) {
            return Err(Error::NotFound {
                what: format!("mod {mod_id}"),
            });
        }

        let mut files: Vec<File> = self
            .files
            .get(&mod_id)
            .map(|files| {
                files
                    .iter()
                    .filter(|f| f.supports(game_version))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sort_by_preference(&mut files);

        Ok(files)
    }

    async fn get_file(&self, file_id: FileId) -> Result<File, Error> {
        self.files
            .values()
            .flatten()
            .find(|f| f.id == file_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                what: format!("file {file_id}"),
            })
    }

    async fn search(&self, text: &str) -> Result<Vec<Mod>, Error> {
        let needle = text.to_lowercase();
        Ok(self
            .mods
            .values()
            .filter(|m| {
                m.slug.to_lowercase().contains(&needle)
                    || m.name.to_lowercase().contains(&needle)
                    || m.summary
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }
}

// ============================================================================
// File transfer double
// ============================================================================

/// Records every fetched file id and writes a stub artifact; can be told to
/// fail on a specific file to simulate a mid-plan transfer error.
#[derive(Default)]
pub struct RecordingTransfer {
    fetched: Mutex<Vec<FileId>>,
    fail_on: Mutex<Option<FileId>>,
}

impl RecordingTransfer {
    pub fn fetched(&self) -> Vec<FileId> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fail_on(&self, file_id: FileId) {
        *self.fail_on.lock().unwrap() = Some(file_id);
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock().unwrap() = None;
    }
}

#[async_trait]
impl FileTransfer for RecordingTransfer {
    async fn fetch(&self, file: &File, dest_dir: &Path) -> Result<PathBuf, Error> {
        if *self.fail_on.lock().unwrap() == Some(file.id) {
            return Err(Error::NetworkFailure {
                message: format!("simulated transfer failure for file {}", file.id),
            });
        }

        fs::create_dir_all(dest_dir).map_err(|e| Error::NetworkFailure {
            message: e.to_string(),
        })?;
        let dest = dest_dir.join(&file.file_name);
        fs::write(&dest, file.display_name.as_bytes()).map_err(|e| Error::NetworkFailure {
            message: e.to_string(),
        })?;

        self.fetched.lock().unwrap().push(file.id);
        Ok(dest)
    }
}

// ============================================================================
// Test context
// ============================================================================

/// TempDir, store, manager and an in-memory profile wired together.
pub struct TestContext {
    pub tmp: TempDir,
    pub transfer: Arc<RecordingTransfer>,
    pub manager: Manager,
    pub profile: Profile,
}

impl TestContext {
    pub fn new(catalog: CatalogFixture) -> Self {
        let tmp = TempDir::new().unwrap();
        let store = ProfileStore::new(tmp.path().join("modpack.json"));
        let transfer = Arc::new(RecordingTransfer::default());
        let manager = Manager::new(
            Arc::new(catalog),
            transfer.clone(),
            store,
            tmp.path().join("mods"),
        );
        let profile = Profile::new(GAME_VERSION);

        Self {
            tmp,
            transfer,
            manager,
            profile,
        }
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.tmp.path().join("mods")
    }

    /// Plan and execute an install of the latest compatible file.
    pub async fn install(&mut self, target: ModId) -> Result<ExecutionReport, Error> {
        self.install_with(target, &ResolveOpts::default()).await
    }

    pub async fn install_with(
        &mut self,
        target: ModId,
        opts: &ResolveOpts,
    ) -> Result<ExecutionReport, Error> {
        let plan = self.manager.plan_install(&self.profile, target, opts).await?;
        self.execute(plan).await
    }

    pub async fn remove(&mut self, target: ModId, force: bool) -> Result<ExecutionReport, Error> {
        let plan = self.manager.plan_removal(&self.profile, target, force)?;
        self.execute(plan).await
    }

    pub async fn execute(&mut self, plan: Plan) -> Result<ExecutionReport, Error> {
        self.manager.execute(&mut self.profile, plan).await
    }
}

// ============================================================================
// Wiremock catalog in the proxy wire format
// ============================================================================

/// Serve a fixture's data over HTTP the way the real proxy does, so tests
/// can drive `ApiClient` and the CLI end to end. Download URLs point back
/// at the mock server; every artifact body is the file's display name.
pub async fn mount_catalog(server: &MockServer, catalog: &CatalogFixture) {
    for m in catalog.mods() {
        Mock::given(method("GET"))
            .and(path(format!("/addon/{}", m.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": m.id,
                "slug": m.slug,
                "name": m.name,
                "summary": m.summary,
            })))
            .mount(server)
            .await;

        let files: Vec<serde_json::Value> = catalog
            .files()
            .filter(|f| f.mod_id == m.id)
            .map(|f| proxy_file_json(f, &server.uri()))
            .collect();

        Mock::given(method("GET"))
            .and(path(format!("/addon/{}/files", m.id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "files": files })),
            )
            .mount(server)
            .await;
    }

    for f in catalog.files() {
        Mock::given(method("GET"))
            .and(path(format!("/file/{}", f.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(proxy_file_json(f, &server.uri())))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/download/{}", f.id)))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(f.display_name.clone().into_bytes()),
            )
            .mount(server)
            .await;
    }

    let all_mods: Vec<serde_json::Value> = catalog
        .mods()
        .map(|m| {
            serde_json::json!({
                "id": m.id,
                "slug": m.slug,
                "name": m.name,
                "summary": m.summary,
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/addon/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(all_mods))
        .mount(server)
        .await;
}

fn proxy_file_json(file: &File, base: &str) -> serde_json::Value {
    serde_json::json!({
        "id": file.id,
        "add_on_id": file.mod_id,
        "file_name_on_disk": file.file_name,
        "display_name": file.display_name,
        "file_date": file.date.to_rfc3339(),
        "release_type": file.release.to_string(),
        "game_version": file.game_versions,
        "download_url": format!("{base}/download/{}", file.id),
        "dependencies": file.dependencies.iter().map(|d| {
            serde_json::json!({
                "add_on_id": d.mod_id,
                "file_id": d.file_id,
                "type": "Required",
            })
        }).collect::<Vec<_>>(),
    })
}
