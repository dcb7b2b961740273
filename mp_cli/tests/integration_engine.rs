//! Integration tests driving the engine end to end over HTTP: a wiremock
//! catalog in the proxy wire format, the real `ApiClient` and `HttpTransfer`,
//! and profile state on disk.

use std::collections::BTreeSet;
use std::sync::Arc;

use tempfile::TempDir;
use wiremock::MockServer;

use mp_core::{Dependency, Error, Profile};
use mp_io::test_utils::{CatalogFixture, GAME_VERSION, file_fixture, mod_fixture, mount_catalog};
use mp_io::{ApiClient, HttpTransfer, Manager, ProfileStore, ResolveOpts, find_remote_mod};

struct HttpContext {
    _server: MockServer,
    tmp: TempDir,
    manager: Manager,
    profile: Profile,
}

async fn http_context(catalog: CatalogFixture) -> HttpContext {
    let server = MockServer::start().await;
    mount_catalog(&server, &catalog).await;

    let tmp = TempDir::new().unwrap();
    let store = ProfileStore::new(tmp.path().join("modpack.json"));
    let manager = Manager::new(
        Arc::new(ApiClient::with_base_url(server.uri())),
        Arc::new(HttpTransfer::new()),
        store,
        tmp.path().join("mods"),
    );

    HttpContext {
        _server: server,
        tmp,
        manager,
        profile: Profile::new(GAME_VERSION),
    }
}

fn iron_chests_catalog() -> CatalogFixture {
    let mut catalog = CatalogFixture::new();
    catalog.add_mod(mod_fixture(50, "forge-multipart"));
    catalog.add_file(file_fixture(2001, 50, &[]));
    catalog.add_mod(mod_fixture(100, "iron-chests"));
    catalog.add_file(file_fixture(2002, 100, &[Dependency::on(50)]));
    catalog
}

#[tokio::test]
async fn install_over_http_commits_dependency_graph() {
    let mut ctx = http_context(iron_chests_catalog()).await;

    let target = find_remote_mod(ctx.manager.catalog(), "iron-chests")
        .await
        .unwrap();
    assert_eq!(target.id, 100);

    let plan = ctx
        .manager
        .plan_install(&ctx.profile, target.id, &ResolveOpts::default())
        .await
        .unwrap();
    assert_eq!(plan.len(), 2);

    let report = ctx.manager.execute(&mut ctx.profile, plan).await.unwrap();
    assert!(report.fully_applied());

    // Downloaded artifacts really came over HTTP.
    let dep_artifact = ctx.tmp.path().join("mods").join("mod-50-2001.jar");
    assert_eq!(std::fs::read(dep_artifact).unwrap(), b"v2001");

    // The persisted profile carries the dependency bookkeeping.
    let persisted = ctx.manager.store().load().unwrap();
    assert_eq!(persisted.get(50).unwrap().dependents, BTreeSet::from([100]));
    assert!(persisted.get(100).unwrap().direct);
}

#[tokio::test]
async fn remove_over_http_cascades_orphans() {
    let mut ctx = http_context(iron_chests_catalog()).await;

    let plan = ctx
        .manager
        .plan_install(&ctx.profile, 100, &ResolveOpts::default())
        .await
        .unwrap();
    ctx.manager.execute(&mut ctx.profile, plan).await.unwrap();

    let plan = ctx.manager.plan_removal(&ctx.profile, 100, false).unwrap();
    let report = ctx.manager.execute(&mut ctx.profile, plan).await.unwrap();
    assert!(report.fully_applied());

    // The dependency lost its last dependent and went with it.
    assert!(ctx.profile.mods.is_empty());
    assert!(!ctx.tmp.path().join("mods").join("mod-50-2001.jar").exists());
}

#[tokio::test]
async fn removal_conflict_surfaces_unchanged_over_http() {
    let mut ctx = http_context(iron_chests_catalog()).await;

    let plan = ctx
        .manager
        .plan_install(&ctx.profile, 100, &ResolveOpts::default())
        .await
        .unwrap();
    ctx.manager.execute(&mut ctx.profile, plan).await.unwrap();

    let err = ctx
        .manager
        .plan_removal(&ctx.profile, 50, false)
        .unwrap_err();
    assert!(matches!(err, Error::DependencyConflict { .. }));
}

#[tokio::test]
async fn upgrade_over_http_replaces_the_installed_file() {
    let mut catalog = CatalogFixture::new();
    catalog.add_mod(mod_fixture(10, "quark"));
    catalog.add_file(file_fixture(101, 10, &[]));
    catalog.add_file(file_fixture(102, 10, &[]));

    let mut ctx = http_context(catalog).await;

    let pinned = ResolveOpts {
        requested_file: Some(101),
        ..ResolveOpts::default()
    };
    let plan = ctx
        .manager
        .plan_install(&ctx.profile, 10, &pinned)
        .await
        .unwrap();
    ctx.manager.execute(&mut ctx.profile, plan).await.unwrap();
    assert_eq!(ctx.profile.get(10).unwrap().file_id, 101);

    let plan = ctx
        .manager
        .plan_upgrade_all(&ctx.profile, &ResolveOpts::default())
        .await
        .unwrap();
    let report = ctx.manager.execute(&mut ctx.profile, plan).await.unwrap();
    assert!(report.fully_applied());

    assert_eq!(ctx.profile.get(10).unwrap().file_id, 102);
    let mods = ctx.tmp.path().join("mods");
    assert!(mods.join("mod-10-102.jar").exists());
    assert!(!mods.join("mod-10-101.jar").exists());
}
