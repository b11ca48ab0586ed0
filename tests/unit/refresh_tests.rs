//! Unit tests for the refresh orchestrator

use brewdeck::brew::PackageOperator;
use brewdeck::config::Platform;
use brewdeck::manifest::parse_manifest;
use brewdeck::package::PLACEHOLDER_DESCRIPTION;
use brewdeck::provider::DataProvider;
use brewdeck::refresh::{RefreshMode, RefreshOrchestrator, RefreshPhase};
use brewdeck::ui::{self, StatusLevel, UiStream, UiUpdate};
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::fixtures::analytics_json;
use crate::common::{setup_test_env, test_provider, test_urls, MockTransport};

const INSTALLED_JSON: &str = r#"[
    {"name": "wget", "full_name": "wget", "desc": "Internet file retriever",
     "versions": {"stable": "1.24"},
     "installed": [{"version": "1.24", "installed_on_request": true}],
     "outdated": true}
]"#;

const REMOTE_JSON: &str = r#"[
    {"name": "wget", "full_name": "wget", "desc": "Internet file retriever",
     "versions": {"stable": "1.25"}},
    {"name": "bat", "full_name": "bat", "desc": "Cat clone",
     "versions": {"stable": "0.24"}}
]"#;

/// Mock with every source canned except where a test removes one.
fn full_mock() -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    transport.on_command("brew", &["info", "--json=v1", "--installed"], INSTALLED_JSON);
    transport.on_command("brew", &["list", "--cask"], "");
    transport.on_http(&test_urls().formula, REMOTE_JSON);
    transport.on_http(&test_urls().cask, "[]");
    transport.on_http(
        &test_urls().formula_analytics,
        analytics_json(&[(1, "wget", "", "2,000")]),
    );
    transport.on_http(&test_urls().cask_analytics, analytics_json(&[]));
    transport
}

fn orchestrator(transport: Arc<MockTransport>, dir: &TempDir) -> RefreshOrchestrator {
    let provider: Arc<DataProvider> = Arc::new(test_provider(transport, dir));
    RefreshOrchestrator::new(provider, Platform::MacOs)
}

fn drain(stream: &mut UiStream) -> Vec<UiUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = stream.try_recv() {
        updates.push(update);
    }
    updates
}

#[tokio::test]
async fn refresh_publishes_a_merged_snapshot() {
    let dir = setup_test_env();
    let orchestrator = orchestrator(full_mock(), &dir);
    let (ui, mut stream) = ui::channel();

    let snapshot = orchestrator.refresh(RefreshMode::Startup, &ui).await;

    assert_eq!(snapshot.packages.len(), 2);
    let wget = snapshot.packages.iter().find(|p| p.name == "wget").unwrap();
    // The installed record won over the remote one.
    assert!(wget.installed);
    assert!(wget.outdated);
    assert_eq!(wget.version, "1.24");
    assert_eq!(wget.rank, 1);

    assert_eq!(orchestrator.phase(), RefreshPhase::Published);
    assert!(drain(&mut stream)
        .iter()
        .any(|u| matches!(u, UiUpdate::RefreshComplete)));
}

#[tokio::test]
async fn readers_see_the_published_snapshot() {
    let dir = setup_test_env();
    let orchestrator = orchestrator(full_mock(), &dir);
    let (ui, _stream) = ui::channel();

    assert!(orchestrator.snapshot().packages.is_empty());
    orchestrator.refresh(RefreshMode::Startup, &ui).await;
    assert_eq!(orchestrator.snapshot().packages.len(), 2);
}

#[tokio::test]
async fn failed_source_degrades_to_partial_data() {
    let dir = setup_test_env();
    let transport = Arc::new(MockTransport::new());
    // Only the installed query works; network sources are all down.
    transport.on_command("brew", &["info", "--json=v1", "--installed"], INSTALLED_JSON);
    transport.on_command("brew", &["list", "--cask"], "");
    let orchestrator = orchestrator(transport, &dir);
    let (ui, mut stream) = ui::channel();

    let snapshot = orchestrator.refresh(RefreshMode::Startup, &ui).await;

    // Installed packages still render.
    assert_eq!(snapshot.packages.len(), 1);
    assert_eq!(snapshot.packages[0].name, "wget");
    assert_eq!(orchestrator.phase(), RefreshPhase::Published);

    let warned = drain(&mut stream).iter().any(|u| {
        matches!(u, UiUpdate::Status { level: StatusLevel::Warning, message }
            if message.contains("remote formulae"))
    });
    assert!(warned);
}

#[tokio::test]
async fn post_mutation_refresh_bypasses_installed_cache_only() {
    let dir = setup_test_env();
    let transport = full_mock();
    let orchestrator = orchestrator(Arc::clone(&transport), &dir);
    let (ui, _stream) = ui::channel();

    orchestrator.refresh(RefreshMode::Startup, &ui).await;
    orchestrator.refresh(RefreshMode::PostMutation, &ui).await;

    // Installed state was re-fetched; the remote catalog stayed cached.
    assert_eq!(transport.call_count("brew info --json=v1 --installed"), 2);
    assert_eq!(transport.call_count(&test_urls().formula), 1);
}

#[tokio::test]
async fn force_refresh_bypasses_every_cache() {
    let dir = setup_test_env();
    let transport = full_mock();
    let orchestrator = orchestrator(Arc::clone(&transport), &dir);
    let (ui, _stream) = ui::channel();

    orchestrator.refresh(RefreshMode::Startup, &ui).await;
    orchestrator.refresh(RefreshMode::ForceAll, &ui).await;

    assert_eq!(transport.call_count(&test_urls().formula), 2);
    assert_eq!(transport.call_count(&test_urls().formula_analytics), 2);
}

#[tokio::test]
async fn manifest_resolution_publishes_placeholders_then_resolves() {
    let dir = setup_test_env();
    let transport = full_mock();
    // Name lookups for re-stamping.
    transport.on_command("brew", &["list", "--formula"], "wget\n");
    // The manifest tap is not installed yet; installing it succeeds.
    transport.on_command("brew", &["tap"], "homebrew/core\n");
    transport.on_command("brew", &["tap", "acme/tools"], "Tapped 1 formula\n");
    // After tap installation the widget becomes fetchable.
    transport.on_command(
        "brew",
        &["info", "--json=v1", "acme/tools/widget"],
        r#"[{"name": "acme/tools/widget", "desc": "a widget"}]"#,
    );
    // Flatpak is absent on this host.
    transport.fail_command("flatpak", &["--version"], "not installed");

    let orchestrator = orchestrator(Arc::clone(&transport), &dir);
    let operator = PackageOperator::new(transport);
    let (ui, mut stream) = ui::channel();

    orchestrator.refresh(RefreshMode::Startup, &ui).await;
    let doc = parse_manifest("tap \"acme/tools\"\nbrew \"wget\"\nbrew \"acme/tools/widget\"\n");
    let snapshot = orchestrator.resolve_manifest(&doc, &operator, &ui).await;

    // Two publishes happened: placeholders first, resolved second.
    let updates = drain(&mut stream);
    let completes = updates
        .iter()
        .filter(|u| matches!(u, UiUpdate::RefreshComplete))
        .count();
    assert!(completes >= 2);

    let names: Vec<&str> = snapshot
        .manifest_packages
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["acme/tools/widget", "wget"]);

    let wget = snapshot
        .manifest_packages
        .iter()
        .find(|p| p.name == "wget")
        .unwrap();
    assert!(wget.installed);

    let widget = snapshot
        .manifest_packages
        .iter()
        .find(|p| p.name == "acme/tools/widget")
        .unwrap();
    assert_eq!(widget.description, "a widget");
    assert_ne!(widget.description, PLACEHOLDER_DESCRIPTION);
}

#[tokio::test]
async fn manifest_resolution_with_installed_taps_skips_tap_install() {
    let dir = setup_test_env();
    let transport = full_mock();
    transport.on_command("brew", &["list", "--formula"], "wget\n");
    transport.on_command("brew", &["tap"], "acme/tools\n");
    transport.fail_command("flatpak", &["--version"], "not installed");

    let orchestrator = orchestrator(Arc::clone(&transport), &dir);
    let operator = PackageOperator::new(Arc::clone(&transport) as Arc<dyn brewdeck::exec::Transport>);
    let (ui, _stream) = ui::channel();

    orchestrator.refresh(RefreshMode::Startup, &ui).await;
    let doc = parse_manifest("tap \"acme/tools\"\nbrew \"wget\"\n");
    let snapshot = orchestrator.resolve_manifest(&doc, &operator, &ui).await;

    assert_eq!(snapshot.manifest_packages.len(), 1);
    assert_eq!(transport.call_count("brew tap acme/tools"), 0);
}

#[tokio::test]
async fn catalog_refresh_preserves_manifest_packages() {
    let dir = setup_test_env();
    let transport = full_mock();
    transport.on_command("brew", &["list", "--formula"], "wget\n");
    transport.on_command("brew", &["tap"], "");
    transport.fail_command("flatpak", &["--version"], "not installed");

    let orchestrator = orchestrator(Arc::clone(&transport), &dir);
    let operator = PackageOperator::new(transport);
    let (ui, _stream) = ui::channel();

    orchestrator.refresh(RefreshMode::Startup, &ui).await;
    let doc = parse_manifest("brew \"wget\"\n");
    orchestrator.resolve_manifest(&doc, &operator, &ui).await;

    let snapshot = orchestrator.refresh(RefreshMode::Startup, &ui).await;
    assert_eq!(snapshot.manifest_packages.len(), 1);
    assert_eq!(snapshot.manifest_packages[0].name, "wget");
}
