//! Unit tests for the catalog merger

use brewdeck::config::Platform;
use brewdeck::formula::{AnalyticsItem, Bottle, BottleFile, BottleStable};
use brewdeck::merge::merge;
use brewdeck::package::PackageKind;
use std::collections::HashMap;

use crate::common::fixtures::{
    installed_formula, macos_only_formula, remote_cask, remote_formula,
};

#[test]
fn installed_record_wins_over_remote() {
    let remote = vec![remote_formula("wget", "remote description")];
    let installed = vec![installed_formula("wget", "1.24", true)];

    let packages = merge(
        &installed,
        &remote,
        &HashMap::new(),
        &[],
        &[],
        &HashMap::new(),
        Platform::MacOs,
    );

    assert_eq!(packages.len(), 1);
    assert!(packages[0].installed);
    assert_eq!(packages[0].version, "1.24");
}

#[test]
fn merge_is_idempotent() {
    let remote = vec![remote_formula("a", "one"), remote_formula("b", "two")];
    let installed = vec![installed_formula("b", "2.0", false)];
    let casks = vec![remote_cask("iterm2")];

    let run = || {
        merge(
            &installed,
            &remote,
            &HashMap::new(),
            &[],
            &casks,
            &HashMap::new(),
            Platform::MacOs,
        )
    };

    let first = run();
    let second = run();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.installed, b.installed);
        assert_eq!(a.version, b.version);
    }
}

#[test]
fn output_is_sorted_by_name() {
    let remote = vec![
        remote_formula("zsh", "shell"),
        remote_formula("bat", "cat clone"),
        remote_formula("fd", "find clone"),
    ];

    let packages = merge(
        &[],
        &remote,
        &HashMap::new(),
        &[],
        &[],
        &HashMap::new(),
        Platform::MacOs,
    );

    let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["bat", "fd", "zsh"]);
}

#[test]
fn linux_excludes_macos_gated_formulae() {
    let remote = vec![remote_formula("wget", "fine"), macos_only_formula("mas")];

    let packages = merge(
        &[],
        &remote,
        &HashMap::new(),
        &[],
        &[],
        &HashMap::new(),
        Platform::Linux,
    );

    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "wget");
}

#[test]
fn linux_excludes_formulae_without_linux_bottles() {
    let mut mac_bottled = remote_formula("mac-only", "bottled for macOS");
    let mut files = HashMap::new();
    files.insert("arm64_sonoma".to_string(), BottleFile::default());
    mac_bottled.bottle = Bottle {
        stable: Some(BottleStable { files }),
    };

    let mut linux_bottled = remote_formula("portable", "bottled everywhere");
    let mut files = HashMap::new();
    files.insert("x86_64_linux".to_string(), BottleFile::default());
    files.insert("arm64_sonoma".to_string(), BottleFile::default());
    linux_bottled.bottle = Bottle {
        stable: Some(BottleStable { files }),
    };

    // No bottles at all means no exclusion.
    let unbottled = remote_formula("source-only", "built from source");

    let packages = merge(
        &[],
        &[mac_bottled, linux_bottled, unbottled],
        &HashMap::new(),
        &[],
        &[],
        &HashMap::new(),
        Platform::Linux,
    );

    let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["portable", "source-only"]);
}

#[test]
fn linux_excludes_all_casks() {
    let casks = vec![remote_cask("iterm2")];

    let packages = merge(
        &[],
        &[],
        &HashMap::new(),
        &casks.clone(),
        &casks,
        &HashMap::new(),
        Platform::Linux,
    );

    assert!(packages.is_empty());
}

#[test]
fn analytics_attach_by_name_with_nonzero_rank() {
    let remote = vec![remote_formula("wget", "ranked"), remote_formula("obscure", "unranked")];

    let mut analytics = HashMap::new();
    analytics.insert(
        "wget".to_string(),
        AnalyticsItem {
            number: 7,
            formula: "wget".to_string(),
            count: "1,234".to_string(),
            ..Default::default()
        },
    );
    analytics.insert(
        "obscure".to_string(),
        AnalyticsItem {
            number: 0,
            formula: "obscure".to_string(),
            count: "5".to_string(),
            ..Default::default()
        },
    );

    let packages = merge(
        &[],
        &remote,
        &analytics,
        &[],
        &[],
        &HashMap::new(),
        Platform::MacOs,
    );

    let wget = packages.iter().find(|p| p.name == "wget").unwrap();
    assert_eq!(wget.rank, 7);
    assert_eq!(wget.downloads, 1234);

    let obscure = packages.iter().find(|p| p.name == "obscure").unwrap();
    assert_eq!(obscure.rank, 0);
    assert_eq!(obscure.downloads, 0);
}

#[test]
fn cask_packages_carry_their_kind() {
    let packages = merge(
        &[],
        &[],
        &HashMap::new(),
        &[],
        &[remote_cask("iterm2")],
        &HashMap::new(),
        Platform::MacOs,
    );

    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].kind, PackageKind::Cask);
    // Casks count as explicitly installed for the leaves filter.
    assert!(packages[0].installed_on_request);
}
