//! Unit tests for the query pipeline

use brewdeck::package::{Package, PackageKind};
use brewdeck::query::{query, Filter};

use crate::common::fixtures::{package, ranked_package};

fn installed(mut pkg: Package) -> Package {
    pkg.installed = true;
    pkg
}

#[test]
fn toggle_reapplying_active_filter_clears_it() {
    let filter = Filter::None.toggle(Filter::Outdated);
    assert_eq!(filter, Filter::Outdated);
    assert_eq!(filter.toggle(Filter::Outdated), Filter::None);
}

#[test]
fn toggle_different_filter_replaces_active_one() {
    let filter = Filter::Installed.toggle(Filter::Casks);
    assert_eq!(filter, Filter::Casks);
}

#[test]
fn installed_filter_hides_remote_only_packages() {
    let source = vec![
        installed(package("wget", PackageKind::Formula)),
        package("bat", PackageKind::Formula),
    ];

    let shown = query(&source, Filter::Installed, "", false);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].name, "wget");
}

#[test]
fn outdated_filter_requires_installed() {
    let mut remote_outdated = package("ghost", PackageKind::Formula);
    remote_outdated.outdated = true;

    let mut real = installed(package("wget", PackageKind::Formula));
    real.outdated = true;

    let shown = query(&[remote_outdated, real], Filter::Outdated, "", false);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].name, "wget");
}

#[test]
fn leaves_filter_keeps_only_explicit_installs() {
    let mut dep = installed(package("openssl", PackageKind::Formula));
    dep.installed_on_request = false;
    let mut leaf = installed(package("wget", PackageKind::Formula));
    leaf.installed_on_request = true;

    let shown = query(&[dep, leaf], Filter::Leaves, "", false);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].name, "wget");
}

#[test]
fn search_matches_name_or_description() {
    let mut by_desc = package("ripgrep", PackageKind::Formula);
    by_desc.description = "Fast GREP replacement".to_string();
    let by_name = package("grep", PackageKind::Formula);
    let neither = package("bat", PackageKind::Formula);

    let shown = query(&[by_desc, by_name, neither], Filter::None, "grep", false);
    let names: Vec<&str> = shown.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"ripgrep"));
    assert!(names.contains(&"grep"));
}

#[test]
fn search_is_case_insensitive() {
    let source = vec![package("WGet-like", PackageKind::Formula)];
    let shown = query(&source, Filter::None, "wget", false);
    assert_eq!(shown.len(), 1);
}

#[test]
fn search_orders_by_rank_with_unranked_last() {
    let source = vec![
        ranked_package("alpha-tool", 5),
        ranked_package("beta-tool", 0),
        ranked_package("gamma-tool", 2),
    ];

    let shown = query(&source, Filter::None, "tool", false);
    let names: Vec<&str> = shown.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["gamma-tool", "alpha-tool", "beta-tool"]);
}

#[test]
fn search_deduplicates_by_name() {
    let source = vec![
        package("wget", PackageKind::Formula),
        package("wget", PackageKind::Formula),
    ];

    let shown = query(&source, Filter::None, "wget", false);
    assert_eq!(shown.len(), 1);
}

#[test]
fn empty_search_preserves_source_order() {
    let source = vec![
        ranked_package("zeta", 1),
        ranked_package("alpha", 9),
    ];

    let shown = query(&source, Filter::None, "", false);
    let names: Vec<&str> = shown.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
}

#[test]
fn sort_by_kind_overrides_rank_order() {
    let mut cask = package("alacritty", PackageKind::Cask);
    cask.rank = 1;
    let flatpak = package("org.gimp.GIMP", PackageKind::Flatpak);
    let formula = ranked_package("wget", 50);

    let shown = query(&[cask, flatpak, formula], Filter::None, "", true);
    let kinds: Vec<PackageKind> = shown.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![PackageKind::Formula, PackageKind::Cask, PackageKind::Flatpak]
    );
}

#[test]
fn filter_applies_before_search() {
    let mut installed_match = installed(package("wget", PackageKind::Formula));
    installed_match.description = "downloader".to_string();
    let mut remote_match = package("wget2", PackageKind::Formula);
    remote_match.description = "downloader".to_string();

    let shown = query(
        &[installed_match, remote_match],
        Filter::Installed,
        "downloader",
        false,
    );
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].name, "wget");
}
