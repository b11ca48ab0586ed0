//! Catalog merger: six source documents in, one deduplicated catalog out

use crate::config::Platform;
use crate::formula::{AnalyticsItem, Cask, Formula};
use crate::package::Package;
use std::collections::HashMap;

/// Merge all sources into the unified, platform-filtered catalog.
///
/// Remote records are inserted first; installed records overwrite them
/// unconditionally, since they carry ground truth for what is on disk. On
/// Linux, macOS-gated formulae and all casks are excluded. Analytics are
/// attached by name where the rank is nonzero. The output is sorted by
/// canonical name ascending; presentation ordering belongs to the query
/// pipeline.
#[allow(clippy::too_many_arguments)]
pub fn merge(
    installed_formulae: &[Formula],
    remote_formulae: &[Formula],
    formula_analytics: &HashMap<String, AnalyticsItem>,
    installed_casks: &[Cask],
    remote_casks: &[Cask],
    cask_analytics: &HashMap<String, AnalyticsItem>,
    platform: Platform,
) -> Vec<Package> {
    let mut by_name: HashMap<String, Package> = HashMap::new();

    for formula in remote_formulae {
        if platform.is_linux() && !available_on_linux(formula) {
            continue;
        }
        if !by_name.contains_key(&formula.name) {
            let mut pkg = Package::from_formula(formula);
            attach_analytics(&mut pkg, formula_analytics.get(&formula.name));
            by_name.insert(formula.name.clone(), pkg);
        }
    }

    for formula in installed_formulae {
        let mut pkg = Package::from_formula(formula);
        attach_analytics(&mut pkg, formula_analytics.get(&formula.name));
        by_name.insert(formula.name.clone(), pkg);
    }

    // Casks are a macOS-only concept.
    if !platform.is_linux() {
        for cask in remote_casks {
            if !by_name.contains_key(&cask.token) {
                let mut pkg = Package::from_cask(cask);
                attach_analytics(&mut pkg, cask_analytics.get(&cask.token));
                by_name.insert(cask.token.clone(), pkg);
            }
        }

        for cask in installed_casks {
            let mut pkg = Package::from_cask(cask);
            attach_analytics(&mut pkg, cask_analytics.get(&cask.token));
            by_name.insert(cask.token.clone(), pkg);
        }
    }

    let mut packages: Vec<Package> = by_name.into_values().collect();
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    packages
}

/// A remote formula is excluded on Linux when it declares a macOS
/// requirement, or when it ships bottles but none targets Linux. A formula
/// with zero bottles is not excluded by the bottle rule.
fn available_on_linux(formula: &Formula) -> bool {
    if formula.requirements.iter().any(|req| req.name == "macos") {
        return false;
    }

    if let Some(stable) = &formula.bottle.stable {
        if !stable.files.is_empty() && !stable.files.keys().any(|tag| tag.contains("linux")) {
            return false;
        }
    }

    true
}

fn attach_analytics(pkg: &mut Package, item: Option<&AnalyticsItem>) {
    if let Some(item) = item {
        if item.number > 0 {
            pkg.rank = item.number;
            pkg.downloads = item.downloads();
        }
    }
}
