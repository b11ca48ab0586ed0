//! Fixture builders for catalog test data

use brewdeck::formula::{Cask, Formula, InstalledRecord, Requirement, Versions};
use brewdeck::package::{Package, PackageKind};

pub fn remote_formula(name: &str, description: &str) -> Formula {
    Formula {
        name: name.to_string(),
        full_name: name.to_string(),
        description: description.to_string(),
        homepage: format!("https://example.test/{name}"),
        versions: Versions {
            stable: Some("1.0".to_string()),
            head: None,
        },
        ..Default::default()
    }
}

pub fn installed_formula(name: &str, version: &str, on_request: bool) -> Formula {
    let mut formula = remote_formula(name, "installed fixture");
    formula.versions.stable = Some(version.to_string());
    formula.installed = vec![InstalledRecord {
        version: version.to_string(),
        installed_as_dependency: !on_request,
        installed_on_request: on_request,
    }];
    formula.locally_installed = true;
    formula
}

pub fn macos_only_formula(name: &str) -> Formula {
    let mut formula = remote_formula(name, "macOS only");
    formula.requirements = vec![Requirement {
        name: "macos".to_string(),
        version: None,
    }];
    formula
}

pub fn remote_cask(token: &str) -> Cask {
    Cask {
        token: token.to_string(),
        full_token: token.to_string(),
        name: vec![token.to_string()],
        description: Some("cask fixture".to_string()),
        version: Some("1.0".to_string()),
        ..Default::default()
    }
}

pub fn package(name: &str, kind: PackageKind) -> Package {
    let mut pkg = Package::placeholder(name, kind);
    pkg.description = format!("{name} fixture");
    pkg
}

pub fn ranked_package(name: &str, rank: u64) -> Package {
    let mut pkg = package(name, PackageKind::Formula);
    pkg.rank = rank;
    pkg
}

/// Analytics payload in the shape of the published 90-day tables.
pub fn analytics_json(rows: &[(u64, &str, &str, &str)]) -> String {
    let items: Vec<String> = rows
        .iter()
        .map(|(number, formula, cask, count)| {
            format!(
                r#"{{"number": {number}, "formula": "{formula}", "cask": "{cask}", "count": "{count}"}}"#
            )
        })
        .collect();
    format!(r#"{{"category": "test", "items": [{}]}}"#, items.join(","))
}
