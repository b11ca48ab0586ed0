//! Unified package model and catalog snapshot

use crate::formula::{Cask, Formula};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Description used for manifest entries awaiting tap installation.
pub const PLACEHOLDER_DESCRIPTION: &str = "Waiting for tap installation...";

/// Description used when a tap package's info could not be fetched.
pub const UNAVAILABLE_DESCRIPTION: &str = "(unable to load package info)";

/// Discriminates the three package kinds the dashboard can display.
///
/// The ordering (`Formula < Cask < Flatpak`) is the ordering the
/// sort-by-kind mode uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Formula,
    Cask,
    Flatpak,
}

/// Unified view of a formula, cask, or flatpak for display and mutation.
///
/// Canonical `name` is the stable identifier and is unique within a merged
/// catalog. When the same name appears in an installed and a remote source,
/// the installed record wins: it carries ground truth for what is on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub homepage: String,
    pub version: String,
    pub kind: PackageKind,
    pub installed: bool,
    pub outdated: bool,
    /// 90-day popularity rank; 0 means unranked.
    pub rank: u64,
    /// 90-day download count.
    pub downloads: u64,
    /// Installed on explicit user request (meaningful for formulae; casks
    /// and flatpaks are always explicit installs).
    pub installed_on_request: bool,

    /// Kind-specific extended data, dropped on (de)serialization the same
    /// way the cache drops it: cached tap entries are display-only.
    #[serde(skip)]
    pub formula: Option<Box<Formula>>,
    #[serde(skip)]
    pub cask: Option<Box<Cask>>,
}

impl Package {
    pub fn from_formula(formula: &Formula) -> Self {
        let installed_on_request = formula
            .installed
            .first()
            .map(|record| record.installed_on_request)
            .unwrap_or(false);

        let display_name = if formula.full_name.is_empty() {
            formula.name.clone()
        } else {
            formula.full_name.clone()
        };

        Self {
            name: formula.name.clone(),
            display_name,
            description: formula.description.clone(),
            homepage: formula.homepage.clone(),
            version: formula.versions.stable.clone().unwrap_or_default(),
            kind: PackageKind::Formula,
            installed: formula.locally_installed,
            outdated: formula.outdated,
            rank: 0,
            downloads: 0,
            installed_on_request,
            formula: Some(Box::new(formula.clone())),
            cask: None,
        }
    }

    pub fn from_cask(cask: &Cask) -> Self {
        let display_name = cask
            .name
            .first()
            .cloned()
            .unwrap_or_else(|| cask.token.clone());

        Self {
            name: cask.token.clone(),
            display_name,
            description: cask.description.clone().unwrap_or_default(),
            homepage: cask.homepage.clone().unwrap_or_default(),
            version: cask.version.clone().unwrap_or_default(),
            kind: PackageKind::Cask,
            installed: cask.locally_installed,
            outdated: cask.outdated,
            rank: 0,
            downloads: 0,
            // Casks are always explicitly installed.
            installed_on_request: true,
            formula: None,
            cask: Some(Box::new(cask.clone())),
        }
    }

    /// Placeholder for a manifest entry whose tap is not installed yet.
    pub fn placeholder(name: &str, kind: PackageKind) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            homepage: String::new(),
            version: String::new(),
            kind,
            installed: false,
            outdated: false,
            rank: 0,
            downloads: 0,
            installed_on_request: false,
            formula: None,
            cask: None,
        }
    }

    /// Synthetic entry for a tap name whose info could not be fetched.
    pub fn unavailable(name: &str, kind: PackageKind) -> Self {
        Self {
            description: UNAVAILABLE_DESCRIPTION.to_string(),
            ..Self::placeholder(name, kind)
        }
    }
}

/// The merged package collection at a point in time.
///
/// Always fully replaced on publish, never mutated field by field, so a
/// reader can never observe a half-merged catalog. Readers hold an
/// `Arc<CatalogSnapshot>`; the refresh orchestrator is the only writer.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    pub packages: Vec<Package>,
    /// Manifest-restricted subset; populated only in manifest mode.
    pub manifest_packages: Vec<Package>,
}

impl CatalogSnapshot {
    pub fn new(packages: Vec<Package>) -> Arc<Self> {
        Arc::new(Self {
            packages,
            manifest_packages: Vec::new(),
        })
    }

    /// Name-keyed lookup over the merged catalog.
    pub fn by_name(&self) -> HashMap<String, &Package> {
        self.packages
            .iter()
            .map(|pkg| (pkg.name.clone(), pkg))
            .collect()
    }
}
