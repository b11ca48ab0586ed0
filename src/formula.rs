//! Raw upstream documents: Homebrew formula/cask records and analytics
//!
//! These structs mirror the JSON contracts of the remote catalog API and of
//! `brew info --json`. Only the fields the engine consumes are modeled;
//! everything else in the payload is ignored on decode. Fields default so
//! that partial records (common in tap output) still decode.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A formula record as published by the catalog API or `brew info --json=v1`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Formula {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub tap: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub versions: Versions,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub build_dependencies: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub bottle: Bottle,
    #[serde(default)]
    pub installed: Vec<InstalledRecord>,
    #[serde(default)]
    pub outdated: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub deprecated: bool,

    /// Set by the installed-formulae fetcher, not present in the payload.
    #[serde(skip)]
    pub locally_installed: bool,
    /// Cellar path derived from the host manager prefix.
    #[serde(skip)]
    pub local_path: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Versions {
    #[serde(default)]
    pub stable: Option<String>,
    #[serde(default)]
    pub head: Option<String>,
}

/// A declared platform/toolchain requirement (e.g. `{"name": "macos"}`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Requirement {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Bottle {
    #[serde(default)]
    pub stable: Option<BottleStable>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BottleStable {
    /// Keyed by target tag, e.g. `arm64_sonoma`, `x86_64_linux`.
    #[serde(default)]
    pub files: HashMap<String, BottleFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BottleFile {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sha256: String,
}

/// One installed-keg record from `brew info --json=v1 --installed`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstalledRecord {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub installed_as_dependency: bool,
    #[serde(default)]
    pub installed_on_request: bool,
}

/// A cask record from the catalog API or `brew info --json=v2 --cask`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cask {
    pub token: String,
    #[serde(default)]
    pub full_token: String,
    /// Display names; the first entry is the canonical one.
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(rename = "desc", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Installed version string, present only for installed casks.
    #[serde(default)]
    pub installed: Option<String>,
    #[serde(default)]
    pub outdated: bool,

    #[serde(skip)]
    pub locally_installed: bool,
}

/// `brew info --json=v2` wraps casks in an envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct CaskEnvelope {
    #[serde(default)]
    pub casks: Vec<Cask>,
}

/// A 90-day analytics table (install-on-request or cask-install).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Analytics {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub items: Vec<AnalyticsItem>,
}

/// One analytics row. `formula` is set in the formula table, `cask` in the
/// cask table; `count` arrives comma-grouped ("1,234,567").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalyticsItem {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub cask: String,
    #[serde(default)]
    pub count: String,
    #[serde(default)]
    pub percent: String,
}

impl AnalyticsItem {
    /// Parse the comma-grouped download count; unparseable counts are zero.
    pub fn downloads(&self) -> u64 {
        self.count.replace(',', "").parse().unwrap_or(0)
    }
}
