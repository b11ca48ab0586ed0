//! Manifest (Brewfile) support: location, parsing, two-phase resolution
//!
//! The manifest is a line-oriented declarative file naming taps to enable
//! and packages wanted. Parsing is best-effort: blank lines, comments, and
//! malformed lines are skipped, never rejected. Resolution runs in two
//! phases so the UI can render something immediately at startup:
//!
//! - Phase A substitutes placeholders for entries whose tap is not
//!   installed yet.
//! - Phase B, after taps are installed and the catalog refreshed, reports
//!   those entries as missing so the caller can fetch them through the tap
//!   path instead.
//!
//! Both phases are pure functions of their inputs; the orchestrator owns
//! all fetching.

use crate::error::{ManifestError, Result};
use crate::package::{Package, PackageKind};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One package declaration from the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub kind: PackageKind,
}

/// Parsed manifest: extension repositories to enable, packages wanted.
///
/// Immutable once parsed; a re-parse rebuilds it from scratch.
#[derive(Debug, Clone, Default)]
pub struct ManifestDoc {
    pub taps: Vec<String>,
    pub entries: Vec<ManifestEntry>,
}

/// A manifest file ready to read, plus its cleanup obligation.
///
/// Remote manifests are downloaded to a temp file that is removed when
/// this value drops; local manifests carry no cleanup.
pub struct ResolvedManifestPath {
    path: PathBuf,
    _temp: Option<tempfile::NamedTempFile>,
}

impl ResolvedManifestPath {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Resolve a manifest location: a local filesystem path, or an `https://`
/// URL downloaded to a temporary file before parsing.
pub async fn resolve_manifest_path(location: &str) -> Result<ResolvedManifestPath> {
    if location.starts_with("https://") {
        let file = download_manifest(location).await?;
        return Ok(ResolvedManifestPath {
            path: file.path().to_path_buf(),
            _temp: Some(file),
        });
    }

    let path = PathBuf::from(location);
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: location.to_string(),
        }
        .into());
    }
    Ok(ResolvedManifestPath { path, _temp: None })
}

async fn download_manifest(url: &str) -> Result<tempfile::NamedTempFile> {
    debug!("downloading manifest from {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| ManifestError::DownloadFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ManifestError::DownloadFailed {
            url: url.to_string(),
            message: format!("HTTP {status}"),
        }
        .into());
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ManifestError::DownloadFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let file = tempfile::Builder::new()
        .prefix("brewdeck-manifest-")
        .tempfile()?;
    tokio::fs::write(file.path(), &body).await?;
    Ok(file)
}

/// Parse a manifest file from disk.
pub fn parse_manifest_file(path: &Path) -> Result<ManifestDoc> {
    let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Unreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(parse_manifest(&content))
}

/// Parse manifest text. Directives: `tap "<name>"`, `brew "<name>"`,
/// `cask "<name>"`, `flatpak "<id>"`. The first and last straight double
/// quote on the line delimit the value, which tolerates trailing comments
/// after the closing quote. Malformed lines are ignored.
pub fn parse_manifest(content: &str) -> ManifestDoc {
    let mut doc = ManifestDoc::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("tap ") {
            // Tap names never contain quotes: take the first quoted span.
            if let Some(name) = first_quoted(rest) {
                doc.taps.push(name.to_string());
            }
            continue;
        }

        for (directive, kind) in [
            ("brew ", PackageKind::Formula),
            ("cask ", PackageKind::Cask),
            ("flatpak ", PackageKind::Flatpak),
        ] {
            if let Some(rest) = line.strip_prefix(directive) {
                if let Some(name) = outer_quoted(rest) {
                    doc.entries.push(ManifestEntry {
                        name: name.to_string(),
                        kind,
                    });
                }
                break;
            }
        }
    }

    doc
}

fn first_quoted(text: &str) -> Option<&str> {
    let start = text.find('"')?;
    let rest = &text[start + 1..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn outer_quoted(text: &str) -> Option<&str> {
    let start = text.find('"')?;
    let end = text.rfind('"')?;
    if end <= start {
        return None;
    }
    Some(&text[start + 1..end])
}

/// Which resolution pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvePhase {
    /// Startup: unresolved entries become placeholder packages.
    Placeholder,
    /// Post tap installation: unresolved entries are reported as missing.
    Resolved,
}

/// Lookup state the resolver reads. All borrowed; the resolver never
/// mutates shared maps.
pub struct ResolveContext<'a> {
    /// Merged catalog keyed by canonical name.
    pub catalog: &'a HashMap<String, Package>,
    pub installed_formulae: &'a HashSet<String>,
    pub installed_casks: &'a HashSet<String>,
    pub flatpak_installed: &'a HashSet<String>,
    pub flatpak_metadata: &'a HashMap<String, Package>,
}

/// Output of one resolution pass.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    pub packages: Vec<Package>,
    /// Entries not resolvable from the catalog; empty in placeholder phase.
    pub missing: Vec<ManifestEntry>,
}

/// Resolve manifest entries against the current catalog.
///
/// Catalog hits are re-stamped with a fresh installed-name lookup: the
/// catalog's own installed flag is not trusted in manifest mode, since
/// manifest packages may come from sources whose stamping pass never ran.
/// Flatpak entries resolve against the secondary manager's maps. Whatever
/// remains is a tap entry, handled per phase.
pub fn resolve_entries(
    doc: &ManifestDoc,
    ctx: &ResolveContext<'_>,
    phase: ResolvePhase,
) -> ResolveOutcome {
    let mut outcome = ResolveOutcome::default();
    let mut found: HashSet<String> = HashSet::new();

    for entry in &doc.entries {
        if found.contains(&entry.name) {
            continue;
        }

        if entry.kind == PackageKind::Flatpak {
            let mut pkg = ctx
                .flatpak_metadata
                .get(&entry.name)
                .cloned()
                .unwrap_or_else(|| {
                    let mut p = Package::placeholder(&entry.name, PackageKind::Flatpak);
                    p.description = String::new();
                    p
                });
            pkg.kind = PackageKind::Flatpak;
            pkg.installed = ctx.flatpak_installed.contains(&entry.name);
            outcome.packages.push(pkg);
            found.insert(entry.name.clone());
            continue;
        }

        match ctx.catalog.get(&entry.name) {
            Some(pkg) if pkg.kind == entry.kind => {
                let mut pkg = pkg.clone();
                pkg.installed = stamped_installed(&pkg.name, entry.kind, ctx);
                outcome.packages.push(pkg);
                found.insert(entry.name.clone());
            }
            _ => match phase {
                ResolvePhase::Placeholder => {
                    outcome
                        .packages
                        .push(Package::placeholder(&entry.name, entry.kind));
                    found.insert(entry.name.clone());
                }
                ResolvePhase::Resolved => outcome.missing.push(entry.clone()),
            },
        }
    }

    outcome
}

/// Fold tap-fetched packages into a resolution outcome and finalize it:
/// re-stamp installed flags, de-duplicate by name (first occurrence wins),
/// and sort by name.
pub fn finalize(
    mut packages: Vec<Package>,
    tap_packages: Vec<Package>,
    ctx: &ResolveContext<'_>,
) -> Vec<Package> {
    let mut seen: HashSet<String> = packages.iter().map(|pkg| pkg.name.clone()).collect();

    for mut pkg in tap_packages {
        if seen.contains(&pkg.name) {
            continue;
        }
        if pkg.kind != PackageKind::Flatpak {
            pkg.installed = stamped_installed(&pkg.name, pkg.kind, ctx);
        }
        seen.insert(pkg.name.clone());
        packages.push(pkg);
    }

    packages.sort_by(|a, b| a.name.cmp(&b.name));
    packages
}

fn stamped_installed(name: &str, kind: PackageKind, ctx: &ResolveContext<'_>) -> bool {
    match kind {
        PackageKind::Cask => ctx.installed_casks.contains(name),
        PackageKind::Flatpak => ctx.flatpak_installed.contains(name),
        PackageKind::Formula => ctx.installed_formulae.contains(name),
    }
}
