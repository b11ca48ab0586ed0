//! Refresh orchestrator: fetch, merge, publish
//!
//! A refresh cycle walks Fetching, then Merging, then Published, and swaps
//! in a complete snapshot at the end. Readers keep whatever snapshot they
//! already hold until the swap; concurrent cycles race benignly and the
//! last publish wins. A source that fails during a cycle degrades to an
//! empty document with a warning instead of aborting the cycle.

use crate::brew::PackageOperator;
use crate::config::Platform;
use crate::manifest::{
    finalize, resolve_entries, ManifestDoc, ResolveContext, ResolveOutcome, ResolvePhase,
};
use crate::merge::merge;
use crate::package::{CatalogSnapshot, Package, PackageKind};
use crate::provider::DataProvider;
use crate::ui::{StatusLevel, UiSink, UiSinkExt, UiUpdate};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

/// Where a refresh cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
    Merging,
    Published,
}

/// What kind of refresh is wanted. The mode decides which sources bypass
/// their cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Boot and periodic refreshes: every source may serve from cache.
    Startup,
    /// User-requested refresh: every source re-fetches.
    ForceAll,
    /// After an install/update/remove: installed-state sources re-fetch,
    /// remote catalogs and analytics stay cached.
    PostMutation,
}

impl RefreshMode {
    fn force_installed(&self) -> bool {
        matches!(self, RefreshMode::ForceAll | RefreshMode::PostMutation)
    }

    fn force_remote(&self) -> bool {
        matches!(self, RefreshMode::ForceAll)
    }
}

/// Owns the published snapshot and runs refresh cycles against it.
pub struct RefreshOrchestrator {
    provider: Arc<DataProvider>,
    platform: Platform,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    phase: Mutex<RefreshPhase>,
}

impl RefreshOrchestrator {
    pub fn new(provider: Arc<DataProvider>, platform: Platform) -> Self {
        Self {
            provider,
            platform,
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::default())),
            phase: Mutex::new(RefreshPhase::Idle),
        }
    }

    /// The currently published snapshot. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.read().expect("snapshot lock poisoned").clone()
    }

    pub fn phase(&self) -> RefreshPhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    fn set_phase(&self, phase: RefreshPhase) {
        *self.phase.lock().expect("phase lock poisoned") = phase;
    }

    fn publish(&self, snapshot: Arc<CatalogSnapshot>, ui: &UiSink) -> Arc<CatalogSnapshot> {
        {
            let mut slot = self.snapshot.write().expect("snapshot lock poisoned");
            *slot = snapshot.clone();
        }
        self.set_phase(RefreshPhase::Published);
        let _ = ui.send(UiUpdate::RefreshComplete);
        snapshot
    }

    /// Run one full refresh cycle and publish the result.
    ///
    /// Each source is collected in turn; a failing source is logged, shown
    /// as a warning, and replaced by an empty document. The merge and the
    /// publish always happen, so a boot with no network still renders the
    /// installed packages.
    pub async fn refresh(&self, mode: RefreshMode, ui: &UiSink) -> Arc<CatalogSnapshot> {
        self.set_phase(RefreshPhase::Fetching);
        let force_installed = mode.force_installed();
        let force_remote = mode.force_remote();

        let installed_formulae = self
            .provider
            .installed_formulae(force_installed)
            .await
            .unwrap_or_else(|e| self.degrade("installed formulae", e, ui));
        let installed_casks = self
            .provider
            .installed_casks(force_installed)
            .await
            .unwrap_or_else(|e| self.degrade("installed casks", e, ui));
        let remote_formulae = self
            .provider
            .remote_formulae(force_remote)
            .await
            .unwrap_or_else(|e| self.degrade("remote formulae", e, ui));
        let remote_casks = self
            .provider
            .remote_casks(force_remote)
            .await
            .unwrap_or_else(|e| self.degrade("remote casks", e, ui));
        let formula_analytics = self
            .provider
            .formula_analytics(force_remote)
            .await
            .unwrap_or_else(|e| self.degrade("formula analytics", e, ui));
        let cask_analytics = self
            .provider
            .cask_analytics(force_remote)
            .await
            .unwrap_or_else(|e| self.degrade("cask analytics", e, ui));

        self.set_phase(RefreshPhase::Merging);
        let packages = merge(
            &installed_formulae,
            &remote_formulae,
            &formula_analytics,
            &installed_casks,
            &remote_casks,
            &cask_analytics,
            self.platform,
        );
        info!("merged catalog: {} packages", packages.len());

        // Manifest packages survive catalog refreshes untouched; they have
        // their own resolution cycle.
        let manifest_packages = self.snapshot().manifest_packages.clone();
        self.publish(
            Arc::new(CatalogSnapshot {
                packages,
                manifest_packages,
            }),
            ui,
        )
    }

    fn degrade<T: Default>(&self, source: &str, error: crate::error::BrewDeckError, ui: &UiSink) -> T {
        warn!("{} unavailable, continuing without it: {}", source, error);
        ui.status(
            StatusLevel::Warning,
            format!("Could not load {source}; showing partial data"),
        );
        T::default()
    }

    /// Startup resolution for a parsed manifest.
    ///
    /// Publishes a placeholder list immediately so the UI has something to
    /// render, then installs missing taps one at a time with per-tap
    /// feedback, refreshes installed state, and publishes the fully
    /// resolved list. Entries still unresolvable after tap installation go
    /// through the tap info path; names that fail even there keep a
    /// synthetic "info unavailable" row rather than vanishing.
    pub async fn resolve_manifest(
        &self,
        doc: &ManifestDoc,
        operator: &PackageOperator,
        ui: &UiSink,
    ) -> Arc<CatalogSnapshot> {
        let flatpak = if operator.flatpak().is_available().await {
            Some(operator.flatpak())
        } else {
            None
        };

        if let Some(service) = flatpak {
            if doc.entries.iter().any(|e| e.kind == PackageKind::Flatpak) {
                if let Err(e) = service.ensure_flathub_remote().await {
                    warn!("flathub remote setup failed: {}", e);
                }
            }
        }

        // Phase A: placeholders for anything not in the current catalog.
        let ctx_data = self.gather_context(flatpak).await;
        {
            let snapshot = self.snapshot();
            let catalog = owned_by_name(&snapshot.packages);
            let ctx = ctx_data.as_context(&catalog);
            let outcome = resolve_entries(doc, &ctx, ResolvePhase::Placeholder);
            let placeholders = finalize(outcome.packages, Vec::new(), &ctx);
            self.publish(
                Arc::new(CatalogSnapshot {
                    packages: snapshot.packages.clone(),
                    manifest_packages: placeholders,
                }),
                ui,
            );
        }

        // Install missing taps sequentially, surfacing each outcome.
        let mut taps_changed = false;
        for tap in &doc.taps {
            if operator.brew().is_tap_installed(tap).await {
                continue;
            }
            ui.status(StatusLevel::Warning, format!("Installing tap {tap}..."));
            match operator.brew().install_tap(tap, ui).await {
                Ok(()) => {
                    taps_changed = true;
                    ui.status(StatusLevel::Success, format!("Tap {tap} installed"));
                }
                Err(e) => {
                    warn!("tap install failed: {}: {}", tap, e);
                    ui.status(StatusLevel::Error, format!("Failed to install tap {tap}"));
                }
            }
        }

        // Phase B: resolve for real against a refreshed catalog.
        let snapshot = if taps_changed {
            self.refresh(RefreshMode::PostMutation, ui).await
        } else {
            self.snapshot()
        };

        let ctx_data = self.gather_context(flatpak).await;
        let catalog = owned_by_name(&snapshot.packages);
        let ctx = ctx_data.as_context(&catalog);
        let ResolveOutcome { packages, missing } = resolve_entries(doc, &ctx, ResolvePhase::Resolved);

        let tap_packages = if missing.is_empty() {
            Vec::new()
        } else {
            self.provider
                .tap_packages(&missing, &catalog, taps_changed)
                .await
                .unwrap_or_else(|e| {
                    warn!("tap package fetch failed: {}", e);
                    missing
                        .iter()
                        .map(|entry| Package::unavailable(&entry.name, entry.kind))
                        .collect()
                })
        };

        let resolved = finalize(packages, tap_packages, &ctx);
        self.publish(
            Arc::new(CatalogSnapshot {
                packages: snapshot.packages.clone(),
                manifest_packages: resolved,
            }),
            ui,
        )
    }

    async fn gather_context(&self, flatpak: Option<&crate::flatpak::FlatpakService>) -> ContextData {
        let installed_formulae = self.provider.installed_formula_names().await;
        let installed_casks = self.provider.installed_cask_names().await;

        let (flatpak_installed, flatpak_metadata) = match flatpak {
            Some(service) => {
                let installed = service.installed_apps().await.unwrap_or_default();
                let metadata = service.remote_metadata().await.unwrap_or_default();
                (installed, metadata)
            }
            None => (HashSet::new(), HashMap::new()),
        };

        ContextData {
            installed_formulae,
            installed_casks,
            flatpak_installed,
            flatpak_metadata,
        }
    }
}

struct ContextData {
    installed_formulae: HashSet<String>,
    installed_casks: HashSet<String>,
    flatpak_installed: HashSet<String>,
    flatpak_metadata: HashMap<String, Package>,
}

impl ContextData {
    fn as_context<'a>(&'a self, catalog: &'a HashMap<String, Package>) -> ResolveContext<'a> {
        ResolveContext {
            catalog,
            installed_formulae: &self.installed_formulae,
            installed_casks: &self.installed_casks,
            flatpak_installed: &self.flatpak_installed,
            flatpak_metadata: &self.flatpak_metadata,
        }
    }
}

fn owned_by_name(packages: &[Package]) -> HashMap<String, Package> {
    packages
        .iter()
        .map(|pkg| (pkg.name.clone(), pkg.clone()))
        .collect()
}
