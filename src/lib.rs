//! # brewdeck
//!
//! Package catalog synchronization and caching engine for a terminal
//! dashboard over Homebrew (and optionally Flatpak). The engine keeps a
//! unified, queryable catalog of formulae, casks, and flatpaks by merging
//! installed-state queries against the host package manager with the
//! published remote catalogs and analytics, all behind a TTL-gated disk
//! cache.
//!
//! ## Features
//!
//! - **Unified catalog**: formulae, casks, and flatpaks as one package
//!   model, installed records taking precedence over remote ones
//! - **Disk cache**: every source document cached with a per-source TTL,
//!   so restarts render instantly and offline hosts degrade gracefully
//! - **Query pipeline**: filtering, substring search with popularity
//!   ranking, and kind-based sorting as a pure function
//! - **Manifest mode**: a declarative Brewfile restricts the catalog to
//!   wanted packages, with two-phase resolution across tap installation
//! - **Mutations**: install, update, and remove for single packages and
//!   batches, with per-item outcome reporting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brewdeck::{CatalogManager, BrewDeckConfig, Filter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BrewDeckConfig::load()?;
//!     let (manager, mut updates) = CatalogManager::new(config)?;
//!
//!     tokio::spawn(async move {
//!         while let Some(update) = updates.recv().await {
//!             // hand each update to the rendering layer
//!             let _ = update;
//!         }
//!     });
//!
//!     manager.boot().await?;
//!     let shown = manager.query(Filter::Installed, "", false);
//!     println!("{} installed packages", shown.len());
//!     Ok(())
//! }
//! ```

pub mod brew;
pub mod cache;
pub mod config;
pub mod error;
pub mod exec;
pub mod flatpak;
pub mod formula;
pub mod manifest;
pub mod merge;
pub mod package;
pub mod provider;
pub mod query;
pub mod refresh;
pub mod ui;

pub use brew::{BatchReport, Operation, PackageOperator};
pub use cache::DiskCache;
pub use config::{BrewDeckConfig, Platform};
pub use error::{BrewDeckError, Result};
pub use package::{CatalogSnapshot, Package, PackageKind};
pub use query::Filter;
pub use refresh::{RefreshMode, RefreshOrchestrator, RefreshPhase};
pub use ui::{StatusLevel, UiSink, UiStream, UiUpdate};

use crate::brew::BrewService;
use crate::exec::{SystemTransport, Transport};
use crate::manifest::{parse_manifest_file, resolve_manifest_path};
use crate::provider::{DataProvider, SourceUrls};
use std::sync::Arc;
use tracing::info;

/// Main entry point, wiring configuration, transport, cache, fetchers,
/// mutations, and the refresh orchestrator together.
///
/// Construction is cheap and performs no I/O; [`boot`](Self::boot) runs the
/// host manager probe and the first refresh cycle.
pub struct CatalogManager {
    config: BrewDeckConfig,
    provider: Arc<DataProvider>,
    operator: PackageOperator,
    orchestrator: RefreshOrchestrator,
    ui: UiSink,
}

impl CatalogManager {
    /// Create a manager and the stream of UI updates it will emit.
    ///
    /// The caller owns the receiving half and drains it on its control
    /// thread; dropping it silently discards further updates.
    pub fn new(config: BrewDeckConfig) -> Result<(Self, UiStream)> {
        let transport: Arc<dyn Transport> = Arc::new(SystemTransport::new(config.registry.timeout)?);
        let cache = DiskCache::new(config.cache.dir.clone());
        let urls = SourceUrls {
            formula: config.registry.formula_url.clone(),
            cask: config.registry.cask_url.clone(),
            formula_analytics: config.registry.formula_analytics_url.clone(),
            cask_analytics: config.registry.cask_analytics_url.clone(),
        };
        let provider = Arc::new(DataProvider::new(
            Arc::clone(&transport),
            cache,
            config.cache.clone(),
            urls,
        ));
        let operator = PackageOperator::new(Arc::clone(&transport));
        let orchestrator = RefreshOrchestrator::new(Arc::clone(&provider), config.platform);
        let (ui, stream) = ui::channel();

        Ok((
            Self {
                config,
                provider,
                operator,
                orchestrator,
                ui,
            },
            stream,
        ))
    }

    /// Probe the host manager and publish the first catalog snapshot.
    ///
    /// An unusable `brew` binary is the one fatal boot error; individual
    /// source failures degrade to partial data instead.
    pub async fn boot(&self) -> Result<Arc<CatalogSnapshot>> {
        let version = self.brew().version().await?;
        info!("host manager: {}", version);

        self.provider.cache().ensure_dir().await?;
        Ok(self.orchestrator.refresh(RefreshMode::Startup, &self.ui).await)
    }

    /// Boot in manifest mode: publish the full catalog, then resolve the
    /// manifest at `location` (a local path or an `https://` URL) into the
    /// snapshot's manifest list.
    pub async fn boot_with_manifest(&self, location: &str) -> Result<Arc<CatalogSnapshot>> {
        self.boot().await?;
        let resolved = resolve_manifest_path(location).await?;
        let doc = parse_manifest_file(resolved.path())?;
        info!(
            "manifest parsed: {} taps, {} entries",
            doc.taps.len(),
            doc.entries.len()
        );
        Ok(self
            .orchestrator
            .resolve_manifest(&doc, &self.operator, &self.ui)
            .await)
    }

    /// Run a refresh cycle and return the published snapshot.
    pub async fn refresh(&self, mode: RefreshMode) -> Arc<CatalogSnapshot> {
        self.orchestrator.refresh(mode, &self.ui).await
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.orchestrator.snapshot()
    }

    /// Query the full catalog for display.
    pub fn query(&self, filter: Filter, search_text: &str, sort_by_kind: bool) -> Vec<Package> {
        query::query(&self.snapshot().packages, filter, search_text, sort_by_kind)
    }

    /// Query the manifest-restricted list for display.
    pub fn query_manifest(
        &self,
        filter: Filter,
        search_text: &str,
        sort_by_kind: bool,
    ) -> Vec<Package> {
        query::query(
            &self.snapshot().manifest_packages,
            filter,
            search_text,
            sort_by_kind,
        )
    }

    /// Run the query pipeline and push the result to the rendering layer.
    ///
    /// Returns the number of packages shown. In manifest mode the query
    /// runs over the manifest-restricted list instead of the full catalog.
    pub fn publish_list(
        &self,
        manifest_mode: bool,
        filter: Filter,
        search_text: &str,
        sort_by_kind: bool,
        scroll_to_top: bool,
    ) -> usize {
        let snapshot = self.snapshot();
        let source = if manifest_mode {
            &snapshot.manifest_packages
        } else {
            &snapshot.packages
        };
        let packages = query::query(source, filter, search_text, sort_by_kind);
        let filtered = packages.len();
        let _ = self.ui.send(UiUpdate::DisplayList {
            packages,
            total: source.len(),
            filtered,
            scroll_to_top,
        });
        filtered
    }

    /// Push one package's detail pane to the rendering layer.
    pub fn show_detail(&self, pkg: &Package) {
        let _ = self.ui.send(UiUpdate::Detail(Box::new(pkg.clone())));
    }

    /// Apply one mutation, then refresh installed state.
    pub async fn apply(&self, op: Operation, pkg: &Package) -> Result<Arc<CatalogSnapshot>> {
        self.operator.apply(op, pkg, &self.ui).await?;
        Ok(self.refresh(RefreshMode::PostMutation).await)
    }

    /// Apply one mutation to a batch, then refresh installed state.
    ///
    /// Per-item failures are reported in the returned [`BatchReport`] and
    /// never abort the batch.
    pub async fn apply_batch(
        &self,
        op: Operation,
        packages: &[Package],
        skip: Option<(&str, fn(&Package) -> bool)>,
    ) -> (BatchReport, Arc<CatalogSnapshot>) {
        let report = self.operator.apply_batch(op, packages, skip, &self.ui).await;
        let snapshot = self.refresh(RefreshMode::PostMutation).await;
        (report, snapshot)
    }

    /// Upgrade every outdated package, then refresh installed state. The
    /// host manager's own metadata is refreshed first so the upgrade sees
    /// current versions.
    pub async fn upgrade_all(&self) -> Result<Arc<CatalogSnapshot>> {
        self.brew().update_metadata().await?;
        self.brew().upgrade_all(&self.ui).await?;
        Ok(self.refresh(RefreshMode::PostMutation).await)
    }

    pub fn config(&self) -> &BrewDeckConfig {
        &self.config
    }

    pub fn provider(&self) -> &DataProvider {
        &self.provider
    }

    pub fn operator(&self) -> &PackageOperator {
        &self.operator
    }

    pub fn orchestrator(&self) -> &RefreshOrchestrator {
        &self.orchestrator
    }

    fn brew(&self) -> &BrewService {
        self.operator.brew()
    }
}
