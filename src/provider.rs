//! Source fetchers: the nine queries that feed the catalog
//!
//! Every fetcher follows the same policy: consult the disk cache at the
//! source's TTL unless a forced refresh was requested, otherwise run the
//! live query through the [`Transport`], stamp installed-state where the
//! source is an installed source, write the raw payload back to cache, and
//! return. Fetchers never retry and never decide whether a failure is
//! fatal; that is the orchestrator's call.

use crate::cache::{document, DiskCache};
use crate::config::CacheConfig;
use crate::error::{FetchError, Result};
use crate::formula::{Analytics, AnalyticsItem, Cask, CaskEnvelope, Formula};
use crate::manifest::ManifestEntry;
use crate::package::{Package, PackageKind};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::exec::Transport;

/// Remote catalog and analytics endpoints the provider queries.
#[derive(Debug, Clone)]
pub struct SourceUrls {
    pub formula: String,
    pub cask: String,
    pub formula_analytics: String,
    pub cask_analytics: String,
}

/// Central access point for all package data sources.
///
/// Holds the transport, the disk cache, and the per-source TTLs. All
/// methods take `force_refresh`: when set, the cache consultation step is
/// skipped and a live query always runs.
pub struct DataProvider {
    transport: Arc<dyn Transport>,
    cache: DiskCache,
    ttl: CacheConfig,
    urls: SourceUrls,
    // Resolved once per process; `brew --prefix` does not change mid-run.
    prefix: Mutex<Option<Option<PathBuf>>>,
}

impl DataProvider {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: DiskCache,
        ttl: CacheConfig,
        urls: SourceUrls,
    ) -> Self {
        Self {
            transport,
            cache,
            ttl,
            urls,
            prefix: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    /// Installed formulae via `brew info --json=v1 --installed`.
    pub async fn installed_formulae(&self, force_refresh: bool) -> Result<Vec<Formula>> {
        if !force_refresh {
            if let Some(data) = self
                .cache
                .read(document::INSTALLED_FORMULAE, self.ttl.installed_ttl)
                .await
            {
                if let Ok(mut formulae) = serde_json::from_slice::<Vec<Formula>>(&data) {
                    self.stamp_formulae_installed(&mut formulae).await;
                    return Ok(formulae);
                }
            }
        }

        let output = self
            .transport
            .command("brew", &["info", "--json=v1", "--installed"])
            .await?;

        let mut formulae: Vec<Formula> =
            serde_json::from_slice(&output).map_err(|e| FetchError::MalformedPayload {
                source_name: "installed formulae".to_string(),
                message: e.to_string(),
            })?;

        self.stamp_formulae_installed(&mut formulae).await;
        self.cache
            .write_best_effort(document::INSTALLED_FORMULAE, &output)
            .await;
        Ok(formulae)
    }

    /// Installed casks: `brew list --cask` followed by a batched info query.
    ///
    /// A failing list or info query means "no casks installed", not an
    /// error; cask support is absent on some hosts.
    pub async fn installed_casks(&self, force_refresh: bool) -> Result<Vec<Cask>> {
        if !force_refresh {
            if let Some(data) = self
                .cache
                .read(document::INSTALLED_CASKS, self.ttl.installed_ttl)
                .await
            {
                if let Ok(envelope) = serde_json::from_slice::<CaskEnvelope>(&data) {
                    let mut casks = envelope.casks;
                    stamp_casks_installed(&mut casks);
                    return Ok(casks);
                }
            }
        }

        let names = match self.transport.command("brew", &["list", "--cask"]).await {
            Ok(output) => parse_name_lines(&output),
            Err(_) => return Ok(Vec::new()),
        };
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec!["info", "--json=v2", "--cask"];
        args.extend(names.iter().map(String::as_str));
        let output = match self.transport.command("brew", &args).await {
            Ok(output) => output,
            Err(_) => return Ok(Vec::new()),
        };

        let envelope: CaskEnvelope =
            serde_json::from_slice(&output).map_err(|e| FetchError::MalformedPayload {
                source_name: "installed casks".to_string(),
                message: e.to_string(),
            })?;

        let mut casks = envelope.casks;
        stamp_casks_installed(&mut casks);
        self.cache
            .write_best_effort(document::INSTALLED_CASKS, &output)
            .await;
        Ok(casks)
    }

    /// Remote formula catalog from the published API.
    pub async fn remote_formulae(&self, force_refresh: bool) -> Result<Vec<Formula>> {
        if !force_refresh {
            if let Some(data) = self
                .cache
                .read(document::REMOTE_FORMULAE, self.ttl.remote_ttl)
                .await
            {
                // An empty decoded list is treated as a miss.
                if let Ok(formulae) = serde_json::from_slice::<Vec<Formula>>(&data) {
                    if !formulae.is_empty() {
                        return Ok(formulae);
                    }
                }
            }
        }

        let body = self.transport.http_get(&self.urls.formula).await?;
        let formulae: Vec<Formula> =
            serde_json::from_slice(&body).map_err(|e| FetchError::MalformedPayload {
                source_name: "remote formulae".to_string(),
                message: e.to_string(),
            })?;

        self.cache
            .write_best_effort(document::REMOTE_FORMULAE, &body)
            .await;
        Ok(formulae)
    }

    /// Remote cask catalog from the published API.
    pub async fn remote_casks(&self, force_refresh: bool) -> Result<Vec<Cask>> {
        if !force_refresh {
            if let Some(data) = self
                .cache
                .read(document::REMOTE_CASKS, self.ttl.remote_ttl)
                .await
            {
                if let Ok(casks) = serde_json::from_slice::<Vec<Cask>>(&data) {
                    if !casks.is_empty() {
                        return Ok(casks);
                    }
                }
            }
        }

        let body = self.transport.http_get(&self.urls.cask).await?;
        let casks: Vec<Cask> =
            serde_json::from_slice(&body).map_err(|e| FetchError::MalformedPayload {
                source_name: "remote casks".to_string(),
                message: e.to_string(),
            })?;

        self.cache
            .write_best_effort(document::REMOTE_CASKS, &body)
            .await;
        Ok(casks)
    }

    /// Formula install-on-request analytics, keyed by formula name.
    pub async fn formula_analytics(
        &self,
        force_refresh: bool,
    ) -> Result<HashMap<String, AnalyticsItem>> {
        self.analytics_table(
            force_refresh,
            document::FORMULA_ANALYTICS,
            &self.urls.formula_analytics.clone(),
            "formula analytics",
            |item| {
                if item.formula.is_empty() {
                    None
                } else {
                    Some(item.formula.clone())
                }
            },
        )
        .await
    }

    /// Cask install analytics, keyed by cask token. Rows without a cask
    /// token are skipped.
    pub async fn cask_analytics(
        &self,
        force_refresh: bool,
    ) -> Result<HashMap<String, AnalyticsItem>> {
        self.analytics_table(
            force_refresh,
            document::CASK_ANALYTICS,
            &self.urls.cask_analytics.clone(),
            "cask analytics",
            |item| {
                if item.cask.is_empty() {
                    None
                } else {
                    Some(item.cask.clone())
                }
            },
        )
        .await
    }

    async fn analytics_table(
        &self,
        force_refresh: bool,
        cache_name: &str,
        url: &str,
        source: &str,
        key_of: impl Fn(&AnalyticsItem) -> Option<String>,
    ) -> Result<HashMap<String, AnalyticsItem>> {
        if !force_refresh {
            if let Some(data) = self.cache.read(cache_name, self.ttl.analytics_ttl).await {
                if let Ok(analytics) = serde_json::from_slice::<Analytics>(&data) {
                    if !analytics.items.is_empty() {
                        return Ok(index_analytics(analytics, &key_of));
                    }
                }
            }
        }

        let body = self.transport.http_get(url).await?;
        let analytics: Analytics =
            serde_json::from_slice(&body).map_err(|e| FetchError::MalformedPayload {
                source_name: source.to_string(),
                message: e.to_string(),
            })?;

        self.cache.write_best_effort(cache_name, &body).await;
        Ok(index_analytics(analytics, &key_of))
    }

    /// Installed formula names via `brew list --formula`.
    ///
    /// Used to re-stamp installed flags where the full installed fetch may
    /// not have covered a package (manifest mode, post-mutation refresh).
    /// A failing query yields an empty set.
    pub async fn installed_formula_names(&self) -> HashSet<String> {
        self.installed_names("--formula").await
    }

    /// Installed cask names via `brew list --cask`.
    pub async fn installed_cask_names(&self) -> HashSet<String> {
        self.installed_names("--cask").await
    }

    async fn installed_names(&self, kind_flag: &str) -> HashSet<String> {
        match self.transport.command("brew", &["list", kind_flag]).await {
            Ok(output) => parse_name_lines(&output).into_iter().collect(),
            Err(e) => {
                debug!("installed-name lookup failed ({}): {}", kind_flag, e);
                HashSet::new()
            }
        }
    }

    /// The host manager prefix (`brew --prefix`), resolved once.
    pub async fn prefix_path(&self) -> Option<PathBuf> {
        let mut cached = self.prefix.lock().await;
        if let Some(known) = cached.as_ref() {
            return known.clone();
        }
        let resolved = match self.transport.command("brew", &["--prefix"]).await {
            Ok(output) => {
                let text = String::from_utf8_lossy(&output);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(trimmed))
                }
            }
            Err(_) => None,
        };
        *cached = Some(resolved.clone());
        resolved
    }

    async fn stamp_formulae_installed(&self, formulae: &mut [Formula]) {
        let prefix = self.prefix_path().await;
        for formula in formulae.iter_mut() {
            formula.locally_installed = true;
            formula.local_path = prefix
                .as_ref()
                .map(|p| p.join("Cellar").join(&formula.name));
        }
    }

    /// Package info for manifest entries living outside the main catalog.
    ///
    /// Partitions the wanted names into already-known (present in
    /// `existing`), cached, and missing; fetches only the missing ones,
    /// batched per kind with a per-name fallback when the batch query
    /// fails; synthesizes an "info unavailable" entry for names that still
    /// fail. The full result set is cached under one document, keyed by
    /// request rather than per name.
    pub async fn tap_packages(
        &self,
        entries: &[ManifestEntry],
        existing: &HashMap<String, Package>,
        force_refresh: bool,
    ) -> Result<Vec<Package>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut result: Vec<Package> = Vec::new();
        let mut found: HashSet<String> = HashSet::new();

        let mut cached: HashMap<String, Package> = HashMap::new();
        if !force_refresh {
            if let Some(data) = self
                .cache
                .read(document::TAP_PACKAGES, self.ttl.tap_ttl)
                .await
            {
                if let Ok(packages) = serde_json::from_slice::<Vec<Package>>(&data) {
                    for pkg in packages {
                        cached.insert(pkg.name.clone(), pkg);
                    }
                }
            }
        }

        let mut missing_formulae: Vec<String> = Vec::new();
        let mut missing_casks: Vec<String> = Vec::new();

        for entry in entries {
            if let Some(pkg) = existing.get(&entry.name) {
                if found.insert(entry.name.clone()) {
                    result.push(pkg.clone());
                }
                continue;
            }
            if let Some(pkg) = cached.get(&entry.name) {
                if found.insert(entry.name.clone()) {
                    result.push(pkg.clone());
                }
                continue;
            }
            match entry.kind {
                PackageKind::Cask => missing_casks.push(entry.name.clone()),
                _ => missing_formulae.push(entry.name.clone()),
            }
        }

        if !missing_casks.is_empty() {
            let fetched = self.fetch_packages_info(&missing_casks, true).await;
            for name in &missing_casks {
                let pkg = fetched
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Package::unavailable(name, PackageKind::Cask));
                if found.insert(name.clone()) {
                    result.push(pkg);
                }
            }
        }

        if !missing_formulae.is_empty() {
            let fetched = self.fetch_packages_info(&missing_formulae, false).await;
            for name in &missing_formulae {
                let pkg = fetched
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Package::unavailable(name, PackageKind::Formula));
                if found.insert(name.clone()) {
                    result.push(pkg);
                }
            }
        }

        if !result.is_empty() {
            match serde_json::to_vec(&result) {
                Ok(data) => {
                    self.cache
                        .write_best_effort(document::TAP_PACKAGES, &data)
                        .await
                }
                Err(e) => warn!("tap package cache encode failed: {}", e),
            }
        }

        Ok(result)
    }

    /// Batched `brew info` for a list of names, falling back to one-at-a-time
    /// queries when the batch invocation fails (a single unknown name fails
    /// the whole batch).
    async fn fetch_packages_info(&self, names: &[String], is_cask: bool) -> HashMap<String, Package> {
        let mut result = HashMap::new();
        if names.is_empty() {
            return result;
        }

        let mut args: Vec<&str> = if is_cask {
            vec!["info", "--json=v2", "--cask"]
        } else {
            vec!["info", "--json=v1"]
        };
        args.extend(names.iter().map(String::as_str));

        let output = match self.transport.command("brew", &args).await {
            Ok(output) => output,
            Err(e) => {
                debug!("batch tap info failed, falling back to singles: {}", e);
                for name in names {
                    if let Some(pkg) = self.fetch_single_package_info(name, is_cask).await {
                        result.insert(name.clone(), pkg);
                    }
                }
                return result;
            }
        };

        if is_cask {
            if let Ok(envelope) = serde_json::from_slice::<CaskEnvelope>(&output) {
                for cask in &envelope.casks {
                    let pkg = Package::from_cask(cask);
                    result.insert(cask.token.clone(), pkg.clone());
                    // Tap casks are often addressed by their full token.
                    if !cask.full_token.is_empty() && cask.full_token != cask.token {
                        result.insert(cask.full_token.clone(), pkg);
                    }
                }
            }
        } else if let Ok(formulae) = serde_json::from_slice::<Vec<Formula>>(&output) {
            for formula in &formulae {
                let pkg = Package::from_formula(formula);
                result.insert(formula.name.clone(), pkg.clone());
                if !formula.full_name.is_empty() && formula.full_name != formula.name {
                    result.insert(formula.full_name.clone(), pkg);
                }
            }
        }

        result
    }

    async fn fetch_single_package_info(&self, name: &str, is_cask: bool) -> Option<Package> {
        let args: Vec<&str> = if is_cask {
            vec!["info", "--json=v2", "--cask", name]
        } else {
            vec!["info", "--json=v1", name]
        };
        let output = self.transport.command("brew", &args).await.ok()?;

        if is_cask {
            let envelope: CaskEnvelope = serde_json::from_slice(&output).ok()?;
            envelope.casks.first().map(Package::from_cask)
        } else {
            let formulae: Vec<Formula> = serde_json::from_slice(&output).ok()?;
            formulae.first().map(Package::from_formula)
        }
    }
}

fn stamp_casks_installed(casks: &mut [Cask]) {
    for cask in casks.iter_mut() {
        cask.locally_installed = true;
    }
}

fn parse_name_lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn index_analytics(
    analytics: Analytics,
    key_of: &impl Fn(&AnalyticsItem) -> Option<String>,
) -> HashMap<String, AnalyticsItem> {
    let mut result = HashMap::new();
    for item in analytics.items {
        if let Some(key) = key_of(&item) {
            result.insert(key, item);
        }
    }
    result
}
