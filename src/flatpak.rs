//! Secondary manager (Flatpak) queries and mutations
//!
//! Flatpak is optional: the probe gates every use, and manifest resolution
//! simply skips flatpak entries when the binary is absent. List output is
//! newline-delimited; remote metadata is tab-separated
//! (application, name, version, description).

use crate::error::{MutationError, Result};
use crate::exec::Transport;
use crate::package::{Package, PackageKind};
use crate::ui::{UiSink, UiSinkExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub struct FlatpakService {
    transport: Arc<dyn Transport>,
}

impl FlatpakService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Whether the flatpak binary is usable on this host.
    pub async fn is_available(&self) -> bool {
        self.transport
            .command("flatpak", &["--version"])
            .await
            .is_ok()
    }

    /// Add the flathub remote if it is missing. Failures are left to the
    /// caller to ignore; offline hosts still work from whatever remotes
    /// they have.
    pub async fn ensure_flathub_remote(&self) -> Result<()> {
        if let Ok(output) = self.transport.command("flatpak", &["remote-list"]).await {
            if String::from_utf8_lossy(&output).contains("flathub") {
                return Ok(());
            }
        }

        self.transport
            .command(
                "flatpak",
                &[
                    "remote-add",
                    "--if-not-exists",
                    "flathub",
                    "https://dl.flathub.org/repo/flathub.flatpakrepo",
                ],
            )
            .await?;
        Ok(())
    }

    /// Installed application IDs.
    pub async fn installed_apps(&self) -> Result<HashSet<String>> {
        let output = self
            .transport
            .command("flatpak", &["list", "--app", "--columns=application"])
            .await?;

        Ok(String::from_utf8_lossy(&output)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Metadata for every flathub application, keyed by application ID.
    ///
    /// Expensive; callers should invoke it once per refresh, not per entry.
    pub async fn remote_metadata(&self) -> Result<HashMap<String, Package>> {
        let output = self
            .transport
            .command(
                "flatpak",
                &[
                    "remote-ls",
                    "flathub",
                    "--app",
                    "--columns=application,name,version,description",
                ],
            )
            .await?;

        let mut metadata = HashMap::new();
        for line in String::from_utf8_lossy(&output).lines() {
            let mut parts = line.split('\t').map(str::trim);
            let Some(id) = parts.next().filter(|id| !id.is_empty()) else {
                continue;
            };
            let name = parts.next().unwrap_or(id);
            let version = parts.next().unwrap_or("");
            let description = parts.next().unwrap_or("");

            metadata.insert(
                id.to_string(),
                Package {
                    name: id.to_string(),
                    display_name: name.to_string(),
                    description: description.to_string(),
                    homepage: String::new(),
                    version: version.to_string(),
                    kind: PackageKind::Flatpak,
                    installed: false,
                    outdated: false,
                    rank: 0,
                    downloads: 0,
                    installed_on_request: true,
                    formula: None,
                    cask: None,
                },
            );
        }

        debug!("flathub metadata rows: {}", metadata.len());
        Ok(metadata)
    }

    /// Install an application from flathub.
    pub async fn install(&self, pkg: &Package, ui: &UiSink) -> Result<()> {
        self.mutate("install", &["install", "-y", "flathub", &pkg.name], pkg, ui)
            .await
    }

    /// Uninstall an application.
    pub async fn remove(&self, pkg: &Package, ui: &UiSink) -> Result<()> {
        self.mutate("remove", &["uninstall", "-y", &pkg.name], pkg, ui)
            .await
    }

    /// Update an application.
    pub async fn update(&self, pkg: &Package, ui: &UiSink) -> Result<()> {
        self.mutate("update", &["update", "-y", &pkg.name], pkg, ui)
            .await
    }

    async fn mutate(&self, verb: &str, args: &[&str], pkg: &Package, ui: &UiSink) -> Result<()> {
        let output = self
            .transport
            .command("flatpak", args)
            .await
            .map_err(|e| MutationError::OperationFailed {
                operation: verb.to_string(),
                name: pkg.name.clone(),
                message: e.to_string(),
            })?;

        for line in String::from_utf8_lossy(&output).lines() {
            ui.log_line(line);
        }
        Ok(())
    }
}
