//! Host package-manager command layer
//!
//! Mutations are delegated to the host manager as opaque operations: this
//! module picks the right invocation per package kind, streams command
//! output to the operation log, and reports outcomes. It never inspects or
//! second-guesses resolver behavior. Batch operations run item by item; a
//! failure is reported for that item and the rest of the batch proceeds.

use crate::error::{BrewDeckError, ConfigError, MutationError, Result};
use crate::exec::Transport;
use crate::flatpak::FlatpakService;
use crate::package::{Package, PackageKind};
use crate::ui::{StatusLevel, UiSink, UiSinkExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Thin wrapper over the `brew` binary.
pub struct BrewService {
    transport: Arc<dyn Transport>,
}

/// A mutation kind, dispatched through a fixed table per package kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Update,
    Remove,
}

impl Operation {
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Install => "install",
            Operation::Update => "update",
            Operation::Remove => "remove",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Operation::Install => "INSTALL",
            Operation::Update => "UPDATE",
            Operation::Remove => "REMOVE",
        }
    }
}

impl BrewService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Detect the host manager version. Failure here is a hard boot error:
    /// nothing works without `brew`.
    pub async fn version(&self) -> Result<String> {
        let output = self
            .transport
            .command("brew", &["--version"])
            .await
            .map_err(|e| ConfigError::HostManagerUnavailable {
                message: e.to_string(),
            })?;

        let text = String::from_utf8_lossy(&output);
        Ok(text.lines().next().unwrap_or("").trim().to_string())
    }

    /// `brew update`: refresh the host manager's own metadata.
    pub async fn update_metadata(&self) -> Result<()> {
        self.transport.command("brew", &["update"]).await?;
        Ok(())
    }

    /// Currently enabled taps.
    pub async fn taps(&self) -> HashSet<String> {
        match self.transport.command("brew", &["tap"]).await {
            Ok(output) => String::from_utf8_lossy(&output)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => HashSet::new(),
        }
    }

    pub async fn is_tap_installed(&self, tap: &str) -> bool {
        self.taps().await.contains(tap)
    }

    /// Enable one tap, streaming output to the operation log.
    pub async fn install_tap(&self, tap: &str, ui: &UiSink) -> Result<()> {
        let output = self
            .transport
            .command("brew", &["tap", tap])
            .await
            .map_err(|e| MutationError::TapInstallFailed {
                tap: tap.to_string(),
                message: e.to_string(),
            })?;
        for line in String::from_utf8_lossy(&output).lines() {
            ui.log_line(line);
        }
        Ok(())
    }

    /// Upgrade every outdated package.
    pub async fn upgrade_all(&self, ui: &UiSink) -> Result<()> {
        let output = self.transport.command("brew", &["upgrade"]).await?;
        for line in String::from_utf8_lossy(&output).lines() {
            ui.log_line(line);
        }
        Ok(())
    }

    async fn run_mutation(&self, op: Operation, pkg: &Package, ui: &UiSink) -> Result<()> {
        let name = pkg.name.as_str();
        let args: Vec<&str> = match (op, pkg.kind) {
            (Operation::Install, PackageKind::Cask) => vec!["install", "--cask", name],
            (Operation::Install, _) => vec!["install", name],
            (Operation::Update, PackageKind::Cask) => vec!["upgrade", "--cask", name],
            (Operation::Update, _) => vec!["upgrade", name],
            (Operation::Remove, PackageKind::Cask) => vec!["uninstall", "--cask", name],
            (Operation::Remove, _) => vec!["uninstall", name],
        };

        let output = self
            .transport
            .command("brew", &args)
            .await
            .map_err(|e| MutationError::OperationFailed {
                operation: op.verb().to_string(),
                name: pkg.name.clone(),
                message: e.to_string(),
            })?;

        for line in String::from_utf8_lossy(&output).lines() {
            ui.log_line(line);
        }
        Ok(())
    }
}

/// Outcome of a batch mutation. `attempted` counts every non-skipped item,
/// failures included; the final summary reports processed, not succeeded.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub attempted: usize,
    pub skipped: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, BrewDeckError)>,
}

/// Dispatches mutations to the right backend per package kind.
pub struct PackageOperator {
    brew: BrewService,
    flatpak: FlatpakService,
}

impl PackageOperator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            brew: BrewService::new(Arc::clone(&transport)),
            flatpak: FlatpakService::new(transport),
        }
    }

    pub fn brew(&self) -> &BrewService {
        &self.brew
    }

    pub fn flatpak(&self) -> &FlatpakService {
        &self.flatpak
    }

    /// Apply one mutation to one package.
    pub async fn apply(&self, op: Operation, pkg: &Package, ui: &UiSink) -> Result<()> {
        match pkg.kind {
            PackageKind::Flatpak => match op {
                Operation::Install => self.flatpak.install(pkg, ui).await,
                Operation::Update => self.flatpak.update(pkg, ui).await,
                Operation::Remove => self.flatpak.remove(pkg, ui).await,
            },
            _ => self.brew.run_mutation(op, pkg, ui).await,
        }
    }

    /// Apply one mutation to a batch of packages.
    ///
    /// Skipped items (per `skip`) and failed items never abort the batch;
    /// each outcome is surfaced individually and a final summary always
    /// reports the processed count.
    pub async fn apply_batch(
        &self,
        op: Operation,
        packages: &[Package],
        skip: Option<(&str, fn(&Package) -> bool)>,
        ui: &UiSink,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let total = packages.len();

        for (index, pkg) in packages.iter().enumerate() {
            let position = index + 1;

            if let Some((reason, condition)) = skip {
                if condition(pkg) {
                    report.skipped += 1;
                    ui.status(
                        StatusLevel::Warning,
                        format!("[{position}/{total}] Skipping {} ({reason})", pkg.name),
                    );
                    ui.log_line(format!("[SKIP] {} ({reason})", pkg.name));
                    continue;
                }
            }

            report.attempted += 1;
            ui.status(
                StatusLevel::Warning,
                format!("[{position}/{total}] {} {}...", op.tag(), pkg.name),
            );
            ui.log_line(format!("[{}] {} {}...", op.tag(), op.verb(), pkg.name));

            match self.apply(op, pkg, ui).await {
                Ok(()) => {
                    ui.log_line(format!("[SUCCESS] {} processed successfully", pkg.name));
                    report.succeeded.push(pkg.name.clone());
                }
                Err(e) => {
                    ui.status(
                        StatusLevel::Error,
                        format!("Failed to {} {}", op.verb(), pkg.name),
                    );
                    ui.log_line(format!(
                        "[ERROR] Failed to {} {}: {e}",
                        op.verb(),
                        pkg.name
                    ));
                    report.failed.push((pkg.name.clone(), e));
                }
            }
        }

        info!(
            "batch {} complete: {} processed, {} failed, {} skipped",
            op.verb(),
            total,
            report.failed.len(),
            report.skipped
        );
        ui.status(
            StatusLevel::Success,
            format!("Completed! Processed {total} packages"),
        );
        report
    }
}
