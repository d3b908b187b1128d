//! Backup engine: copies workspace/whitelist deletion targets aside
//! before the host is allowed to proceed (spec §4.3).

pub mod centralized;
pub mod manifest;
pub mod per_folder;
pub mod skip;

use std::path::{Path, PathBuf};

pub use centralized::{CentralizedReport, SkippedBackup};
pub use manifest::BackupRecord;
pub use per_folder::PerFolderReport;

use crate::classifier::Target;
use crate::config::{BackupMode, Config};

/// The result of running the backup engine for one invocation.
#[derive(Debug)]
pub enum BackupOutcome {
    Centralized(CentralizedReport),
    PerFolder(PerFolderReport),
}

impl BackupOutcome {
    /// Stdout diagnostic lines to surface for this outcome: skip/failure
    /// reasons and the centralized-mode size warning, if any.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            Self::Centralized(report) => {
                let mut lines: Vec<String> = report
                    .skipped
                    .iter()
                    .map(|s| format!("backup skipped for {}: {}", s.path.display(), s.reason))
                    .collect();
                if let Some(warning) = &report.size_warning {
                    lines.push(warning.clone());
                }
                lines
            }
            Self::PerFolder(report) => report
                .skipped
                .iter()
                .map(|s| format!("backup skipped for {}: {}", s.path.display(), s.reason))
                .collect(),
        }
    }
}

/// Run the configured backup mode over `targets`, each paired with the
/// zone root it was resolved under (the workspace root for workspace
/// targets, the specific whitelisted folder for whitelist targets).
///
/// `tmp`-zoned targets are never passed here — the decision gate only
/// invokes the backup engine for workspace/whitelist targets (spec §4.4).
#[must_use]
pub fn run(
    config: &Config,
    targets: &[(Target, PathBuf)],
    workspace: &Path,
    command: &str,
    pid: u32,
    home: &Path,
) -> BackupOutcome {
    match config.backup_mode {
        BackupMode::Centralized => {
            let backup_root = config.effective_backup_root(home);
            let flat: Vec<Target> = targets.iter().map(|(t, _)| t.clone()).collect();
            let workspace_str = workspace.to_string_lossy();
            BackupOutcome::Centralized(centralized::backup_targets(&flat, &backup_root, &workspace_str, command))
        }
        BackupMode::PerFolder => {
            let dir_name = per_folder::invocation_dir_name(pid);
            BackupOutcome::PerFolder(per_folder::backup_targets(targets, &dir_name))
        }
    }
}
