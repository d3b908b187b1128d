//! Centralized backup mode: `<backup_root>/files/` plus a shared manifest.

use std::path::{Path, PathBuf};

use filetime::FileTime;

use super::manifest::{self, BackupRecord};
use super::skip::should_skip;
use crate::classifier::Target;

const MAX_ID_ATTEMPTS: u32 = 8;
const WARNING_THRESHOLD_BYTES: u64 = 500 * 1024 * 1024;

/// Why a target was not backed up, even though its zone is trusted.
#[derive(Debug, Clone)]
pub struct SkippedBackup {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of backing up a batch of targets in centralized mode.
#[derive(Debug, Default)]
pub struct CentralizedReport {
    pub backed_up: Vec<BackupRecord>,
    pub skipped: Vec<SkippedBackup>,
    /// Set once if `<backup_root>/files/` exceeds 500 MB after this call.
    pub size_warning: Option<String>,
}

/// Back up every target into centralized storage and append one manifest
/// record per successfully backed-up item.
///
/// Backup failures (I/O error, permission denied, disk full) do not abort
/// the batch: per spec §4.3/§7, the deletion proceeds regardless, so a
/// failed backup here is recorded the same way a skip is — the caller
/// never escalates it to a block.
pub fn backup_targets(targets: &[Target], backup_root: &Path, workspace: &str, command: &str) -> CentralizedReport {
    let mut report = CentralizedReport::default();
    let files_dir = manifest::files_dir(backup_root);
    let manifest_file = manifest::manifest_path(backup_root);

    for target in targets {
        if should_skip(&target.path) {
            report.skipped.push(SkippedBackup {
                path: target.path.clone(),
                reason: "path matches a skip-dir rule".to_string(),
            });
            continue;
        }

        match backup_one(target, &files_dir) {
            Ok((id, backup_filename, size_bytes)) => {
                let record = BackupRecord::new(
                    id,
                    backup_filename,
                    target.path.to_string_lossy().into_owned(),
                    workspace.to_string(),
                    target.is_dir,
                    size_bytes,
                    command.to_string(),
                );
                if manifest::append_record(&manifest_file, &record).is_ok() {
                    report.backed_up.push(record);
                } else {
                    report.skipped.push(SkippedBackup {
                        path: target.path.clone(),
                        reason: "backup copy succeeded but manifest append failed".to_string(),
                    });
                }
            }
            Err(reason) => report.skipped.push(SkippedBackup {
                path: target.path.clone(),
                reason,
            }),
        }
    }

    if let Ok(total) = dir_size(&files_dir) {
        if total > WARNING_THRESHOLD_BYTES {
            report.size_warning = Some(format!(
                "backup storage at {} has grown to {} bytes (over 500 MB)",
                files_dir.display(),
                total
            ));
        }
    }

    report
}

/// Returns `(id, backup_filename, size_bytes)` on success.
fn backup_one(target: &Target, files_dir: &Path) -> Result<(String, String, u64), String> {
    std::fs::create_dir_all(files_dir).map_err(|e| format!("could not create {}: {e}", files_dir.display()))?;

    let stem = target.path.file_stem().map_or_else(|| "item".to_string(), |s| s.to_string_lossy().into_owned());
    let ext = target.path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();

    for _ in 0..MAX_ID_ATTEMPTS {
        let id = manifest::generate_id();
        let backup_filename = if target.is_dir {
            format!("{stem}_{id}")
        } else {
            format!("{stem}_{id}{ext}")
        };
        let dest = files_dir.join(&backup_filename);
        if dest.exists() {
            continue;
        }

        let tmp = files_dir.join(format!(".tmp-{id}"));
        let result = if target.is_dir {
            copy_dir_recursive(&target.path, &tmp)
        } else {
            copy_file_preserving_metadata(&target.path, &tmp)
        };

        match result {
            Ok(size) => {
                std::fs::rename(&tmp, &dest).map_err(|e| format!("rename to {}: {e}", dest.display()))?;
                let display_name = if target.is_dir {
                    format!("{backup_filename}/")
                } else {
                    backup_filename.clone()
                };
                return Ok((id, display_name, size));
            }
            Err(e) => {
                let _ = std::fs::remove_file(&tmp);
                let _ = std::fs::remove_dir_all(&tmp);
                return Err(e);
            }
        }
    }

    Err(format!("exhausted {MAX_ID_ATTEMPTS} id collision retries"))
}

fn copy_file_preserving_metadata(src: &Path, dest: &Path) -> Result<u64, String> {
    let size = std::fs::copy(src, dest).map_err(|e| format!("copy {}: {e}", src.display()))?;
    if let Ok(metadata) = std::fs::metadata(src) {
        let mtime = FileTime::from_last_modification_time(&metadata);
        let _ = filetime::set_file_mtime(dest, mtime);
        let _ = std::fs::set_permissions(dest, metadata.permissions());
    }
    Ok(size)
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<u64, String> {
    std::fs::create_dir_all(dest).map_err(|e| format!("mkdir {}: {e}", dest.display()))?;
    let mut total = 0u64;
    let entries = std::fs::read_dir(src).map_err(|e| format!("read_dir {}: {e}", src.display()))?;
    for entry in entries {
        let entry = entry.map_err(|e| format!("read_dir entry: {e}"))?;
        let path = entry.path();
        if should_skip(&path) {
            continue;
        }
        let child_dest = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| format!("file_type: {e}"))?;
        if file_type.is_dir() {
            total += copy_dir_recursive(&path, &child_dest)?;
        } else {
            total += copy_file_preserving_metadata(&path, &child_dest)?;
        }
    }
    Ok(total)
}

fn dir_size(dir: &Path) -> std::io::Result<u64> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut total = 0u64;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            total += dir_size(&path)?;
        } else {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}
