//! Per-folder backup mode: one `<zone_root>/.claude-backups/<ts>_<pid>/`
//! subdirectory per invocation, mirroring each target's path relative to
//! its zone root.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::centralized::SkippedBackup;
use super::skip::should_skip;
use crate::classifier::Target;

const PER_FOLDER_CAP_BYTES: u64 = 10 * 1024 * 1024;
const GITIGNORE_ENTRY: &str = ".claude-backups/";

/// Outcome of a per-folder-mode backup batch.
#[derive(Debug, Default)]
pub struct PerFolderReport {
    pub backed_up: Vec<PathBuf>,
    pub skipped: Vec<SkippedBackup>,
    /// Set when the invocation's combined target size exceeded the 10 MB
    /// cap and backup was skipped for every target.
    pub cap_exceeded: bool,
}

/// Build the shared `<ts>_<pid>` directory name for one invocation. All
/// targets backed up during the same invocation, regardless of which zone
/// root they land under, share this name.
#[must_use]
pub fn invocation_dir_name(pid: u32) -> String {
    format!("{}_{pid}", Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

/// Back up `targets`, each paired with the zone root it was resolved
/// under (the workspace root, or the specific whitelisted folder it
/// descends from).
pub fn backup_targets(targets: &[(Target, PathBuf)], dir_name: &str) -> PerFolderReport {
    let mut report = PerFolderReport::default();

    let mut eligible: Vec<&(Target, PathBuf)> = Vec::new();
    let mut total_size = 0u64;
    for pair in targets {
        let (target, _) = pair;
        if should_skip(&target.path) {
            report.skipped.push(SkippedBackup {
                path: target.path.clone(),
                reason: "path matches a skip-dir rule".to_string(),
            });
            continue;
        }
        total_size += target_size(&target.path);
        eligible.push(pair);
    }

    if total_size > PER_FOLDER_CAP_BYTES {
        report.cap_exceeded = true;
        for (target, _) in eligible {
            report.skipped.push(SkippedBackup {
                path: target.path.clone(),
                reason: format!("skipped: combined size exceeds 10MB cap ({total_size} bytes)"),
            });
        }
        return report;
    }

    for (target, zone_root) in eligible {
        match backup_one(target, zone_root, dir_name) {
            Ok(dest) => {
                let _ = ensure_gitignore_entry(zone_root);
                report.backed_up.push(dest);
            }
            Err(reason) => report.skipped.push(SkippedBackup {
                path: target.path.clone(),
                reason,
            }),
        }
    }

    report
}

fn backup_one(target: &Target, zone_root: &Path, dir_name: &str) -> Result<PathBuf, String> {
    let relative = target
        .path
        .strip_prefix(zone_root)
        .map_err(|_| "target is not a descendant of its reported zone root".to_string())?;
    let dest = zone_root.join(".claude-backups").join(dir_name).join(relative);

    if target.is_dir {
        copy_dir_recursive(&target.path, &dest)?;
    } else {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("mkdir {}: {e}", parent.display()))?;
        }
        std::fs::copy(&target.path, &dest).map_err(|e| format!("copy {}: {e}", target.path.display()))?;
    }
    Ok(dest)
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dest).map_err(|e| format!("mkdir {}: {e}", dest.display()))?;
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
            copy_dir_recursive(&path, &child_dest)?;
        } else {
            std::fs::copy(&path, &child_dest).map_err(|e| format!("copy {}: {e}", path.display()))?;
        }
    }
    Ok(())
}

fn target_size(path: &Path) -> u64 {
    let Ok(metadata) = std::fs::symlink_metadata(path) else {
        return 0;
    };
    if !metadata.is_dir() {
        return metadata.len();
    }
    let mut total = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let p = entry.path();
            if should_skip(&p) {
                continue;
            }
            total += target_size(&p);
        }
    }
    total
}

/// Ensure `<zone_root>/.claude-backups/` appears as a line in
/// `<zone_root>/.gitignore`, creating the file if missing. Guarded by an
/// advisory lock on the gitignore file itself; a locking failure is
/// tolerated silently (cosmetic only, per spec §5).
fn ensure_gitignore_entry(zone_root: &Path) -> Result<(), String> {
    let path = zone_root.join(".gitignore");
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|e| e.to_string())?;
    write_gitignore_locked(file, &path)
}

#[cfg(unix)]
fn write_gitignore_locked(file: std::fs::File, path: &Path) -> Result<(), String> {
    use std::io::{Read, Seek, SeekFrom, Write};
    let mut locked = nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive)
        .map_err(|(_, errno)| format!("flock {}: {errno}", path.display()))?;
    let mut contents = String::new();
    locked.read_to_string(&mut contents).map_err(|e| e.to_string())?;
    if contents.lines().any(|l| l.trim() == GITIGNORE_ENTRY.trim_end_matches('/') || l.trim() == GITIGNORE_ENTRY) {
        return Ok(());
    }
    locked.seek(SeekFrom::End(0)).map_err(|e| e.to_string())?;
    let mut to_write = String::new();
    if !contents.is_empty() && !contents.ends_with('\n') {
        to_write.push('\n');
    }
    to_write.push_str(GITIGNORE_ENTRY);
    to_write.push('\n');
    locked.write_all(to_write.as_bytes()).map_err(|e| e.to_string())
}

#[cfg(not(unix))]
fn write_gitignore_locked(mut file: std::fs::File, _path: &Path) -> Result<(), String> {
    use std::io::{Read, Seek, SeekFrom, Write};
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| e.to_string())?;
    if contents.lines().any(|l| l.trim() == GITIGNORE_ENTRY) {
        return Ok(());
    }
    file.seek(SeekFrom::End(0)).map_err(|e| e.to_string())?;
    let mut to_write = String::new();
    if !contents.is_empty() && !contents.ends_with('\n') {
        to_write.push('\n');
    }
    to_write.push_str(GITIGNORE_ENTRY);
    to_write.push('\n');
    file.write_all(to_write.as_bytes()).map_err(|e| e.to_string())
}
