//! The centralized-mode manifest: an append-only JSON-lines log of backed
//! up items, guarded by an advisory exclusive lock held only around each
//! single-line append (spec §4.3, §5, §9 "Concurrent manifest").

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, RgError};

/// One manifest entry, one per backed-up item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// 6-hex backup id.
    pub id: String,
    /// Name of the file/directory under `<backup_root>/files/`.
    pub backup_filename: String,
    /// The original absolute path that was backed up.
    pub original_path: String,
    /// ISO-8601 timestamp with local UTC offset.
    pub backed_up_at: String,
    /// The workspace root active at backup time.
    pub workspace: String,
    /// Whether the backed-up item is a directory.
    pub is_dir: bool,
    /// Size in bytes (recursive total for directories).
    pub size_bytes: u64,
    /// The originating shell command, for audit/diagnostics.
    pub command: String,
}

impl BackupRecord {
    /// Build a record stamped with the current local time.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        backup_filename: String,
        original_path: String,
        workspace: String,
        is_dir: bool,
        size_bytes: u64,
        command: String,
    ) -> Self {
        Self {
            id,
            backup_filename,
            original_path,
            backed_up_at: Local::now().to_rfc3339(),
            workspace,
            is_dir,
            size_bytes,
            command,
        }
    }
}

/// Append one record as a single, newline-terminated JSON line.
///
/// The advisory lock is acquired only for the duration of this call; the
/// caller never holds it across invocations or between multiple appends.
pub fn append_record(manifest_path: &Path, record: &BackupRecord) -> Result<()> {
    if let Some(parent) = manifest_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RgError::io(parent, e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(manifest_path)
        .map_err(|e| RgError::io(manifest_path, e))?;

    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    write_locked(file, manifest_path, line.as_bytes())
}

#[cfg(unix)]
fn write_locked(file: std::fs::File, manifest_path: &Path, line: &[u8]) -> Result<()> {
    let mut locked = nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive).map_err(|(_, errno)| {
        RgError::BackupFailure {
            path: manifest_path.to_path_buf(),
            details: format!("flock failed: {errno}"),
        }
    })?;
    locked.write_all(line).map_err(|e| RgError::io(manifest_path, e))
}

#[cfg(not(unix))]
fn write_locked(mut file: std::fs::File, manifest_path: &Path, line: &[u8]) -> Result<()> {
    file.write_all(line).map_err(|e| RgError::io(manifest_path, e))
}

/// Read every well-formed record from the manifest, silently skipping
/// malformed lines (spec §5, §9: "a recovery-tolerant reader that skips
/// malformed lines").
#[must_use]
pub fn read_records(manifest_path: &Path) -> Vec<BackupRecord> {
    let Ok(file) = std::fs::File::open(manifest_path) else {
        return Vec::new();
    };
    BufReader::new(file)
        .lines()
        .map_while(std::result::Result::ok)
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect()
}

/// Generate a 6-hex-character backup id.
#[must_use]
pub fn generate_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    format!("{:06x}", rng.random_range(0..0x0100_0000))
}

/// `<backup_root>/files/` and `<backup_root>/manifest.jsonl`.
#[must_use]
pub fn files_dir(backup_root: &Path) -> PathBuf {
    backup_root.join("files")
}

#[must_use]
pub fn manifest_path(backup_root: &Path) -> PathBuf {
    backup_root.join("manifest.jsonl")
}
