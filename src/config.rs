//! Configuration file model and loading.
//!
//! Mirrors the teacher's `Config::load` discipline (explicit-path-or-default
//! resolution, tolerate-missing, tolerate-malformed, never cache across
//! invocations) but the file format is JSON per the host contract, and the
//! schema is the three fields spec.md actually defines.

use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths::resolve_absolute_path_cwd;

/// How the backup engine lays out backed-up data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupMode {
    /// `<backup_root>/files/` plus a shared `manifest.jsonl`.
    Centralized,
    /// `<zone_root>/.claude-backups/<ts>_<pid>/`, one per invocation.
    PerFolder,
}

impl Default for BackupMode {
    fn default() -> Self {
        Self::Centralized
    }
}

/// User-editable policy configuration.
///
/// Unknown top-level keys are ignored (`serde_json` already does this:
/// fields not named here are simply skipped during deserialization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backup storage layout.
    pub backup_mode: BackupMode,
    /// Destination root for centralized-mode backups. `None` resolves to
    /// `<home>/.claude/claude-code-protect-backups` at use time.
    pub backup_root: Option<PathBuf>,
    /// Absolute directory paths treated identically to the workspace.
    pub whitelisted_folders: BTreeSet<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_mode: BackupMode::default(),
            backup_root: None,
            whitelisted_folders: BTreeSet::new(),
        }
    }
}

impl Config {
    /// Default configuration file path: `<home>/.claude/claude-code-protect.json`.
    #[must_use]
    pub fn default_path(home: &Path) -> PathBuf {
        home.join(".claude").join("claude-code-protect.json")
    }

    /// Load configuration from the given home directory's default config
    /// path.
    ///
    /// A missing file is equivalent to all defaults. A malformed file
    /// (invalid UTF-8 JSON, or JSON that doesn't match this schema enough
    /// to deserialize) is *also* treated as all defaults — spec §6
    /// explicitly calls for "parse errors ⇒ treat as empty config and
    /// proceed", never a hard failure. The caller may inspect the
    /// returned `bool` to decide whether to emit a stderr note.
    ///
    /// Returns `(config, was_malformed)`.
    #[must_use]
    pub fn load(home: &Path) -> (Self, bool) {
        let path = Self::default_path(home);
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path, with the same
    /// missing-is-default, malformed-is-default tolerance as [`Config::load`].
    #[must_use]
    pub fn load_from(path: &Path) -> (Self, bool) {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return (Self::default(), false);
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(mut cfg) => {
                cfg.normalize_paths();
                (cfg, false)
            }
            Err(_) => (Self::default(), true),
        }
    }

    /// Canonicalize `backup_root` and every `whitelisted_folders` entry so
    /// later zone-membership checks are pure string-prefix comparisons
    /// over already-resolved paths.
    fn normalize_paths(&mut self) {
        if let Some(root) = self.backup_root.take() {
            self.backup_root = Some(resolve_absolute_path_cwd(&root));
        }
        self.whitelisted_folders = self
            .whitelisted_folders
            .iter()
            .map(|p| resolve_absolute_path_cwd(p))
            .collect();
    }

    /// The effective backup root: the configured value, or
    /// `<home>/.claude/claude-code-protect-backups`.
    #[must_use]
    pub fn effective_backup_root(&self, home: &Path) -> PathBuf {
        self.backup_root
            .clone()
            .unwrap_or_else(|| home.join(".claude").join("claude-code-protect-backups"))
    }
}

/// Resolve the workspace root: `CLAUDE_PROJECT_DIR` if set, else `cwd`.
#[must_use]
pub fn workspace_root(cwd: &Path) -> PathBuf {
    env::var_os("CLAUDE_PROJECT_DIR").map_or_else(|| cwd.to_path_buf(), PathBuf::from)
}

/// Resolve the user's home directory from `HOME`. Falls back to `/` if
/// unset — the pipeline still functions (config defaults, backups go
/// under `/.claude/...`), it just won't find a user's real config file.
#[must_use]
pub fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(|| PathBuf::from("/"), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_centralized_with_no_whitelist() {
        let cfg = Config::default();
        assert_eq!(cfg.backup_mode, BackupMode::Centralized);
        assert!(cfg.backup_root.is_none());
        assert!(cfg.whitelisted_folders.is_empty());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (cfg, malformed) = Config::load_from(Path::new("/nonexistent-rmguard/config.json"));
        assert_eq!(cfg, Config::default());
        assert!(!malformed);
    }

    #[test]
    fn malformed_file_yields_defaults_and_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let (cfg, malformed) = Config::load_from(&path);
        assert_eq!(cfg, Config::default());
        assert!(malformed);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, br#"{"backup_mode":"per-folder","future_field":true}"#).unwrap();
        let (cfg, malformed) = Config::load_from(&path);
        assert!(!malformed);
        assert_eq!(cfg.backup_mode, BackupMode::PerFolder);
    }

    #[test]
    fn effective_backup_root_defaults_under_home() {
        let cfg = Config::default();
        let home = Path::new("/home/alice");
        assert_eq!(
            cfg.effective_backup_root(home),
            PathBuf::from("/home/alice/.claude/claude-code-protect-backups")
        );
    }

    #[test]
    fn workspace_root_prefers_env_var() {
        unsafe {
            env::set_var("CLAUDE_PROJECT_DIR", "/ws");
        }
        assert_eq!(workspace_root(Path::new("/elsewhere")), PathBuf::from("/ws"));
        unsafe {
            env::remove_var("CLAUDE_PROJECT_DIR");
        }
        assert_eq!(workspace_root(Path::new("/elsewhere")), PathBuf::from("/elsewhere"));
    }
}
