//! Zone classifier: labels a resolved target path as workspace, whitelist,
//! tmp, or outside.
//!
//! Classification is purely lexical over already-canonicalized paths: `P`
//! is "in" zone `Z` when `P == Z` or `P` starts with `Z` followed by a path
//! separator. Evaluation order is fixed (workspace, whitelist, tmp,
//! outside) and is itself part of the contract — see spec §4.2.

use std::path::{Path, PathBuf};

use crate::config::Config;

/// The trust classification of a resolved filesystem path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneLabel {
    /// Inside the workspace root (`CLAUDE_PROJECT_DIR`, or cwd fallback).
    Workspace,
    /// Inside one of the configured whitelisted folders.
    Whitelist,
    /// Inside a recognized temp directory.
    Tmp,
    /// Not covered by any trusted zone.
    Outside,
}

const TMP_ROOTS: &[&str] = &["/tmp", "/var/tmp", "/private/tmp"];

/// Classify a canonicalized path against the workspace root and config.
#[must_use]
pub fn classify(path: &Path, workspace_root: &Path, config: &Config) -> ZoneLabel {
    classify_with_root(path, workspace_root, config).0
}

/// As [`classify`], but also returns the specific zone root the path was
/// matched against — the workspace root for `Workspace`, the matching
/// whitelisted folder for `Whitelist`. The backup engine's per-folder mode
/// needs this root to mirror a target's path relative to it.
#[must_use]
pub fn classify_with_root(path: &Path, workspace_root: &Path, config: &Config) -> (ZoneLabel, Option<PathBuf>) {
    if is_within(path, workspace_root) {
        return (ZoneLabel::Workspace, Some(workspace_root.to_path_buf()));
    }
    if let Some(root) = config.whitelisted_folders.iter().find(|w| is_within(path, w)) {
        return (ZoneLabel::Whitelist, Some(root.clone()));
    }
    let platform_tmp = std::env::temp_dir();
    if TMP_ROOTS.iter().any(|t| is_within(path, Path::new(t))) || is_within(path, &platform_tmp) {
        return (ZoneLabel::Tmp, None);
    }
    (ZoneLabel::Outside, None)
}

/// Whether `root` contains `path` would-be-equal-or-descendant, per the
/// lexical prefix rule: `path == root` or `path` starts with `root + /`.
#[must_use]
fn is_within(path: &Path, root: &Path) -> bool {
    if path == root {
        return true;
    }
    path.strip_prefix(root).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendant_of_workspace_is_workspace() {
        let cfg = Config::default();
        let result = classify(Path::new("/w/sub/a.txt"), Path::new("/w"), &cfg);
        assert_eq!(result, ZoneLabel::Workspace);
    }

    #[test]
    fn workspace_root_itself_is_workspace() {
        let cfg = Config::default();
        let result = classify(Path::new("/w"), Path::new("/w"), &cfg);
        assert_eq!(result, ZoneLabel::Workspace);
    }

    #[test]
    fn whitelisted_folder_descendant_is_whitelist() {
        let mut cfg = Config::default();
        cfg.whitelisted_folders.insert("/ws".into());
        let result = classify(Path::new("/ws/big.bin"), Path::new("/w"), &cfg);
        assert_eq!(result, ZoneLabel::Whitelist);
    }

    #[test]
    fn tmp_root_itself_is_tmp() {
        let cfg = Config::default();
        let result = classify(Path::new("/tmp"), Path::new("/w"), &cfg);
        assert_eq!(result, ZoneLabel::Tmp);
    }

    #[test]
    fn tmp_descendant_is_tmp() {
        let cfg = Config::default();
        let result = classify(Path::new("/var/tmp/stuff"), Path::new("/w"), &cfg);
        assert_eq!(result, ZoneLabel::Tmp);
    }

    #[test]
    fn unrelated_path_is_outside() {
        let cfg = Config::default();
        let result = classify(Path::new("/data/report.csv"), Path::new("/w"), &cfg);
        assert_eq!(result, ZoneLabel::Outside);
    }

    #[test]
    fn workspace_wins_over_whitelist_when_both_match() {
        let mut cfg = Config::default();
        cfg.whitelisted_folders.insert("/w".into());
        let result = classify(Path::new("/w/a.txt"), Path::new("/w"), &cfg);
        assert_eq!(result, ZoneLabel::Workspace);
    }

    #[test]
    fn similar_prefix_without_separator_is_not_a_match() {
        // /workspace-other must not be treated as inside /workspace.
        let cfg = Config::default();
        let result = classify(Path::new("/workspace-other/a.txt"), Path::new("/workspace"), &cfg);
        assert_eq!(result, ZoneLabel::Outside);
    }

    // spec §8 invariant 8: symlink safety. These resolve through
    // `crate::paths::resolve_absolute_path` first, exactly as the pipeline
    // does, so the canonicalization that makes the zone check symlink-safe
    // is actually exercised rather than assumed.
    #[test]
    #[cfg(unix)]
    fn symlink_in_trusted_zone_pointing_outside_resolves_to_outside() {
        let workspace = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let workspace_root = std::fs::canonicalize(workspace.path()).unwrap();

        let real_file = outside.path().join("secret.txt");
        std::fs::write(&real_file, b"x").unwrap();
        let link = workspace.path().join("link.txt");
        std::os::unix::fs::symlink(&real_file, &link).unwrap();

        let resolved = crate::paths::resolve_absolute_path(&link, &workspace_root);
        let cfg = Config::default();
        assert_eq!(classify(&resolved, &workspace_root, &cfg), ZoneLabel::Outside);
    }

    #[test]
    #[cfg(unix)]
    fn symlink_under_untrusted_path_resolving_into_trusted_zone_is_trusted() {
        let workspace = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let workspace_root = std::fs::canonicalize(workspace.path()).unwrap();

        let real_file = workspace_root.join("real.txt");
        std::fs::write(&real_file, b"x").unwrap();
        let link = outside.path().join("link.txt");
        std::os::unix::fs::symlink(&real_file, &link).unwrap();

        let resolved = crate::paths::resolve_absolute_path(&link, outside.path());
        let cfg = Config::default();
        assert_eq!(classify(&resolved, &workspace_root, &cfg), ZoneLabel::Workspace);
    }
}
