//! Path resolution shared by the classifier and zone classifier.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve a path to an absolute, normalized path.
///
/// If `fs::canonicalize` succeeds (path exists), it is used to resolve
/// symlinks and normalize components — this is what makes zone
/// classification symlink-safe.
///
/// If it fails (path does not exist, e.g. a `find -delete` target already
/// vanished between the dry-run and the decision), the path is made
/// absolute relative to `cwd` and `..`/`.` components are resolved
/// syntactically.
#[must_use]
pub fn resolve_absolute_path(path: &Path, cwd: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

/// Resolve a path against the process's actual current directory, rather
/// than an explicit `cwd` argument. Used outside the per-invocation
/// pipeline (config loading, backup-root resolution).
#[must_use]
pub fn resolve_absolute_path_cwd(path: &Path) -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    resolve_absolute_path(path, &cwd)
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

/// Expand a leading `~` (bare, or `~/...`) to the home directory. Any
/// other use of `~` (e.g. `~user`) is left untouched — spec only calls
/// for the bare-home form.
#[must_use]
pub fn expand_tilde(token: &str, home: &Path) -> PathBuf {
    if token == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = token.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(token)
}
