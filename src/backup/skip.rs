//! Shared skip-directory-name set used by both backup modes.

use std::path::Path;

const SKIP_NAMES: &[&str] = &[
    ".git",
    "node_modules",
    "venv",
    ".venv",
    "dist",
    "build",
    "__pycache__",
    ".next",
    ".nuxt",
    "out",
    "target",
    ".cache",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    "coverage",
    ".idea",
    ".vscode",
];

/// Whether any path segment of `path` matches a skip-rule name.
#[must_use]
pub fn should_skip(path: &Path) -> bool {
    path.components()
        .any(|c| SKIP_NAMES.contains(&c.as_os_str().to_string_lossy().as_ref()))
}
