//! RG-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, RgError>;

/// Top-level error type for the deletion guard pipeline.
///
/// Every variant maps to exit code `0` or `2` via [`RgError::exit_code`];
/// there is no variant that should ever reach a process exit code other
/// than those two.
#[derive(Debug, Error)]
pub enum RgError {
    #[error("[RG-1002] configuration parse failure: {details}")]
    ConfigMalformed { details: String },

    #[error("[RG-1101] malformed stdin envelope: {details}")]
    MalformedEnvelope { details: String },

    #[error("[RG-2001] command segment is ambiguous: {reason}")]
    Unresolvable { reason: String },

    #[error("[RG-2002] dry-run re-execution failed: {reason}")]
    DryRunFailure { reason: String },

    #[error("[RG-3001] backup failed for {path}: {details}")]
    BackupFailure { path: PathBuf, details: String },

    #[error("[RG-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[RG-4001] confirmation prompt unavailable: {reason}")]
    PromptUnavailable { reason: String },

    #[error("[RG-4002] confirmation prompt timed out")]
    PromptTimeout,

    #[error("[RG-4003] confirmation denied")]
    PromptDeny,

    #[error("[RG-9000] internal error in stage {stage}: {details}")]
    Internal {
        stage: &'static str,
        details: String,
    },
}

impl RgError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ConfigMalformed { .. } => "RG-1002",
            Self::MalformedEnvelope { .. } => "RG-1101",
            Self::Unresolvable { .. } => "RG-2001",
            Self::DryRunFailure { .. } => "RG-2002",
            Self::BackupFailure { .. } => "RG-3001",
            Self::Io { .. } => "RG-3002",
            Self::PromptUnavailable { .. } => "RG-4001",
            Self::PromptTimeout => "RG-4002",
            Self::PromptDeny => "RG-4003",
            Self::Internal { .. } => "RG-9000",
        }
    }

    /// The exit code this error collapses to under the fail-open/block
    /// discipline: only prompt-related denials block (`2`); everything
    /// else, including every internal failure, allows (`0`).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::PromptUnavailable { .. } | Self::PromptTimeout | Self::PromptDeny => 2,
            _ => 0,
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for RgError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedEnvelope {
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<RgError> {
        vec![
            RgError::ConfigMalformed {
                details: String::new(),
            },
            RgError::MalformedEnvelope {
                details: String::new(),
            },
            RgError::Unresolvable {
                reason: String::new(),
            },
            RgError::DryRunFailure {
                reason: String::new(),
            },
            RgError::BackupFailure {
                path: PathBuf::new(),
                details: String::new(),
            },
            RgError::Io {
                path: PathBuf::new(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "test"),
            },
            RgError::PromptUnavailable {
                reason: String::new(),
            },
            RgError::PromptTimeout,
            RgError::PromptDeny,
            RgError::Internal {
                stage: "test",
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<&str> = all_variants().iter().map(RgError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "error codes must be unique: {codes:?}");
    }

    #[test]
    fn error_codes_have_rg_prefix() {
        for err in all_variants() {
            assert!(err.code().starts_with("RG-"), "code {} must start with RG-", err.code());
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = RgError::ConfigMalformed {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("RG-1002"), "display should contain error code: {msg}");
        assert!(msg.contains("bad value"), "display should contain details: {msg}");
    }

    #[test]
    fn only_prompt_failures_block() {
        assert_eq!(RgError::PromptTimeout.exit_code(), 2);
        assert_eq!(RgError::PromptDeny.exit_code(), 2);
        assert_eq!(
            RgError::PromptUnavailable {
                reason: String::new()
            }
            .exit_code(),
            2
        );

        assert_eq!(
            RgError::Internal {
                stage: "test",
                details: String::new()
            }
            .exit_code(),
            0
        );
        assert_eq!(
            RgError::BackupFailure {
                path: PathBuf::new(),
                details: String::new()
            }
            .exit_code(),
            0
        );
        assert_eq!(
            RgError::Unresolvable {
                reason: String::new()
            }
            .exit_code(),
            0,
            "Unresolvable is a classification, not itself a policy failure; the gate prompts on it"
        );
    }

    #[test]
    fn io_convenience_constructor() {
        let err = RgError::io("/tmp/test.txt", std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.code(), "RG-3002");
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: RgError = json_err.into();
        assert_eq!(err.code(), "RG-1101");
    }
}
