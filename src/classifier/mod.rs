//! Command classifier: decides whether a shell command is a deletion and,
//! if so, what it would delete.
//!
//! Implemented as the disciplined three-tier state machine spec.md calls
//! for, rather than scattered booleans: Tier 3 (obfuscation markers) runs
//! first and wins outright; Tier 2 (dry-run templates) and Tier 1 (direct
//! verb table) run per top-level segment, and segment results merge under
//! the conservative rule in [`merge`].

mod split;
mod tiers;

use std::path::{Path, PathBuf};

pub use split::split_segments;

use crate::errors::RgError;

/// Build an `Unresolvable` classification whose reason is the `Display`
/// text of [`RgError::Unresolvable`] (spec §7's error-kind table), so the
/// code that decides "this segment is ambiguous" and the code that
/// formats the diagnostic for it stay in one place.
pub(super) fn unresolvable(reason: impl Into<String>) -> Classification {
    Classification::Unresolvable {
        reason: RgError::Unresolvable { reason: reason.into() }.to_string(),
    }
}

/// As [`unresolvable`], but for the `DryRunFailure` error kind — a dry-run
/// re-execution (Tier 2) that failed, timed out, or produced output the
/// classifier couldn't use.
pub(super) fn dry_run_unresolvable(reason: impl Into<String>) -> Classification {
    Classification::Unresolvable {
        reason: RgError::DryRunFailure { reason: reason.into() }.to_string(),
    }
}

/// Where a [`Target`] was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    /// Resolved directly from the command's own argument list.
    Direct,
    /// Resolved by re-executing a dry-run form of the command.
    DryRun,
}

/// A resolved deletion target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Canonicalized absolute path.
    pub path: PathBuf,
    /// Whether the path refers to a directory.
    pub is_dir: bool,
    /// Which tier discovered this target.
    pub source_tier: SourceTier,
}

/// The overall tier composition of a [`Classification::Deletion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Every target came from Tier 1 (direct verb parsing).
    Direct,
    /// Every target came from Tier 2 (dry-run expansion).
    DryRun,
    /// At least one segment resolved via each tier.
    Mixed,
}

/// The classifier's verdict for one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The command has no deletion intent.
    NotDeletion,
    /// The command deletes the given targets.
    Deletion {
        /// The union of resolved targets across all segments.
        targets: Vec<Target>,
        /// The tier composition of `targets`.
        tier: Tier,
    },
    /// The command's deletion targets cannot be safely enumerated.
    Unresolvable {
        /// Human-readable reason, surfaced in the decision-gate prompt.
        reason: String,
    },
}

/// Classify a full command line.
///
/// `cwd` and `home` are used to resolve relative paths and `~` for each
/// segment's targets.
#[must_use]
pub fn classify(command: &str, cwd: &Path, home: &Path) -> Classification {
    let segments = split_segments(command);
    if segments.is_empty() {
        return Classification::NotDeletion;
    }

    let mut all_targets: Vec<Target> = Vec::new();
    let mut saw_any_deletion = false;
    let mut unresolvable_reason: Option<String> = None;

    for segment in &segments {
        match tiers::classify_segment(segment, cwd, home) {
            Classification::NotDeletion => {}
            Classification::Unresolvable { reason } => {
                // Tie-break: any Unresolvable segment forces the whole
                // command Unresolvable. Keep the first reason found; it's
                // the one most likely to explain the block to a human.
                unresolvable_reason.get_or_insert(reason);
            }
            Classification::Deletion { targets, .. } => {
                saw_any_deletion = true;
                for t in targets {
                    if !all_targets.contains(&t) {
                        all_targets.push(t);
                    }
                }
            }
        }
    }

    if let Some(reason) = unresolvable_reason {
        return Classification::Unresolvable { reason };
    }

    if !saw_any_deletion {
        return Classification::NotDeletion;
    }

    let tier = merge_tier(&all_targets);
    Classification::Deletion {
        targets: all_targets,
        tier,
    }
}

fn merge_tier(targets: &[Target]) -> Tier {
    let has_direct = targets.iter().any(|t| t.source_tier == SourceTier::Direct);
    let has_dryrun = targets.iter().any(|t| t.source_tier == SourceTier::DryRun);
    match (has_direct, has_dryrun) {
        (true, true) => Tier::Mixed,
        (false, true) => Tier::DryRun,
        _ => Tier::Direct,
    }
}
