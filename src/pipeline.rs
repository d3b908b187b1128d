//! The single pipeline entry point: stdin envelope in, `(exit_code,
//! diagnostics)` out. Nothing in this module calls `std::process::exit` —
//! that is `main.rs`'s job, after applying the fail-open wrapper (spec §9
//! "process lifecycle as control flow").

use crate::backup;
use crate::classifier::{self, Classification};
use crate::config::{self, Config};
use crate::envelope::Envelope;
use crate::errors::RgError;
use crate::gate::{self, GateDecision, LabeledTarget};
use crate::zone;

/// The pipeline's verdict: an exit code plus the diagnostic lines to
/// print on stdout/stderr. Exit code is always `0` or `2` (spec §6, §7).
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub exit_code: u8,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
}

impl PipelineOutcome {
    fn allow(stdout_lines: Vec<String>, stderr_lines: Vec<String>) -> Self {
        Self {
            exit_code: 0,
            stdout_lines,
            stderr_lines,
        }
    }

    /// Build a blocked outcome from the `RgError` that caused it, using
    /// its own `exit_code()` rather than hardcoding `2` here — the one
    /// place that maps an error kind to a process exit code is
    /// `RgError::exit_code`, not this function.
    fn block(err: &RgError, mut stderr_lines: Vec<String>) -> Self {
        stderr_lines.push(err.to_string());
        Self {
            exit_code: err.exit_code(),
            stdout_lines: Vec::new(),
            stderr_lines,
        }
    }
}

/// Run the full pipeline for one invocation's raw stdin bytes.
#[must_use]
pub fn run(stdin: &str) -> PipelineOutcome {
    let envelope = match Envelope::parse(stdin) {
        Ok(envelope) => envelope,
        Err(e) => return PipelineOutcome::allow(Vec::new(), vec![e.to_string()]),
    };

    if !envelope.is_bash() {
        return PipelineOutcome::allow(Vec::new(), Vec::new());
    }

    let home = config::home_dir();
    let (cfg, config_malformed) = Config::load(&home);
    let mut stderr_lines = Vec::new();
    if config_malformed {
        stderr_lines.push(
            RgError::ConfigMalformed {
                details: format!("{} is not valid JSON; proceeding with defaults", Config::default_path(&home).display()),
            }
            .to_string(),
        );
    }

    let workspace = config::workspace_root(&envelope.cwd);
    let classification = classifier::classify(&envelope.command, &envelope.cwd, &home);
    let labeled = label_targets(&classification, &workspace, &cfg);

    match gate::decide(&classification, &labeled) {
        GateDecision::Allow { to_backup } => {
            let mut stdout_lines = Vec::new();
            if !to_backup.is_empty() {
                let targets: Vec<(crate::classifier::Target, std::path::PathBuf)> = to_backup
                    .into_iter()
                    .filter_map(|(target, _, root)| root.map(|r| (target, r)))
                    .collect();
                let pid = std::process::id();
                let outcome = backup::run(&cfg, &targets, &workspace, &envelope.command, pid, &home);
                stdout_lines.extend(outcome.diagnostics());
            }
            PipelineOutcome::allow(stdout_lines, stderr_lines)
        }
        GateDecision::Prompt {
            outside_targets,
            unresolvable_reason,
        } => {
            let explanation = gate::build_explanation(&envelope.command, &outside_targets, unresolvable_reason.as_deref());
            match gate::prompt(&explanation) {
                Ok(()) => PipelineOutcome::allow(Vec::new(), stderr_lines),
                Err(err) => {
                    stderr_lines.push(explanation);
                    PipelineOutcome::block(&err, stderr_lines)
                }
            }
        }
    }
}

fn label_targets(classification: &Classification, workspace: &std::path::Path, cfg: &Config) -> Vec<LabeledTarget> {
    match classification {
        Classification::Deletion { targets, .. } => targets
            .iter()
            .map(|t| {
                let (label, root) = zone::classify_with_root(&t.path, workspace, cfg);
                (t.clone(), label, root)
            })
            .collect(),
        Classification::NotDeletion | Classification::Unresolvable { .. } => Vec::new(),
    }
}
