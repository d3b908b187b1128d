//! Decision gate: applies the zone policy table from spec §4.4 and, when
//! required, runs the `/dev/tty` confirmation prompt with a 30-second
//! deadline.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::classifier::{Classification, Target};
use crate::errors::RgError;
use crate::zone::ZoneLabel;

const PROMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// A target paired with its zone label and the specific zone root it was
/// matched against (see [`crate::zone::classify_with_root`]).
pub type LabeledTarget = (Target, ZoneLabel, Option<PathBuf>);

/// What the gate decided, before any backup engine or prompt has run.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Allow outright. `to_backup` lists the non-tmp trusted targets the
    /// backup engine should process (empty for `NotDeletion`), each still
    /// paired with its zone root.
    Allow { to_backup: Vec<LabeledTarget> },
    /// Needs an affirmative terminal response within the deadline.
    Prompt {
        outside_targets: Vec<Target>,
        unresolvable_reason: Option<String>,
    },
}

/// Apply the zone-composition decision table. `labeled` is empty for
/// `NotDeletion`/`Unresolvable`.
#[must_use]
pub fn decide(classification: &Classification, labeled: &[LabeledTarget]) -> GateDecision {
    match classification {
        Classification::NotDeletion => GateDecision::Allow { to_backup: Vec::new() },
        Classification::Unresolvable { reason } => GateDecision::Prompt {
            outside_targets: Vec::new(),
            unresolvable_reason: Some(reason.clone()),
        },
        Classification::Deletion { .. } => {
            let outside: Vec<Target> = labeled
                .iter()
                .filter(|(_, z, _)| *z == ZoneLabel::Outside)
                .map(|(t, _, _)| t.clone())
                .collect();
            if outside.is_empty() {
                let to_backup = labeled.iter().filter(|(_, z, _)| *z != ZoneLabel::Tmp).cloned().collect();
                GateDecision::Allow { to_backup }
            } else {
                GateDecision::Prompt {
                    outside_targets: outside,
                    unresolvable_reason: None,
                }
            }
        }
    }
}

/// Build the multi-line explanation the prompt protocol writes to the
/// controlling terminal before `[y/N] `.
#[must_use]
pub fn build_explanation(command: &str, outside_targets: &[Target], unresolvable_reason: Option<&str>) -> String {
    let mut text = format!("command: {command}\n");
    if let Some(reason) = unresolvable_reason {
        text.push_str(&format!("classification: unresolvable ({reason})\n"));
    } else {
        text.push_str("classification: deletion\n");
        text.push_str("targets outside all trusted zones:\n");
        for target in outside_targets {
            text.push_str(&format!("  {}\n", target.path.display()));
        }
    }
    text
}

/// Open the controlling terminal, write `explanation` followed by
/// `[y/N] `, and wait up to 30 seconds for a response.
///
/// Returns `Ok(())` only when a response arrives in time and its first
/// non-whitespace character is `y` or `Y`. Every denial path returns the
/// specific [`RgError`] variant spec §7 names for it — `PromptUnavailable`
/// (no controlling terminal, or an I/O error talking to it),
/// `PromptTimeout` (30 s elapsed with no response), or `PromptDeny` (a
/// response arrived but wasn't affirmative) — so the caller can both
/// report and exit via the same `RgError::exit_code` mapping used
/// everywhere else in the pipeline.
pub fn prompt(explanation: &str) -> Result<(), RgError> {
    let Ok(tty) = OpenOptions::new().read(true).write(true).open("/dev/tty") else {
        return Err(RgError::PromptUnavailable {
            reason: "no controlling terminal (/dev/tty) available".to_string(),
        });
    };
    let Ok(mut writer) = tty.try_clone() else {
        return Err(RgError::PromptUnavailable {
            reason: "could not open a writable handle to /dev/tty".to_string(),
        });
    };
    if writer.write_all(explanation.as_bytes()).is_err() || writer.write_all(b"[y/N] ").is_err() {
        return Err(RgError::PromptUnavailable {
            reason: "failed to write the confirmation prompt to /dev/tty".to_string(),
        });
    }

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(tty);
        let mut line = String::new();
        let result = reader.read_line(&mut line).map(|_| line);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(PROMPT_TIMEOUT) {
        Ok(Ok(line)) => {
            if line.trim_start().chars().next().is_some_and(|c| c == 'y' || c == 'Y') {
                Ok(())
            } else {
                Err(RgError::PromptDeny)
            }
        }
        Ok(Err(_)) => Err(RgError::PromptDeny),
        Err(_) => Err(RgError::PromptTimeout),
    }
}
