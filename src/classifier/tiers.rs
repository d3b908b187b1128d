//! Tier 3 (obfuscation), Tier 2 (dry-run expansion), and Tier 1 (direct
//! verb) segment classification.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

use regex::Regex;

use super::{dry_run_unresolvable, unresolvable, Classification, SourceTier, Target};
use crate::paths::{expand_tilde, resolve_absolute_path};

const DRY_RUN_TIMEOUT: Duration = Duration::from_secs(5);

const DIRECT_VERBS: &[&str] = &[
    "rm",
    "rmdir",
    "unlink",
    "shred",
    "trash",
    "trash-put",
    "rimraf",
    "del",
    "erase",
    "rd",
    "Remove-Item",
    "ri",
];

const PREFIX_WORDS: &[&str] = &["sudo", "time", "nice", "env"];

static OBFUSCATION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"\$\(").unwrap(), "command substitution $(...)"),
        (Regex::new(r"`").unwrap(), "backtick command substitution"),
        (
            Regex::new(r"(^|[\s;&|])eval(\s|$)").unwrap(),
            "eval invocation",
        ),
        (
            Regex::new(r"base64[^|]*\|\s*(bash|sh|python\d?)\b").unwrap(),
            "base64-decoded payload piped to an interpreter",
        ),
        (
            Regex::new(
                r"(python3?\s+-c|node\s+-e|perl\s+-e).*(rmtree|unlink|remove|rmSync|rmdirSync|unlinkSync|fs\.rm)",
            )
            .unwrap(),
            "in-band interpreter spawn containing a deletion call",
        ),
    ]
});

static OPTION_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--?[A-Za-z][A-Za-z-]*$").unwrap());

static ENV_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").unwrap());

/// Classify a single top-level segment (already split on `&&`/`||`/`;`/`|`).
pub(super) fn classify_segment(segment: &str, cwd: &Path, home: &Path) -> Classification {
    if let Some(reason) = check_obfuscation(segment) {
        return unresolvable(reason);
    }

    let Ok(raw_tokens) = shell_words::split(segment) else {
        return unresolvable("command could not be tokenized");
    };
    if raw_tokens.is_empty() {
        return Classification::NotDeletion;
    }

    let tokens = strip_prefixes(&raw_tokens);
    if tokens.is_empty() {
        return Classification::NotDeletion;
    }

    if let Some(result) = try_find_dry_run(&tokens, cwd) {
        return result;
    }
    if let Some(result) = try_git_clean_dry_run(&tokens, cwd) {
        return result;
    }

    classify_direct_verb(&tokens, cwd, home)
}

fn check_obfuscation(segment: &str) -> Option<&'static str> {
    OBFUSCATION_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(segment))
        .map(|(_, reason)| *reason)
}

/// Strip leading `VAR=value` environment assignments and common prefix
/// commands (`sudo`, `time`, `nice`, `env`) to reveal the actual verb.
fn strip_prefixes(tokens: &[String]) -> Vec<String> {
    let mut rest = tokens;
    loop {
        let mut advanced = false;
        while rest.first().is_some_and(|t| ENV_ASSIGNMENT.is_match(t)) {
            rest = &rest[1..];
            advanced = true;
        }
        if rest.first().is_some_and(|t| PREFIX_WORDS.contains(&t.as_str())) {
            rest = &rest[1..];
            advanced = true;
        }
        if !advanced {
            break;
        }
    }
    rest.to_vec()
}

fn classify_direct_verb(tokens: &[String], cwd: &Path, home: &Path) -> Classification {
    let Some(verb) = tokens.first() else {
        return Classification::NotDeletion;
    };
    if !DIRECT_VERBS.contains(&verb.as_str()) {
        return Classification::NotDeletion;
    }

    let mut path_tokens = Vec::new();
    for tok in &tokens[1..] {
        if tok.starts_with('-') {
            if OPTION_TOKEN.is_match(tok) {
                continue;
            }
            return unresolvable(format!("unrecognized option `{tok}` for `{verb}`"));
        }
        path_tokens.push(tok.clone());
    }

    if path_tokens.is_empty() {
        return unresolvable(format!("`{verb}` invoked with no resolvable target path"));
    }

    let mut targets = Vec::new();
    for tok in &path_tokens {
        if has_unexpanded_glob(tok) {
            let candidate = resolve_absolute_path(&expand_tilde(tok, home), cwd);
            if !candidate.exists() {
                return unresolvable(format!("glob token `{tok}` not expanded by the classifier"));
            }
        }
        let resolved = resolve_absolute_path(&expand_tilde(tok, home), cwd);
        let is_dir = resolved.is_dir();
        targets.push(Target {
            path: resolved,
            is_dir,
            source_tier: SourceTier::Direct,
        });
    }

    Classification::Deletion {
        targets,
        tier: super::Tier::Direct,
    }
}

fn has_unexpanded_glob(token: &str) -> bool {
    token.contains('*') || token.contains('?') || token.contains('[')
}

/// Build the `find ... -print` re-execution arguments for a `find ...
/// -delete` or `find ... -exec|-execdir|-ok rm ...` segment. Pure and
/// spawn-free so the clause-stripping logic can be unit tested without a
/// subprocess.
fn build_find_dry_run_args(tokens: &[String]) -> Option<Vec<String>> {
    if tokens.first().map(String::as_str) != Some("find") {
        return None;
    }

    let delete_pos = tokens.iter().position(|t| t == "-delete");
    let exec_pos = tokens
        .iter()
        .position(|t| matches!(t.as_str(), "-exec" | "-execdir" | "-ok"));

    let mut dry_run_args: Vec<String> = tokens[1..].to_vec();

    if let Some(pos) = delete_pos {
        dry_run_args.remove(pos - 1);
    } else if let Some(pos) = exec_pos {
        // Remove the `-exec rm ... {} ;` / `+` clause wholesale.
        let start = pos - 1;
        let mut end = start + 1;
        while end < dry_run_args.len() && dry_run_args[end] != ";" && dry_run_args[end] != "+" {
            end += 1;
        }
        if end < dry_run_args.len() {
            end += 1; // consume the terminator too
        }
        dry_run_args.drain(start..end);
    } else {
        return None;
    }

    dry_run_args.push("-print".to_string());
    Some(dry_run_args)
}

fn try_find_dry_run(tokens: &[String], cwd: &Path) -> Option<Classification> {
    let dry_run_args = build_find_dry_run_args(tokens)?;

    let mut cmd = Command::new("find");
    cmd.args(&dry_run_args);
    match run_restricted(cmd, cwd) {
        Some(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let targets = stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| dry_run_target(l, cwd))
                .collect();
            Some(Classification::Deletion {
                targets,
                tier: super::Tier::DryRun,
            })
        }
        _ => Some(dry_run_unresolvable("find dry-run re-execution failed or timed out")),
    }
}

/// Whether `token` is a `git clean` flag that requests force-deletion:
/// either a short-flag cluster containing `f` (e.g. `-f`, `-fd`), or the
/// long form `--force`/`--force=...`. A long option merely *containing*
/// the letter `f` elsewhere (there is no such git-clean option today, but
/// the point is this check must not match by substring) never matches.
fn is_force_flag(token: &str) -> bool {
    if let Some(rest) = token.strip_prefix("--") {
        return rest == "force" || rest.starts_with("force=");
    }
    token.starts_with('-') && token.contains('f')
}

/// Build the `git clean -n ...` re-execution arguments for a `git clean
/// -fX` segment, stripping the force flag rather than blindly deleting
/// every `f` character from it (a long option like `--force` must be
/// removed wholesale, not turned into `--orce`). Pure and spawn-free.
fn build_git_clean_dry_run_args(tokens: &[String]) -> Option<Vec<String>> {
    if tokens.first().map(String::as_str) != Some("git") || tokens.get(1).map(String::as_str) != Some("clean") {
        return None;
    }

    let flag_pos = tokens.iter().skip(2).position(|t| is_force_flag(t)).map(|p| p + 2)?;

    let mut dry_run_args: Vec<String> = tokens[1..].to_vec();
    let flag_index = flag_pos - 1;
    let flag_token = dry_run_args[flag_index].clone();

    if flag_token.starts_with("--") {
        // Long option (`--force` or `--force=...`): remove wholesale.
        dry_run_args.remove(flag_index);
    } else {
        // Short-flag cluster: drop just the `f` character, keeping any
        // other clustered short flags (e.g. `-fd` -> `-d`).
        let stripped: String = flag_token.chars().filter(|&c| c != 'f').collect();
        if stripped == "-" {
            dry_run_args.remove(flag_index);
        } else {
            dry_run_args[flag_index] = stripped;
        }
    }
    dry_run_args.insert(1, "-n".to_string());
    Some(dry_run_args)
}

fn try_git_clean_dry_run(tokens: &[String], cwd: &Path) -> Option<Classification> {
    let dry_run_args = build_git_clean_dry_run_args(tokens)?;

    let mut cmd = Command::new("git");
    cmd.args(&dry_run_args);
    match run_restricted(cmd, cwd) {
        Some(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let targets = stdout
                .lines()
                .filter_map(|l| l.strip_prefix("Would remove "))
                .map(str::trim)
                .map(|l| dry_run_target(l, cwd))
                .collect();
            Some(Classification::Deletion {
                targets,
                tier: super::Tier::DryRun,
            })
        }
        _ => Some(dry_run_unresolvable("git clean dry-run re-execution failed or timed out")),
    }
}

fn dry_run_target(line: &str, cwd: &Path) -> Target {
    let resolved = resolve_absolute_path(Path::new(line), cwd);
    let is_dir = resolved.is_dir();
    Target {
        path: resolved,
        is_dir,
        source_tier: SourceTier::DryRun,
    }
}

/// Run `cmd` in `cwd` with a safe-subset environment and a 5-second
/// timeout. Returns `None` on spawn failure or timeout.
fn run_restricted(mut cmd: Command, cwd: &Path) -> Option<std::process::Output> {
    cmd.current_dir(cwd);
    cmd.env_clear();
    for key in ["PATH", "HOME", "LANG", "TERM"] {
        if let Ok(val) = std::env::var(key) {
            cmd.env(key, val);
        }
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().ok()?;
    let pid = child.id();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = child.wait_with_output();
        let _ = tx.send(result);
    });

    match rx.recv_timeout(DRY_RUN_TIMEOUT) {
        Ok(Ok(output)) => Some(output),
        Ok(Err(_)) => None,
        Err(_) => {
            kill_pid(pid);
            None
        }
    }
}

#[cfg(unix)]
fn kill_pid(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    let _ = kill(Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX)), Signal::SIGKILL);
}

#[cfg(not(unix))]
fn kill_pid(_pid: u32) {}
