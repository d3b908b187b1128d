//! Shared test infrastructure for rmguard's integration tests.
//!
//! Spawns the compiled `rmguard` binary, feeds it a stdin envelope, and
//! captures its exit status plus stdout/stderr — the same black-box
//! contract the host process uses.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CmdResult {
    pub fn allowed(&self) -> bool {
        self.status.success()
    }
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_rmguard") {
        let p = PathBuf::from(path);
        if p.exists() {
            return p;
        }
    }

    let exe_name = if cfg!(windows) { "rmguard.exe" } else { "rmguard" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve rmguard binary path (checked CARGO_BIN_EXE_rmguard and debug sibling path)"),
    }
}

/// Build the JSON envelope the host sends on stdin.
pub fn envelope(command: &str, cwd: &std::path::Path) -> String {
    format!(
        r#"{{"tool_name":"Bash","tool_input":{{"command":{command:?}}},"cwd":{cwd:?}}}"#,
        command = command,
        cwd = cwd.to_string_lossy(),
    )
}

/// Run the compiled hook binary with the given stdin payload and
/// environment variable overrides.
pub fn run_hook(stdin: &str, env: &[(&str, &str)]) -> CmdResult {
    let bin_path = resolve_bin_path();
    let mut cmd = Command::new(&bin_path);
    cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
    for (k, v) in env {
        cmd.env(k, v);
    }

    let mut child = cmd.spawn().expect("spawn rmguard");
    child
        .stdin
        .take()
        .expect("child stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");

    let output = child.wait_with_output().expect("wait for rmguard");

    CmdResult {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}
