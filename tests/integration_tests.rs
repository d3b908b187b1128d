//! End-to-end scenarios from the decision-gate/backup contract, run
//! against the compiled `rmguard` binary over stdin/exit-code.

mod common;

use std::fs;

fn base_env<'a>(home: &'a std::path::Path, workspace: &'a std::path::Path) -> Vec<(&'a str, &'a str)> {
    vec![
        ("HOME", home.to_str().unwrap()),
        ("CLAUDE_PROJECT_DIR", workspace.to_str().unwrap()),
    ]
}

#[test]
fn clean_workspace_delete_centralized() {
    let workspace = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let backup_root = tempfile::tempdir().unwrap();

    fs::write(workspace.path().join("a.txt"), vec![b'x'; 100]).unwrap();
    fs::create_dir_all(home.path().join(".claude")).unwrap();
    fs::write(
        home.path().join(".claude").join("claude-code-protect.json"),
        format!(r#"{{"backup_root":"{}"}}"#, backup_root.path().display()),
    )
    .unwrap();

    let stdin = common::envelope("rm a.txt", workspace.path());
    let result = common::run_hook(&stdin, &base_env(home.path(), workspace.path()));

    assert!(result.allowed(), "stderr: {}", result.stderr);

    let manifest = fs::read_to_string(backup_root.path().join("manifest.jsonl")).unwrap();
    assert_eq!(manifest.lines().count(), 1);
    assert!(manifest.contains("\"workspace\":\"") && manifest.contains("\"is_dir\":false") && manifest.contains("\"size_bytes\":100"));

    let files_dir = backup_root.path().join("files");
    let entries: Vec<_> = fs::read_dir(&files_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let backed_up = entries[0].as_ref().unwrap().path();
    assert_eq!(fs::read(&backed_up).unwrap(), vec![b'x'; 100]);
}

#[test]
fn outside_delete_no_tty() {
    let workspace = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("report.csv");
    fs::write(&target, b"data").unwrap();

    let stdin = common::envelope(&format!("rm {}", target.display()), workspace.path());
    let result = common::run_hook(&stdin, &base_env(home.path(), workspace.path()));

    assert_eq!(result.status.code(), Some(2));
    assert!(result.stderr.contains(&target.display().to_string()));
}

#[test]
fn obfuscated_command_without_tty_denies() {
    let workspace = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    let stdin = common::envelope("eval \"rm a.txt\"", workspace.path());
    let result = common::run_hook(&stdin, &base_env(home.path(), workspace.path()));

    assert_eq!(result.status.code(), Some(2));
}

#[test]
fn find_delete_expansion_backs_up_both_files() {
    let workspace = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let backup_root = tempfile::tempdir().unwrap();

    fs::write(workspace.path().join("x.log"), b"1").unwrap();
    fs::create_dir_all(workspace.path().join("sub")).unwrap();
    fs::write(workspace.path().join("sub").join("y.log"), b"2").unwrap();
    fs::create_dir_all(home.path().join(".claude")).unwrap();
    fs::write(
        home.path().join(".claude").join("claude-code-protect.json"),
        format!(r#"{{"backup_root":"{}"}}"#, backup_root.path().display()),
    )
    .unwrap();

    let stdin = common::envelope("find . -name '*.log' -delete", workspace.path());
    let result = common::run_hook(&stdin, &base_env(home.path(), workspace.path()));

    assert!(result.allowed(), "stderr: {}", result.stderr);
    let manifest = fs::read_to_string(backup_root.path().join("manifest.jsonl")).unwrap();
    assert_eq!(manifest.lines().count(), 2);
}

#[test]
fn per_folder_cap_skips_oversized_file() {
    let workspace = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let whitelisted = tempfile::tempdir().unwrap();
    let big = whitelisted.path().join("big.bin");
    fs::write(&big, vec![0u8; 20 * 1024 * 1024]).unwrap();

    fs::create_dir_all(home.path().join(".claude")).unwrap();
    fs::write(
        home.path().join(".claude").join("claude-code-protect.json"),
        format!(
            r#"{{"backup_mode":"per-folder","whitelisted_folders":["{}"]}}"#,
            whitelisted.path().display()
        ),
    )
    .unwrap();

    let stdin = common::envelope(&format!("rm {}", big.display()), workspace.path());
    let result = common::run_hook(&stdin, &base_env(home.path(), workspace.path()));

    assert!(result.allowed(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("exceeds 10MB"), "stdout: {}", result.stdout);
    assert!(!whitelisted.path().join(".claude-backups").exists());
}

#[test]
fn concurrent_centralized_appends_both_recorded() {
    let workspace = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let backup_root = tempfile::tempdir().unwrap();

    fs::write(workspace.path().join("a.txt"), b"a").unwrap();
    fs::write(workspace.path().join("b.txt"), b"b").unwrap();
    fs::create_dir_all(home.path().join(".claude")).unwrap();
    fs::write(
        home.path().join(".claude").join("claude-code-protect.json"),
        format!(r#"{{"backup_root":"{}"}}"#, backup_root.path().display()),
    )
    .unwrap();

    let env_a: Vec<(String, String)> = vec![
        ("HOME".to_string(), home.path().to_str().unwrap().to_string()),
        ("CLAUDE_PROJECT_DIR".to_string(), workspace.path().to_str().unwrap().to_string()),
    ];
    let env_b = env_a.clone();
    let workspace_a = workspace.path().to_path_buf();
    let workspace_b = workspace.path().to_path_buf();

    let handle_a = std::thread::spawn(move || {
        let stdin = common::envelope("rm a.txt", &workspace_a);
        let env: Vec<(&str, &str)> = env_a.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        common::run_hook(&stdin, &env)
    });
    let handle_b = std::thread::spawn(move || {
        let stdin = common::envelope("rm b.txt", &workspace_b);
        let env: Vec<(&str, &str)> = env_b.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        common::run_hook(&stdin, &env)
    });

    let result_a = handle_a.join().unwrap();
    let result_b = handle_b.join().unwrap();
    assert!(result_a.allowed());
    assert!(result_b.allowed());

    let manifest = fs::read_to_string(backup_root.path().join("manifest.jsonl")).unwrap();
    let lines: Vec<&str> = manifest.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert!(serde_json::from_str::<serde_json::Value>(line).is_ok(), "malformed manifest line: {line}");
    }
}

#[test]
fn non_destructive_command_allows_with_no_diagnostics() {
    let workspace = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    let stdin = common::envelope("ls -la", workspace.path());
    let result = common::run_hook(&stdin, &base_env(home.path(), workspace.path()));

    assert!(result.allowed());
    assert!(result.stdout.is_empty());
}

#[test]
fn empty_command_allows() {
    let workspace = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    let stdin = common::envelope("", workspace.path());
    let result = common::run_hook(&stdin, &base_env(home.path(), workspace.path()));

    assert!(result.allowed());
}

#[test]
fn malformed_envelope_allows() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_hook("not json at all", &[("HOME", home.path().to_str().unwrap())]);
    assert!(result.allowed());
}
