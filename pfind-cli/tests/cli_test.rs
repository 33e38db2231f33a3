use anyhow::Result;
use assert_cmd::cargo::CommandCargoExt;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use tempfile::{tempdir, TempDir};

fn create_test_tree(dir: &TempDir, files: &[&str]) -> Result<()> {
    for name in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "")?;
    }
    Ok(())
}

fn pfind() -> Result<Command> {
    let mut cmd = Command::cargo_bin("pfind")?;
    // Keep user config and log settings out of the way.
    cmd.env_remove("RUST_LOG").env("XDG_CONFIG_HOME", "/nonexistent-pfind-config");
    Ok(cmd)
}

fn root_arg(dir: &TempDir) -> String {
    dir.path().to_string_lossy().into_owned()
}

#[test]
fn test_example_search() -> Result<()> {
    let dir = tempdir()?;
    create_test_tree(&dir, &["a.txt", "b/c.log", "b/a.txt"])?;

    let output = pfind()?.args([root_arg(&dir).as_str(), "a", "2"]).output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let mut lines: Vec<&str> = stdout.lines().collect();
    let summary = lines.pop();
    assert_eq!(summary, Some("Done searching, found 2 files"));

    lines.sort();
    let expected_a = dir.path().join("a.txt");
    let expected_b = dir.path().join("b/a.txt");
    assert_eq!(
        lines,
        vec![
            expected_a.to_str().unwrap(),
            expected_b.to_str().unwrap()
        ]
    );
    Ok(())
}

#[test]
fn test_trailing_separator_not_doubled() -> Result<()> {
    let dir = tempdir()?;
    create_test_tree(&dir, &["x.txt"])?;

    let root = format!("{}//", root_arg(&dir));
    let expected = format!("{}\n", dir.path().join("x.txt").display());
    pfind()?
        .args([root.as_str(), "x", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(expected));
    Ok(())
}

#[test]
fn test_nonexistent_root() -> Result<()> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing");

    pfind()?
        .args([missing.to_str().unwrap(), "a", "4"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Directory does not exist"));
    Ok(())
}

#[test]
fn test_invalid_thread_counts() -> Result<()> {
    let dir = tempdir()?;
    create_test_tree(&dir, &["a.txt"])?;

    for bad in ["0", "-3", "abc"] {
        pfind()?
            .args([root_arg(&dir).as_str(), "a", bad])
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains(format!("{} is not a positive integer", bad)));
    }
    Ok(())
}

#[test]
fn test_missing_arguments() -> Result<()> {
    pfind()?.arg(".").assert().failure();
    Ok(())
}

#[test]
fn test_stats_only() -> Result<()> {
    let dir = tempdir()?;
    create_test_tree(&dir, &["a.txt", "b/a.txt", "b/c.log"])?;

    pfind()?
        .args([root_arg(&dir).as_str(), "a", "3", "--stats"])
        .assert()
        .success()
        .stdout("Done searching, found 2 files\n");
    Ok(())
}

#[test]
fn test_ignore_option() -> Result<()> {
    let dir = tempdir()?;
    create_test_tree(&dir, &["keep/a.txt", "skip/a.txt"])?;

    pfind()?
        .args([root_arg(&dir).as_str(), "a", "2", "-i", "skip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep").and(predicate::str::contains("skip").not()))
        .stdout(predicate::str::ends_with("Done searching, found 1 files\n"));
    Ok(())
}

#[test]
fn test_config_file_supplies_ignore_patterns() -> Result<()> {
    let dir = tempdir()?;
    create_test_tree(&dir, &["tree/a.txt", "tree/a.tmp"])?;
    let config_path = dir.path().join("pfind.yaml");
    fs::write(&config_path, "ignore_patterns: [\"*.tmp\"]\n")?;

    let root = dir.path().join("tree");
    pfind()?
        .args([root.to_str().unwrap(), "a", "2", "--stats", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout("Done searching, found 1 files\n");
    Ok(())
}

#[test]
fn test_missing_config_file() -> Result<()> {
    let dir = tempdir()?;
    pfind()?
        .args([root_arg(&dir).as_str(), "a", "2", "--config"])
        .arg(Path::new("/nonexistent/pfind.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}

#[test]
fn test_closed_stdout_stops_cleanly() -> Result<()> {
    let dir = tempdir()?;
    let files: Vec<String> = (0..2000)
        .map(|i| format!("d{}/a_match_{}.txt", i % 20, i))
        .collect();
    let names: Vec<&str> = files.iter().map(String::as_str).collect();
    create_test_tree(&dir, &names)?;

    // More output than a pipe buffers, with the reader gone before the first line.
    let mut child = StdCommand::cargo_bin("pfind")?
        .args([root_arg(&dir).as_str(), "match", "4"])
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", "/nonexistent-pfind-config")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    drop(child.stdout.take());
    let output = child.wait_with_output()?;

    let stderr = String::from_utf8(output.stderr)?;
    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(!stderr.contains("panicked"), "stderr: {}", stderr);
    // At most one line per worker, not one per match.
    assert!(stderr.lines().count() <= 4, "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_log_level_flag_overrides_config_file() -> Result<()> {
    let dir = tempdir()?;
    create_test_tree(&dir, &["tree/a.txt"])?;
    let config_path = dir.path().join("pfind.yaml");
    fs::write(&config_path, "log_level: \"debug\"\n")?;
    let root = dir.path().join("tree");

    pfind()?
        .args([root.to_str().unwrap(), "a", "1", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Effective configuration"));

    pfind()?
        .args([root.to_str().unwrap(), "a", "1", "--log-level", "warn", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
    Ok(())
}
