use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("habitos-{nanos}-{name}"))
}

fn habitos(data_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_habitos"));
    cmd.env("HABITOS_DATA_DIR", data_dir)
        .env("HABITOS_CONFIG_PATH", data_dir.join("missing-config.json"))
        .env_remove("HABITOS_LOG");
    cmd
}

#[test]
fn cli_smoke_help() {
    let dir = temp_dir("smoke-help");
    let output = habitos(&dir)
        .arg("--help")
        .output()
        .expect("failed to run habitos --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("task"));
    assert!(stdout.contains("habit"));
}

#[test]
fn unknown_command_reports_invalid_input() {
    let dir = temp_dir("smoke-unknown");
    let output = habitos(&dir)
        .arg("frobnicate")
        .output()
        .expect("failed to run habitos");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("ERROR: invalid_input - "));
}

#[test]
fn invalid_today_is_rejected() {
    let dir = temp_dir("smoke-today");
    let output = habitos(&dir)
        .args(["task", "list", "--today", "2025-13-40"])
        .output()
        .expect("failed to run habitos");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - invalid date"));
}

#[test]
fn interactive_mode_runs_commands_until_exit() {
    let dir = temp_dir("smoke-interactive");
    let mut child = habitos(&dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn habitos");

    {
        let stdin = child.stdin.as_mut().unwrap();
        writeln!(stdin, r#"task add "Read 20 pages" --today 2025-12-20"#).unwrap();
        writeln!(stdin, "task nonsense").unwrap();
        writeln!(stdin, "task list --today 2025-12-20").unwrap();
        writeln!(stdin, "exit").unwrap();
        writeln!(stdin, "notes set never-reached").unwrap();
    }

    let output = child.wait_with_output().unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("Added task: Read 20 pages"));
    assert!(stdout.contains("Tasks for 2025-12-20: 0/1 completed (0%)"));
    assert!(!stdout.contains("Notes saved."));
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn invalid_config_file_warns_and_continues() {
    let dir = temp_dir("smoke-config");
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("config.json");
    std::fs::write(&config_path, "{ not json").unwrap();

    let output = habitos(&dir)
        .env("HABITOS_CONFIG_PATH", &config_path)
        .args(["theme", "show"])
        .output()
        .expect("failed to run habitos");
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "dark");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARNING: config ignored: invalid_data"));
}
