use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_sth") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "sth.exe" } else { "sth" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve sth binary path for integration test"),
    }
}

/// Timing overrides that keep sim-backed CLI runs fast. The sim renders
/// ~300ms after a fill, so the presence window must stay comfortably above
/// that; everything else shrinks to test scale.
pub const FAST_TIMING_ENV: &[(&str, &str)] = &[
    ("STH_TIMING_PAGE_LOAD_MS", "20"),
    ("STH_TIMING_AFTER_CLEAR_MS", "50"),
    ("STH_TIMING_PRESENCE_TIMEOUT_MS", "2000"),
    ("STH_TIMING_SETTLE_DELAY_MS", "50"),
    ("STH_TIMING_BETWEEN_SCENARIOS_MS", "10"),
    ("STH_TIMING_POLL_INTERVAL_MS", "25"),
    ("STH_TIMING_SETTLE_GRACE_MS", "100"),
];

pub fn run_cli_case(case_name: &str, args: &[&str], env: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("sth-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command.args(args).env("RUST_BACKTRACE", "1");
    for (name, value) in env {
        command.env(name, value);
    }
    let output = command.output().expect("execute sth command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}
