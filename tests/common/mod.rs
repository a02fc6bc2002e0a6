//! Shared helpers for CLI integration tests: run the built `bevid` binary,
//! keep a per-case log, and lay out fixture configs.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Smallest PNG header `infer` recognises.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
/// Smallest JPEG header `infer` recognises.
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0];
/// GIF, which is recognised but not accepted.
pub const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

const SCRUBBED_ENV: [&str; 6] = [
    "BEVID_CONFIG",
    "BEVID_HIGH_THRESHOLD",
    "BEVID_MEDIUM_THRESHOLD",
    "BEVID_TOP_N",
    "BEVID_LOG",
    "RUST_LOG",
];

#[derive(Debug)]
pub struct CliResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn log_dir() -> PathBuf {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("cli-cases");
    fs::create_dir_all(&dir).expect("create cli log dir");
    dir
}

/// Run `bevid` with `args` and a scrubbed environment.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CliResult {
    run_cli_case_with_env(case_name, args, &[])
}

pub fn run_cli_case_with_env(case_name: &str, args: &[&str], env: &[(&str, &str)]) -> CliResult {
    let mut command = Command::new(env!("CARGO_BIN_EXE_bevid"));
    command.args(args).env("NO_COLOR", "1");
    for key in SCRUBBED_ENV {
        command.env_remove(key);
    }
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output().expect("spawn bevid");

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let log_path = log_dir().join(format!("{case_name}.log"));
    let log = format!(
        "args: {args:?}\nstatus: {}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}\n",
        output.status
    );
    fs::write(&log_path, log).expect("write cli log");

    CliResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Write `scores` as the default fixture entry plus a config pointing at it.
/// Returns the config path.
pub fn write_fixture_config(dir: &Path, scores: &str, extra_toml: &str) -> PathBuf {
    let fixture = dir.join("scores.json");
    fs::write(&fixture, format!("{{\"default\": {scores}}}")).expect("write fixture");
    let config = dir.join("bevid.toml");
    fs::write(
        &config,
        format!(
            "[model]\nbackend = \"fixture\"\nfixture_path = {:?}\n\n{extra_toml}",
            fixture.display().to_string()
        ),
    )
    .expect("write config");
    config
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write fixture file");
    path
}
