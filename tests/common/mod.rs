#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use linelog::logger::reader::PartitionReader;
use linelog::logger::record::Record;
use linelog::logger::writer::partition_path;
use tempfile::TempDir;

pub const TEST_EMAIL: &str = "dev@example.com";

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
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_linelog") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "linelog.exe" } else { "linelog" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve linelog binary path for integration test"),
    }
}

/// Isolated log root, config file and identity program for one test.
pub struct TestEnv {
    dir: TempDir,
    pub log_root: PathBuf,
    pub config_path: PathBuf,
    pub identity_program: String,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create test env dir");
        let log_root = dir.path().join("code-log");
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "").expect("write empty config");
        let identity_program = fake_identity_program(dir.path());
        Self {
            dir,
            log_root,
            config_path,
            identity_program,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(resolve_bin_path());
        command
            .arg("--config")
            .arg(&self.config_path)
            .args(args)
            .env("LINELOG_LOG_ROOT", &self.log_root)
            .env("LINELOG_IDENTITY_PROGRAM", &self.identity_program)
            .env_remove("LINELOG_OUTPUT_FORMAT")
            .env_remove("LINELOG_LOG")
            .env("RUST_BACKTRACE", "1");
        command
    }

    /// Run the binary to completion, feeding `stdin` if given.
    pub fn run(&self, case_name: &str, args: &[&str], stdin: Option<&str>) -> CmdResult {
        self.run_with_env(case_name, args, stdin, &[])
    }

    /// Like [`TestEnv::run`] with extra environment variables set.
    pub fn run_with_env(
        &self,
        case_name: &str,
        args: &[&str],
        stdin: Option<&str>,
        vars: &[(&str, &str)],
    ) -> CmdResult {
        let mut command = self.command(args);
        command
            .envs(vars.iter().copied())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().expect("spawn linelog");
        if let Some(input) = stdin {
            feed_stdin(&mut child, input);
        }
        let output = child.wait_with_output().expect("wait for linelog");
        record_case(case_name, args, &output)
    }

    /// Every record under the log root, oldest partition first.
    pub fn all_records(&self) -> Vec<Record> {
        let reader = PartitionReader::new(&self.log_root);
        let mut records = Vec::new();
        for date in reader.list_dates().expect("list partitions") {
            records.extend(reader.read(date).expect("read partition"));
        }
        records
    }

    /// Paths of every partition file under the log root.
    pub fn partition_files(&self) -> Vec<PathBuf> {
        PartitionReader::new(&self.log_root)
            .list_dates()
            .expect("list partitions")
            .into_iter()
            .map(|date| partition_path(&self.log_root, date))
            .collect()
    }

    /// Start `linelog hook` with `event` on stdin without waiting for it.
    pub fn spawn_hook(&self, event: &str) -> Child {
        let mut child = self
            .command(&["hook"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn linelog hook");
        feed_stdin(&mut child, event);
        child
    }
}

fn feed_stdin(child: &mut Child, input: &str) {
    let mut stdin = child.stdin.take().expect("child stdin");
    stdin.write_all(input.as_bytes()).expect("write child stdin");
}

#[cfg(unix)]
fn fake_identity_program(dir: &Path) -> String {
    use std::os::unix::fs::PermissionsExt as _;

    let script = dir.join("fake-git");
    fs::write(&script, format!("#!/bin/sh\necho {TEST_EMAIL}\n")).expect("write fake git");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod fake git");
    script.to_string_lossy().into_owned()
}

#[cfg(not(unix))]
fn fake_identity_program(_dir: &Path) -> String {
    "linelog-no-identity-program".to_string()
}

fn record_case(case_name: &str, args: &[&str], output: &Output) -> CmdResult {
    let root = std::env::temp_dir().join("linelog-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");
    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
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
