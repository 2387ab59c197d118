//! Command runner: the blocking boundary to `ansible-playbook`.
//!
//! Pipeline:
//! 1. Build `ansible-playbook -i <inventory> <playbook> -l <hosts> --extra-vars ...`
//! 2. Pass the become password through the environment as well
//! 3. Wait for the process; no timeout beyond what the playbook enforces
//! 4. Return exit status, elapsed time and both output streams

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use autopatch_core::{Credentials, HostId};

use crate::error::{ExecError, ExecResult};

/// Program invoked for every batch.
pub const PLAYBOOK_PROGRAM: &str = "ansible-playbook";

/// Markers that make a stdout line worth repeating at WARN.
const INTERESTING_MARKERS: [&str; 5] = [
    "FAILED!",
    "UNREACHABLE!",
    "MODULE FAILURE",
    "MSG:",
    "ERROR!",
];

const SUMMARY_LINES: usize = 20;

/// Raw result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    pub success: bool,
    pub duration: Duration,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the update command against a host list with one credential pair.
///
/// Implementations return `Err` only when the command could not be
/// invoked. A failed remote operation is an `Ok` with `success == false`.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        playbook: &Path,
        hosts: &[HostId],
        credentials: &Credentials,
        dry_run: bool,
    ) -> ExecResult<RawOutput>;
}

/// [`CommandRunner`] backed by `ansible-playbook`.
#[derive(Debug, Clone)]
pub struct AnsiblePlaybookRunner {
    program: String,
    inventory: PathBuf,
}

impl AnsiblePlaybookRunner {
    pub fn new(inventory: impl Into<PathBuf>) -> Self {
        Self {
            program: PLAYBOOK_PROGRAM.to_string(),
            inventory: inventory.into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn inventory(&self) -> &Path {
        &self.inventory
    }

    fn command(
        &self,
        playbook: &Path,
        hosts: &[HostId],
        credentials: &Credentials,
        dry_run: bool,
    ) -> Command {
        let user = credentials.user();
        let secret = credentials.secret();

        let mut cmd = Command::new(&self.program);
        cmd.arg("-i")
            .arg(&self.inventory)
            .arg(playbook)
            .arg("-l")
            .arg(hosts.join(","))
            .arg("--extra-vars")
            .arg(format!(
                "ansible_user={user} ansible_ssh_pass={secret} \
                 ansible_become=true ansible_become_pass={secret}"
            ))
            .env("ANSIBLE_BECOME_PASS", secret)
            .env("ANSIBLE_ASK_BECOME_PASS", "false");
        if dry_run {
            cmd.arg("--check");
        }
        cmd
    }
}

impl CommandRunner for AnsiblePlaybookRunner {
    fn run(
        &self,
        playbook: &Path,
        hosts: &[HostId],
        credentials: &Credentials,
        dry_run: bool,
    ) -> ExecResult<RawOutput> {
        if hosts.is_empty() {
            return Err(ExecError::NoHosts {
                playbook: playbook.display().to_string(),
            });
        }

        let host_list = hosts.join(",");
        info!(
            dry_run,
            hosts = %host_list,
            playbook = %playbook.display(),
            user = %credentials.user(),
            "running playbook"
        );

        let start = Instant::now();
        let output = self
            .command(playbook, hosts, credentials, dry_run)
            .output()
            .map_err(|source| ExecError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let duration = start.elapsed();

        let raw = RawOutput {
            success: output.status.success(),
            duration,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if raw.success {
            info!(
                duration_secs = duration.as_secs_f64(),
                hosts = %host_list,
                "playbook ok"
            );
        } else {
            warn!(
                status = %output.status,
                duration_secs = duration.as_secs_f64(),
                hosts = %host_list,
                "playbook failed"
            );
            log_failure_summary(&raw.stdout, &raw.stderr);
        }

        debug!(stdout = %raw.stdout, "playbook stdout");
        debug!(stderr = %raw.stderr, "playbook stderr");

        Ok(raw)
    }
}

/// Repeat the lines that explain a failure at WARN so they reach the console.
fn log_failure_summary(stdout: &str, stderr: &str) {
    let interesting = interesting_lines(stdout);
    if !interesting.is_empty() {
        warn!("playbook error summary (stdout):");
        for line in interesting {
            warn!("  {line}");
        }
    }

    let errors = leading_lines(stderr);
    if !errors.is_empty() {
        warn!("playbook stderr (first lines):");
        for line in errors {
            warn!("  {line}");
        }
    }
}

fn interesting_lines(stdout: &str) -> Vec<&str> {
    stdout
        .lines()
        .filter(|line| INTERESTING_MARKERS.iter().any(|m| line.contains(m)))
        .map(str::trim)
        .take(SUMMARY_LINES)
        .collect()
}

fn leading_lines(stderr: &str) -> Vec<&str> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(SUMMARY_LINES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn creds() -> Credentials {
        Credentials::new("ansible", "s3cret")
    }

    fn hosts(ids: &[&str]) -> Vec<HostId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_line_matches_playbook_contract() {
        let runner = AnsiblePlaybookRunner::new("envs/qa/inventory");
        let cmd = runner.command(
            Path::new("patch-galera.yml"),
            &hosts(&["d1", "d2"]),
            &creds(),
            false,
        );

        assert_eq!(cmd.get_program(), OsStr::new("ansible-playbook"));
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("-i"),
                OsStr::new("envs/qa/inventory"),
                OsStr::new("patch-galera.yml"),
                OsStr::new("-l"),
                OsStr::new("d1,d2"),
                OsStr::new("--extra-vars"),
                OsStr::new(
                    "ansible_user=ansible ansible_ssh_pass=s3cret \
                     ansible_become=true ansible_become_pass=s3cret"
                ),
            ]
        );

        let envs: Vec<(&OsStr, Option<&OsStr>)> = cmd.get_envs().collect();
        assert!(envs.contains(&(OsStr::new("ANSIBLE_BECOME_PASS"), Some(OsStr::new("s3cret")))));
        assert!(envs.contains(&(OsStr::new("ANSIBLE_ASK_BECOME_PASS"), Some(OsStr::new("false")))));
    }

    #[test]
    fn dry_run_appends_check() {
        let runner = AnsiblePlaybookRunner::new("inv");
        let cmd = runner.command(Path::new("p.yml"), &hosts(&["s1"]), &creds(), true);
        assert_eq!(cmd.get_args().last(), Some(OsStr::new("--check")));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let runner = AnsiblePlaybookRunner::new("inv").with_program("autopatch-no-such-playbook");
        let err = runner
            .run(Path::new("p.yml"), &hosts(&["s1"]), &creds(), false)
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[test]
    fn empty_host_list_is_refused() {
        let runner = AnsiblePlaybookRunner::new("inv");
        let err = runner.run(Path::new("p.yml"), &[], &creds(), false).unwrap_err();
        assert!(matches!(err, ExecError::NoHosts { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_becomes_success_flag() {
        let ok = AnsiblePlaybookRunner::new("inv")
            .with_program("true")
            .run(Path::new("p.yml"), &hosts(&["s1"]), &creds(), false)
            .unwrap();
        assert!(ok.success);

        let failed = AnsiblePlaybookRunner::new("inv")
            .with_program("false")
            .run(Path::new("p.yml"), &hosts(&["s1"]), &creds(), false)
            .unwrap();
        assert!(!failed.success);
    }

    #[test]
    fn failure_summary_picks_marked_lines() {
        let stdout = "PLAY [all]\n\
                      fatal: [d1]: FAILED! => {\"msg\": \"boom\"}\n\
                      ok: [d2]\n\
                      ERROR! the role 'x' was not found\n";
        assert_eq!(
            interesting_lines(stdout),
            vec![
                "fatal: [d1]: FAILED! => {\"msg\": \"boom\"}",
                "ERROR! the role 'x' was not found",
            ]
        );

        let stderr = "\n  first  \n\nsecond\n";
        assert_eq!(leading_lines(stderr), vec!["first", "second"]);
    }

    #[test]
    fn failure_summary_is_capped() {
        let stdout = "x: FAILED!\n".repeat(50);
        assert_eq!(interesting_lines(&stdout).len(), SUMMARY_LINES);
    }
}
