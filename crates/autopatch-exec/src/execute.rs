//! Batch execution: runs one batch and reconciles exit status with output.

use std::path::Path;

use thiserror::Error;
use tracing::{error, warn};

use autopatch_core::{CommandExecutionResult, ExecutionBatch, HostId};

use crate::parser::FailureParser;
use crate::runner::CommandRunner;

/// Disagreement between the exit status and the parsed output.
///
/// Logged, never propagated. Both cases resolve toward failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAmbiguity {
    #[error("playbook failed but no failed hosts were found in its output")]
    FailedWithoutHosts,

    #[error("playbook succeeded but its output names failed hosts: {}", .0.join(","))]
    HostsDespiteSuccess(Vec<HostId>),
}

impl ParseAmbiguity {
    pub fn detect(success: bool, failed_hosts: &[HostId]) -> Option<Self> {
        match (success, failed_hosts.is_empty()) {
            (false, true) => Some(Self::FailedWithoutHosts),
            (true, false) => Some(Self::HostsDespiteSuccess(failed_hosts.to_vec())),
            _ => None,
        }
    }
}

/// Run `batch` with `playbook` and recover its failed hosts.
///
/// An invocation error becomes a failed result with zero duration and no
/// failed hosts; it never reaches the caller.
pub fn execute_batch(
    runner: &dyn CommandRunner,
    parser: &dyn FailureParser,
    batch: &ExecutionBatch,
    playbook: &Path,
    dry_run: bool,
) -> CommandExecutionResult {
    let raw = match runner.run(playbook, &batch.hosts, &batch.credentials, dry_run) {
        Ok(raw) => raw,
        Err(e) => {
            let hosts = batch.hosts.join(",");
            error!(
                group = %batch.group,
                user = %batch.credentials.user(),
                %hosts,
                error = %e,
                "could not invoke playbook"
            );
            return CommandExecutionResult::not_invoked();
        }
    };

    let failed_hosts = parser.extract_failed_hosts(&raw.stdout, &raw.stderr);
    if let Some(ambiguity) = ParseAmbiguity::detect(raw.success, &failed_hosts) {
        warn!(group = %batch.group, "{ambiguity}");
    }

    CommandExecutionResult {
        success: raw.success,
        duration: raw.duration,
        stdout: raw.stdout,
        stderr: raw.stderr,
        failed_hosts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use autopatch_core::Credentials;

    use crate::error::{ExecError, ExecResult};
    use crate::parser::AnsibleFailureParser;
    use crate::runner::RawOutput;

    struct FixedRunner(Option<RawOutput>);

    impl CommandRunner for FixedRunner {
        fn run(
            &self,
            _playbook: &Path,
            _hosts: &[HostId],
            _credentials: &Credentials,
            _dry_run: bool,
        ) -> ExecResult<RawOutput> {
            self.0.clone().ok_or_else(|| ExecError::Spawn {
                program: "ansible-playbook".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        }
    }

    fn output(success: bool, stdout: &str) -> RawOutput {
        RawOutput {
            success,
            duration: Duration::from_millis(1500),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn batch() -> ExecutionBatch {
        ExecutionBatch {
            group: "db_cluster".to_string(),
            credentials: Credentials::new("ansible", "pw"),
            hosts: vec!["d1".to_string(), "d2".to_string()],
        }
    }

    fn run(runner: FixedRunner) -> CommandExecutionResult {
        execute_batch(
            &runner,
            &AnsibleFailureParser,
            &batch(),
            Path::new("patch-clusters.yml"),
            false,
        )
    }

    #[test]
    fn clean_success() {
        let result = run(FixedRunner(Some(output(true, "ok: [d1]\nok: [d2]"))));
        assert!(result.success);
        assert!(result.failed_hosts.is_empty());
        assert!(!result.is_failure());
        assert_eq!(result.duration_secs(), 1.5);
    }

    #[test]
    fn parsed_failure_overrides_success() {
        let result = run(FixedRunner(Some(output(true, "fatal: [d1]: FAILED! => {}"))));
        assert!(result.success);
        assert_eq!(result.failed_hosts, vec!["d1"]);
        assert!(result.is_failure());
    }

    #[test]
    fn spawn_error_becomes_failed_batch() {
        let result = run(FixedRunner(None));
        assert_eq!(result, CommandExecutionResult::not_invoked());
        assert!(result.is_failure());
    }

    #[test]
    fn ambiguity_detection() {
        assert_eq!(
            ParseAmbiguity::detect(false, &[]),
            Some(ParseAmbiguity::FailedWithoutHosts)
        );
        let hosts = vec!["d1".to_string()];
        assert_eq!(
            ParseAmbiguity::detect(true, &hosts),
            Some(ParseAmbiguity::HostsDespiteSuccess(hosts.clone()))
        );
        assert_eq!(ParseAmbiguity::detect(true, &[]), None);
        assert_eq!(ParseAmbiguity::detect(false, &hosts), None);
        assert!(
            ParseAmbiguity::HostsDespiteSuccess(hosts)
                .to_string()
                .ends_with("d1")
        );
    }
}
