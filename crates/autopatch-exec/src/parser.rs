//! Failure parser: recovers failed hosts from playbook output.
//!
//! The playbook's exit status is coarse: it can succeed while single
//! hosts failed, or fail without naming anyone. The parser reads the
//! text instead. It is best-effort evidence, so it sits behind a trait
//! and a structured-output parser can replace it later.

use std::collections::HashSet;

use autopatch_core::HostId;

/// Extracts the hosts that failed from one invocation's output.
pub trait FailureParser: Send + Sync {
    /// Failed hosts in first-seen order, without duplicates.
    fn extract_failed_hosts(&self, stdout: &str, stderr: &str) -> Vec<HostId>;
}

/// Parser for the default `ansible-playbook` callback output.
///
/// Recognized lines:
/// - `fatal: [host]: FAILED! => {...}` yields `host`
/// - `host : ok=3 ... ` lines carrying `FAILED!` or `UNREACHABLE!` yield
///   their first token
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsibleFailureParser;

const FATAL_PREFIX: &str = "fatal:";
const FAILURE_MARKERS: [&str; 2] = ["FAILED!", "UNREACHABLE!"];

impl AnsibleFailureParser {
    fn host_from_line(line: &str) -> Option<&str> {
        if line.starts_with(FATAL_PREFIX) {
            if let Some(host) = bracketed(line) {
                return Some(host);
            }
        }

        if !FAILURE_MARKERS.iter().any(|m| line.contains(m)) {
            return None;
        }
        let token = line.split_whitespace().next()?.trim_end_matches(':');
        if token.is_empty() || token.to_lowercase().starts_with("fatal") {
            return None;
        }
        Some(token)
    }
}

impl FailureParser for AnsibleFailureParser {
    fn extract_failed_hosts(&self, stdout: &str, stderr: &str) -> Vec<HostId> {
        let mut seen = HashSet::new();
        let mut failed = Vec::new();

        let lines = stdout.lines().chain(stderr.lines()).map(str::trim);
        for line in lines.filter(|l| !l.is_empty()) {
            if let Some(host) = Self::host_from_line(line) {
                if seen.insert(host) {
                    failed.push(host.to_string());
                }
            }
        }
        failed
    }
}

/// Text between the first `[` and the next `]`, if non-empty.
fn bracketed(line: &str) -> Option<&str> {
    let open = line.find('[')?;
    let rest = &line[open + 1..];
    let close = rest.find(']')?;
    let host = &rest[..close];
    (!host.is_empty()).then_some(host)
}
