//! Cluster gate: all-or-nothing probe check before any batch runs.

use autopatch_core::{HostId, ProbeFailure, ProbedHost};

/// An eligible member whose probe failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateViolation {
    pub host: HostId,
    pub failure: ProbeFailure,
}

/// Verdict of the gate for one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterGate {
    violations: Vec<GateViolation>,
}

impl ClusterGate {
    /// Inspect every eligible member. Ineligible members never block a cluster.
    pub fn inspect(members: &[&ProbedHost]) -> Self {
        let violations = members
            .iter()
            .filter(|m| m.record.eligible)
            .filter_map(|m| {
                m.probe_failure().map(|failure| GateViolation {
                    host: m.id().to_string(),
                    failure,
                })
            })
            .collect();
        Self { violations }
    }

    pub fn is_open(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[GateViolation] {
        &self.violations
    }

    /// Offending hosts in member order.
    pub fn offending_hosts(&self) -> Vec<HostId> {
        self.violations.iter().map(|v| v.host.clone()).collect()
    }

    /// `probe failed for: h1(reason), h2(reason)`, or `None` when open.
    pub fn reason(&self) -> Option<String> {
        if self.is_open() {
            return None;
        }
        let listed: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}({})", v.host, v.failure.reason()))
            .collect();
        Some(format!("probe failed for: {}", listed.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopatch_core::{Credentials, HostRecord, LoginStatus, ProbeResult};

    fn member(id: &str, eligible: bool, ping: bool, port: bool, login: LoginStatus) -> ProbedHost {
        ProbedHost {
            record: HostRecord {
                id: id.to_string(),
                address: id.to_string(),
                credentials: Credentials::new("ansible", "pw"),
                eligible,
                alternate_auth: false,
            },
            probe: ProbeResult {
                host: id.to_string(),
                address: id.to_string(),
                ping_ok: ping,
                ssh_port_open: port,
                login,
                user: "ansible".to_string(),
                error: None,
            },
        }
    }

    #[test]
    fn healthy_cluster_is_open() {
        let d1 = member("d1", true, true, true, LoginStatus::Succeeded);
        let d2 = member("d2", true, true, true, LoginStatus::Succeeded);
        let gate = ClusterGate::inspect(&[&d1, &d2]);
        assert!(gate.is_open());
        assert_eq!(gate.reason(), None);
    }

    #[test]
    fn every_offender_is_listed() {
        let d1 = member("d1", true, false, false, LoginStatus::Unknown);
        let d2 = member("d2", true, true, true, LoginStatus::Succeeded);
        let d3 = member("d3", true, true, true, LoginStatus::Failed);
        let gate = ClusterGate::inspect(&[&d1, &d2, &d3]);

        assert!(!gate.is_open());
        assert_eq!(gate.offending_hosts(), vec!["d1", "d3"]);
        assert_eq!(
            gate.reason().unwrap(),
            "probe failed for: d1(probe: ping failed), d3(probe: ssh login failed)"
        );
    }

    #[test]
    fn ineligible_members_do_not_block() {
        let d1 = member("d1", false, false, false, LoginStatus::Unknown);
        let d2 = member("d2", true, true, true, LoginStatus::Succeeded);
        assert!(ClusterGate::inspect(&[&d1, &d2]).is_open());
    }

    #[test]
    fn closed_port_blocks() {
        let d1 = member("d1", true, true, false, LoginStatus::Unknown);
        let gate = ClusterGate::inspect(&[&d1]);
        assert_eq!(gate.violations()[0].failure, ProbeFailure::PortClosed);
    }
}
