//! Console rendering of probe tables, outcomes and the run summary.

use autopatch_core::{LoginStatus, OutcomeStatus, ProbedHost, StatusCounts};
use autopatch_rollout::{ClusterGate, RunReport};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn status(&self, status: OutcomeStatus) -> String {
        let code = match status {
            OutcomeStatus::Ok => GREEN,
            OutcomeStatus::Failed => RED,
            OutcomeStatus::Skipped => YELLOW,
        };
        self.paint(status.label(), code)
    }
}

/// Table cell: plain text plus an optional color applied after padding.
struct Cell {
    text: String,
    color: Option<&'static str>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    fn flag(ok: bool) -> Self {
        Self {
            text: if ok { "yes" } else { "no" }.to_string(),
            color: Some(if ok { GREEN } else { RED }),
        }
    }

    fn login(login: LoginStatus) -> Self {
        let (text, color) = match login {
            LoginStatus::Succeeded => ("yes", GREEN),
            LoginStatus::Failed => ("no", RED),
            LoginStatus::Unknown => ("n/a", YELLOW),
        };
        Self {
            text: text.to_string(),
            color: Some(color),
        }
    }
}

const PROBE_HEADERS: [&str; 7] = ["HOST", "ADDRESS", "PING", "SSH", "LOGIN", "USER", "AUTOPATCH"];

fn probe_row(host: &ProbedHost) -> Vec<Cell> {
    vec![
        Cell::plain(host.id()),
        Cell::plain(&host.probe.address),
        Cell::flag(host.probe.ping_ok),
        Cell::flag(host.probe.ssh_port_open),
        Cell::login(host.probe.login),
        Cell::plain(&host.probe.user),
        Cell::flag(host.record.eligible),
    ]
}

fn table(rows: &[Vec<Cell>], style: Style) -> String {
    let mut widths: Vec<usize> = PROBE_HEADERS.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.text.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = PROBE_HEADERS
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{h:<w$}"))
        .collect();
    out.push_str(&format!("  {}\n", header.join("  ").trim_end()));
    let rule: usize = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    out.push_str(&format!("  {}\n", "─".repeat(rule)));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| {
                let padded = format!("{:<w$}", cell.text);
                match cell.color {
                    Some(code) => style.paint(&padded, code),
                    None => padded,
                }
            })
            .collect();
        out.push_str(&format!("  {}\n", cells.join("  ").trim_end()));
    }
    out
}

fn banner(title: &str) -> String {
    let rule = "=".repeat(40);
    format!("\n{rule}\n {title}\n{rule}\n")
}

/// Probe results: standalone hosts, then one table per cluster with its gate verdict.
pub fn probe_tables(report: &RunReport, style: Style) -> String {
    let mut out = banner("STANDALONE (probe)");
    if report.standalone_probes.is_empty() {
        out.push_str("(no hosts)\n");
    } else {
        let rows: Vec<Vec<Cell>> = report.standalone_probes.iter().map(probe_row).collect();
        out.push_str(&table(&rows, style));
    }

    out.push_str(&banner(&format!(
        "CLUSTERS (probe) ({})",
        report.cluster_probes.len()
    )));
    if report.cluster_probes.is_empty() {
        out.push_str("(no clusters)\n");
    }
    for (name, members) in &report.cluster_probes {
        let refs: Vec<&ProbedHost> = members.iter().collect();
        let verdict = if ClusterGate::inspect(&refs).is_open() {
            style.status(OutcomeStatus::Ok)
        } else {
            style.status(OutcomeStatus::Failed)
        };
        out.push_str(&format!("\n{name} -> {verdict}\n"));
        let rows: Vec<Vec<Cell>> = members.iter().map(probe_row).collect();
        out.push_str(&table(&rows, style));
    }
    out
}

/// One line per standalone host and per cluster, with batch detail.
pub fn outcomes(report: &RunReport, style: Style) -> String {
    let mut out = banner(&format!("STANDALONE PATCH (dry-run={})", report.dry_run));
    for o in &report.standalone {
        out.push_str(&format!(
            "{}: {} ({:.1}s) - {}",
            o.host,
            style.status(o.status),
            o.duration_secs,
            o.reason
        ));
        if !o.failed_peers.is_empty() {
            out.push_str(&format!(" failed_hosts={}", o.failed_peers.join(",")));
        }
        out.push('\n');
    }

    out.push_str(&banner(&format!("CLUSTER PATCH (dry-run={})", report.dry_run)));
    for c in &report.clusters {
        out.push_str(&format!(
            "{}: {} ({:.1}s) - {}\n",
            c.cluster,
            style.status(c.status),
            c.duration_secs,
            c.reason
        ));
        for batch in &c.batches {
            out.push_str(&format!("  [{}] ({:.1}s)", batch.user, batch.duration_secs));
            if !batch.failed_hosts.is_empty() {
                out.push_str(&format!(" failed_hosts={}", batch.failed_hosts.join(",")));
            }
            out.push('\n');
        }
    }
    out
}

fn counts_line(label: &str, counts: &StatusCounts, style: Style) -> String {
    format!(
        "{label:<12}{}={} {}={} {}={}\n",
        style.status(OutcomeStatus::Ok),
        counts.ok,
        style.status(OutcomeStatus::Failed),
        counts.failed,
        style.status(OutcomeStatus::Skipped),
        counts.skipped
    )
}

pub fn summary(report: &RunReport, style: Style) -> String {
    let mut out = banner("SUMMARY");
    out.push_str(&counts_line("Standalone:", &report.standalone_counts, style));
    out.push_str(&counts_line("Clusters:", &report.cluster_counts, style));

    let failed_hosts = report.failed_hosts();
    if !failed_hosts.is_empty() {
        out.push_str(&format!("Failed hosts: {}\n", failed_hosts.join(", ")));
    }
    let failed_clusters = report.failed_clusters();
    if !failed_clusters.is_empty() {
        out.push_str(&format!("Failed clusters: {}\n", failed_clusters.join(", ")));
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use autopatch_core::{
        BatchResult, ClusterOutcome, Credentials, HostOutcome, HostRecord, ProbeResult,
    };

    fn probed(id: &str, port: bool, login: LoginStatus) -> ProbedHost {
        ProbedHost {
            record: HostRecord {
                id: id.to_string(),
                address: format!("10.0.0.{}", id.len()),
                credentials: Credentials::new("ansible", "pw"),
                eligible: true,
                alternate_auth: false,
            },
            probe: ProbeResult {
                host: id.to_string(),
                address: format!("10.0.0.{}", id.len()),
                ping_ok: true,
                ssh_port_open: port,
                login,
                user: "ansible".to_string(),
                error: None,
            },
        }
    }

    pub(crate) fn sample_report() -> RunReport {
        let standalone = vec![
            HostOutcome::ok("s1", "ansible", 12.34),
            HostOutcome::failed("s2", "ansible", 3.0, vec!["s2".to_string()]),
        ];
        let cluster = ClusterOutcome {
            cluster: "db_cluster".to_string(),
            status: OutcomeStatus::Failed,
            reason: "failed on: d1".to_string(),
            duration_secs: 5.0,
            failed_hosts: vec!["d1".to_string()],
            batches: vec![BatchResult {
                user: "ansible".to_string(),
                hosts: vec!["d1".to_string(), "d2".to_string()],
                success: true,
                duration_secs: 5.0,
                failed_hosts: vec!["d1".to_string()],
            }],
            members: Vec::new(),
        };
        let mut cluster_probes = BTreeMap::new();
        cluster_probes.insert(
            "db_cluster".to_string(),
            vec![
                probed("d1", true, LoginStatus::Succeeded),
                probed("d2", false, LoginStatus::Unknown),
            ],
        );

        RunReport {
            env: "qa".to_string(),
            run_id: "20260101-120000".to_string(),
            dry_run: true,
            generated_at: "2026-01-01T12:00:00+00:00".to_string(),
            standalone_probes: vec![
                probed("s1", true, LoginStatus::Succeeded),
                probed("s2", true, LoginStatus::Succeeded),
            ],
            cluster_probes,
            standalone_counts: StatusCounts::tally(standalone.iter().map(|o| o.status)),
            cluster_counts: StatusCounts::tally([cluster.status]),
            standalone,
            clusters: vec![cluster],
        }
    }

    #[test]
    fn probe_tables_mark_gated_clusters() {
        let out = probe_tables(&sample_report(), Style::new(false));
        assert!(out.contains("db_cluster -> FAILED"));
        assert!(out.contains("HOST"));
        assert!(out.contains("n/a"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn outcomes_list_hosts_and_batches() {
        let out = outcomes(&sample_report(), Style::new(false));
        assert!(out.contains("s1: OK (12.3s) - patch ok"));
        assert!(out.contains("s2: FAILED (3.0s) - playbook failed failed_hosts=s2"));
        assert!(out.contains("db_cluster: FAILED (5.0s) - failed on: d1"));
        assert!(out.contains("  [ansible] (5.0s) failed_hosts=d1"));
    }

    #[test]
    fn summary_counts_and_failures() {
        let out = summary(&sample_report(), Style::new(false));
        assert!(out.contains("Standalone: OK=1 FAILED=1 SKIPPED=0"));
        assert!(out.contains("Clusters:   OK=0 FAILED=1 SKIPPED=0"));
        assert!(out.contains("Failed hosts: s2"));
        assert!(out.contains("Failed clusters: db_cluster"));
    }

    #[test]
    fn color_wraps_statuses() {
        let out = summary(&sample_report(), Style::new(true));
        assert!(out.contains("\x1b[92mOK\x1b[0m"));
    }
}
