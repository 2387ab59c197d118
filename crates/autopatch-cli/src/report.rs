//! JSON report sink.

use std::path::{Path, PathBuf};

use anyhow::Context;

use autopatch_rollout::RunReport;

/// `<dir>/autopatch_<env>_<run_id>.json`
pub fn report_path(dir: &Path, report: &RunReport) -> PathBuf {
    dir.join(format!("autopatch_{}_{}.json", report.env, report.run_id))
}

/// Write `report` as pretty JSON, creating `dir` if needed.
pub fn write_report(dir: &Path, report: &RunReport) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report dir {}", dir.display()))?;
    let path = report_path(dir, report);
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_report;

    #[test]
    fn writes_named_report_into_new_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("reports");
        let report = sample_report();

        let path = write_report(&dir, &report).unwrap();
        assert_eq!(path, dir.join("autopatch_qa_20260101-120000.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["env"], "qa");
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["clusters"][0]["failed_hosts"][0], "d1");
        assert_eq!(value["standalone"][1]["failed_peers"][0], "s2");
        assert!(value["standalone"][0].get("failed_peers").is_none());
        assert!(value["cluster_probes"]["db_cluster"][1]["probe"]["login"].is_null());
    }
}
