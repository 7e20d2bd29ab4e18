use serde::Serialize;
use sqlx::FromRow;

/// One row of `scans`, without the stored report body.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScanSummary {
    pub id: i64,
    pub root: String,
    pub scanned_at: i64,
    pub total_projects: i64,
    pub total_size_bytes: i64,
    pub duplicate_groups: i64,
    pub undocumented: i64,
    pub warnings: i64,
    pub undocumented_threshold: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredProject {
    pub id: i64,
    pub path: String,
    pub relative_path: String,
    pub name: String,
    pub kind: String,
    pub tags_json: String,
    pub size_bytes: i64,
    pub has_git: bool,
    pub has_docker: bool,
    pub has_readme: bool,
    pub has_tests: bool,
    pub has_docs: bool,
    pub has_ci: bool,
    pub health_score: i64,
    pub duplicate_group: Option<i64>,
    pub first_seen: i64,
    pub last_seen: i64,
    pub last_scan_id: Option<i64>,
}

impl StoredProject {
    /// True when the row was refreshed by the scan `scan_id`; otherwise its
    /// score and duplicate group index describe an older scan.
    pub fn seen_in(&self, scan_id: i64) -> bool {
        self.last_scan_id == Some(scan_id)
    }

    pub fn tags(&self) -> Vec<String> {
        serde_json::from_str(&self.tags_json).unwrap_or_default()
    }
}
