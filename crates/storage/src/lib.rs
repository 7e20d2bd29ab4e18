//! Storage layer: SQLite schema and helpers for persisted scan reports.
//!
//! Holds DB pool setup, the migration runner and report persistence.

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;
use zenith_core::ScanReport;

pub mod models;

use models::{ScanSummary, StoredProject};

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let mut url = database_url.to_string();
    if !database_url.starts_with("sqlite:") {
        let path = std::path::PathBuf::from(database_url);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create database directory {}", parent.display()))?;
        }
        let norm = path.to_string_lossy().replace('\\', "/");
        if path.is_absolute() {
            url = format!("sqlite:///{}?mode=rwc", norm.trim_start_matches('/'));
        } else {
            url = format!("sqlite://{}?mode=rwc", norm);
        }
    }
    let mut opts = SqlitePoolOptions::new();
    if url.contains("memory") {
        opts = opts.max_connections(1);
    } else {
        opts = opts.max_connections(5);
    }
    let pool = opts
        .connect(&url)
        .await
        .with_context(|| format!("open database {}", url))?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    // Applies SQLx migrations located in crates/storage/migrations.
    // Safe to run multiple times (idempotent).
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Stores the report and upserts its projects by path. Returns the scan id.
pub async fn save_report(pool: &SqlitePool, report: &ScanReport) -> anyhow::Result<i64> {
    let now = Utc::now().timestamp();
    let report_json = serde_json::to_string(report).context("serialize report")?;
    let mut tx = pool.begin().await?;

    let scan_id = sqlx::query(
        r#"
        INSERT INTO scans (root, scanned_at, total_projects, total_size_bytes,
                           duplicate_groups, undocumented, warnings,
                           undocumented_threshold, report_json)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.root.to_string_lossy().into_owned())
    .bind(now)
    .bind(report.total_projects as i64)
    .bind(report.total_size_bytes as i64)
    .bind(report.duplicate_groups.len() as i64)
    .bind(report.undocumented.len() as i64)
    .bind(report.warnings.len() as i64)
    .bind(i64::from(report.undocumented_threshold))
    .bind(report_json)
    .execute(&mut *tx)
    .await
    .context("insert scan")?
    .last_insert_rowid();

    for project in &report.projects {
        let path = project.path.to_string_lossy().into_owned();
        let tags_json = serde_json::to_string(&project.tags)?;
        let group = report.group_of(&project.path).map(|g| g as i64);
        sqlx::query(
            r#"
            INSERT INTO projects (path, relative_path, name, kind, tags_json, size_bytes,
                                  has_git, has_docker, has_readme, has_tests, has_docs, has_ci,
                                  health_score, duplicate_group, first_seen, last_seen, last_scan_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET
                relative_path = excluded.relative_path,
                name = excluded.name,
                kind = excluded.kind,
                tags_json = excluded.tags_json,
                size_bytes = excluded.size_bytes,
                has_git = excluded.has_git,
                has_docker = excluded.has_docker,
                has_readme = excluded.has_readme,
                has_tests = excluded.has_tests,
                has_docs = excluded.has_docs,
                has_ci = excluded.has_ci,
                health_score = excluded.health_score,
                duplicate_group = excluded.duplicate_group,
                last_seen = excluded.last_seen,
                last_scan_id = excluded.last_scan_id
            "#,
        )
        .bind(&path)
        .bind(project.relative_path.to_string_lossy().into_owned())
        .bind(&project.name)
        .bind(project.kind.as_str())
        .bind(tags_json)
        .bind(project.size_bytes as i64)
        .bind(project.flags.has_git)
        .bind(project.flags.has_docker)
        .bind(project.flags.has_readme)
        .bind(project.flags.has_tests)
        .bind(project.flags.has_docs)
        .bind(project.flags.has_ci)
        .bind(project.health_score as i64)
        .bind(group)
        .bind(now)
        .bind(now)
        .bind(scan_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to upsert project in DB: {}", path))?;
    }

    tx.commit().await?;
    info!(scan_id, projects = report.projects.len(), "Report saved.");
    Ok(scan_id)
}

pub async fn list_scans(pool: &SqlitePool, limit: i64) -> anyhow::Result<Vec<ScanSummary>> {
    let rows = sqlx::query_as::<_, ScanSummary>(
        r#"
        SELECT id, root, scanned_at, total_projects, total_size_bytes,
               duplicate_groups, undocumented, warnings, undocumented_threshold
        FROM scans
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn latest_scan(pool: &SqlitePool) -> anyhow::Result<Option<ScanSummary>> {
    Ok(list_scans(pool, 1).await?.into_iter().next())
}

pub async fn load_report(pool: &SqlitePool, scan_id: i64) -> anyhow::Result<Option<ScanReport>> {
    let json: Option<String> = sqlx::query_scalar("SELECT report_json FROM scans WHERE id = ?")
        .bind(scan_id)
        .fetch_optional(pool)
        .await?;
    json.map(|j| serde_json::from_str(&j).context("decode stored report"))
        .transpose()
}

pub async fn latest_report(pool: &SqlitePool) -> anyhow::Result<Option<(i64, ScanReport)>> {
    let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM scans")
        .fetch_one(pool)
        .await?;
    let Some(scan_id) = latest else {
        return Ok(None);
    };
    Ok(load_report(pool, scan_id).await?.map(|r| (scan_id, r)))
}

/// Projects ordered by path. `below` keeps only those scoring under it;
/// `scan_id` keeps only those the given scan refreshed.
pub async fn list_projects(
    pool: &SqlitePool,
    below: Option<u8>,
    scan_id: Option<i64>,
) -> anyhow::Result<Vec<StoredProject>> {
    let rows = sqlx::query_as::<_, StoredProject>(
        r#"
        SELECT id, path, relative_path, name, kind, tags_json, size_bytes,
               has_git, has_docker, has_readme, has_tests, has_docs, has_ci,
               health_score, duplicate_group, first_seen, last_seen, last_scan_id
        FROM projects
        WHERE (?1 IS NULL OR health_score < ?1)
          AND (?2 IS NULL OR last_scan_id = ?2)
        ORDER BY path
        "#,
    )
    .bind(below.map(i64::from))
    .bind(scan_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
