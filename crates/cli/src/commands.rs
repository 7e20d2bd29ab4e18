use anyhow::{Context, Result};
use std::path::PathBuf;
use storage::models::{ScanSummary, StoredProject};
use tracing::info;
use zenith_core::config::AppConfig;
use zenith_core::{render, scan_with, ScanOptions, ScanReport};

/// Command-line overrides for a scan; empty fields fall back to the config.
#[derive(Debug, Clone, Default)]
pub struct ScanArgs {
    pub root: Option<String>,
    pub exclude: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub include_hidden: bool,
    pub threshold: Option<u8>,
    pub markdown: Option<String>,
    pub save: bool,
}

pub fn scan_options(cfg: &AppConfig, args: &ScanArgs) -> ScanOptions {
    let root = args
        .root
        .clone()
        .or_else(|| cfg.scan.root.clone())
        .unwrap_or_else(|| ".".to_string());
    let mut options = cfg.scan.to_options(PathBuf::from(root));
    options.exclusions.extend(args.exclude.iter().cloned());
    options.exclude_globs.extend(args.exclude_globs.iter().cloned());
    options.include_hidden |= args.include_hidden;
    if let Some(threshold) = args.threshold {
        options.undocumented_threshold = threshold;
    }
    options
}

pub struct ScanOutcome {
    pub report: ScanReport,
    pub scan_id: Option<i64>,
}

pub async fn run_scan(cfg: &AppConfig, args: &ScanArgs) -> Result<ScanOutcome> {
    let options = scan_options(cfg, args);
    // the walk is blocking filesystem work
    let report = tokio::task::spawn_blocking(move || scan_with(&options)).await??;

    if let Some(path) = args.markdown.as_deref().or(cfg.report.markdown_path.as_deref()) {
        std::fs::write(path, render::markdown(&report))
            .with_context(|| format!("write markdown report to {}", path))?;
        info!("Markdown report written to {}", path);
    }

    let scan_id = if args.save || cfg.report.save {
        let pool = storage::connect(&cfg.database.path).await.context("db connect")?;
        storage::migrate(&pool).await.context("db migrate")?;
        Some(storage::save_report(&pool, &report).await?)
    } else {
        None
    };
    Ok(ScanOutcome { report, scan_id })
}

pub fn format_report(report: &ScanReport) -> String {
    let mut out = render::summary_line(report);
    out.push('\n');
    for (i, group) in report.duplicate_groups.iter().enumerate() {
        out.push_str(&format!("duplicate group {} ({}):\n", i + 1, group.basis.as_str()));
        for member in &group.members {
            out.push_str(&format!("  {}\n", member.display()));
        }
    }
    if !report.undocumented.is_empty() {
        out.push_str(&format!(
            "undocumented (score < {}):\n",
            report.undocumented_threshold
        ));
        for path in &report.undocumented {
            out.push_str(&format!("  {}\n", path.display()));
        }
    }
    let file_types: Vec<_> = report
        .top_file_types(5)
        .into_iter()
        .map(|(ext, count)| format!("{} {}", if ext.is_empty() { "(none)" } else { ext }, count))
        .collect();
    if !file_types.is_empty() {
        out.push_str(&format!("file types: {}\n", file_types.join(", ")));
    }
    for warning in &report.warnings {
        out.push_str(&format!("warning: {}\n", warning));
    }
    out
}

pub fn format_history(scans: &[ScanSummary]) -> String {
    let mut out = String::new();
    for s in scans {
        let when = chrono::DateTime::from_timestamp(s.scanned_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "#{} {} {}: {} projects, {} duplicate groups, {} undocumented, {} warnings\n",
            s.id, when, s.root, s.total_projects, s.duplicate_groups, s.undocumented, s.warnings
        ));
    }
    out
}

/// Rows refreshed by `latest_scan` show their duplicate group; older rows are
/// marked with the scan that last saw them, since their group index is stale.
pub fn format_projects(projects: &[StoredProject], latest_scan: Option<i64>) -> String {
    let mut out = String::new();
    for p in projects {
        let note = match (latest_scan, p.last_scan_id) {
            (Some(latest), _) if p.seen_in(latest) => p
                .duplicate_group
                .map(|g| format!(" [dup {}]", g + 1))
                .unwrap_or_default(),
            (_, Some(seen)) => format!(" [last seen in scan #{}]", seen),
            (_, None) => String::new(),
        };
        out.push_str(&format!(
            "{:>3} {} ({}; {}){}\n",
            p.health_score,
            p.path,
            p.kind,
            p.tags().join(", "),
            note
        ));
    }
    out
}

pub async fn history(cfg: &AppConfig, limit: i64) -> Result<Vec<ScanSummary>> {
    let pool = storage::connect(&cfg.database.path).await.context("db connect")?;
    storage::migrate(&pool).await.context("db migrate")?;
    storage::list_scans(&pool, limit).await
}

pub async fn stored_report(cfg: &AppConfig, scan_id: Option<i64>) -> Result<(i64, ScanReport)> {
    let pool = storage::connect(&cfg.database.path).await.context("db connect")?;
    storage::migrate(&pool).await.context("db migrate")?;
    match scan_id {
        Some(id) => storage::load_report(&pool, id)
            .await?
            .map(|r| (id, r))
            .with_context(|| format!("no stored scan with id {}", id)),
        None => storage::latest_report(&pool)
            .await?
            .context("no scans stored yet"),
    }
}

/// Stored projects plus the id of the newest scan. With `undocumented_only`,
/// only rows refreshed by that scan and scoring below the threshold it ran
/// with are returned.
pub async fn stored_projects(
    cfg: &AppConfig,
    undocumented_only: bool,
) -> Result<(Vec<StoredProject>, Option<i64>)> {
    let pool = storage::connect(&cfg.database.path).await.context("db connect")?;
    storage::migrate(&pool).await.context("db migrate")?;
    let latest = storage::latest_scan(&pool).await?;
    let latest_id = latest.as_ref().map(|s| s.id);
    let projects = if undocumented_only {
        let threshold = latest
            .as_ref()
            .and_then(|s| u8::try_from(s.undocumented_threshold).ok())
            .unwrap_or(cfg.scan.undocumented_threshold);
        storage::list_projects(&pool, Some(threshold), latest_id).await?
    } else {
        storage::list_projects(&pool, None, None).await?
    };
    Ok((projects, latest_id))
}
