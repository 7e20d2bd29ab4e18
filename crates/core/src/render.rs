//! Human-readable renderings of a [`ScanReport`].

use crate::models::ScanReport;
use std::fmt;

pub fn summary_line(report: &ScanReport) -> String {
    format!(
        "scan: {} projects ({}) in {} directories, {} duplicate groups, {} undocumented, {} warnings",
        report.total_projects,
        human_size(report.total_size_bytes),
        report.directories_visited,
        report.duplicate_groups.len(),
        report.undocumented.len(),
        report.warnings.len(),
    )
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Extensions listed in the Markdown file-type table.
pub const TOP_FILE_TYPES: usize = 20;

pub fn markdown(report: &ScanReport) -> String {
    Markdown(report).to_string()
}

/// Markdown rendering of a report; `to_string()` gives the document.
pub struct Markdown<'a>(pub &'a ScanReport);

impl fmt::Display for Markdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "# Project inventory: {}\n", report.root.display())?;
        summary_table(f, report)?;

        if !report.duplicate_groups.is_empty() {
            writeln!(f, "\n## Duplicate groups\n")?;
            for (i, group) in report.duplicate_groups.iter().enumerate() {
                writeln!(f, "**Group {}** ({})", i + 1, group.basis.as_str())?;
                for member in &group.members {
                    writeln!(f, "- {}", member.display())?;
                }
                writeln!(f)?;
            }
        }

        if !report.undocumented.is_empty() {
            writeln!(f, "\n## Undocumented projects\n")?;
            for path in &report.undocumented {
                let score = report
                    .project(path)
                    .map(|p| p.health_score.to_string())
                    .unwrap_or_default();
                writeln!(f, "- {} (score {})", path.display(), score)?;
            }
        }

        if !report.tag_histogram.is_empty() {
            let mut tags: Vec<_> = report.tag_histogram.iter().collect();
            tags.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            count_table(f, "Technology distribution", ("Technology", "Projects"), tags)?;
        }

        if !report.kind_histogram.is_empty() {
            count_table(f, "Project kinds", ("Kind", "Projects"), report.kind_histogram.iter())?;
        }

        if !report.file_type_histogram.is_empty() {
            let types = report
                .top_file_types(TOP_FILE_TYPES)
                .into_iter()
                .map(|(ext, count)| (if ext.is_empty() { "(none)" } else { ext }, count));
            count_table(f, "File types", ("Extension", "Files"), types)?;
        }

        if !report.score_distribution.is_empty() {
            writeln!(f, "\n## Health scores\n")?;
            for (score, count) in report.score_distribution.iter().rev() {
                writeln!(f, "- {score}: {count}")?;
            }
        }

        if !report.warnings.is_empty() {
            writeln!(f, "\n## Warnings\n")?;
            for warning in &report.warnings {
                writeln!(f, "- {warning}")?;
            }
        }
        Ok(())
    }
}

fn summary_table(f: &mut fmt::Formatter<'_>, report: &ScanReport) -> fmt::Result {
    writeln!(f, "## Summary\n")?;
    writeln!(f, "| Metric | Value |")?;
    writeln!(f, "|--------|-------|")?;
    let rows = [
        ("Projects", report.total_projects.to_string()),
        ("Total size", human_size(report.total_size_bytes)),
        ("Directories visited", report.directories_visited.to_string()),
        ("With git", report.projects_with_git.to_string()),
        ("With docker", report.projects_with_docker.to_string()),
        ("Duplicate groups", report.duplicate_groups.len().to_string()),
        (
            "Undocumented (score < threshold)",
            format!("{} (< {})", report.undocumented.len(), report.undocumented_threshold),
        ),
        ("Warnings", report.warnings.len().to_string()),
    ];
    for (metric, value) in rows {
        writeln!(f, "| {metric} | {value} |")?;
    }
    Ok(())
}

fn count_table<K, C>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    (column, count_column): (&str, &str),
    rows: impl IntoIterator<Item = (K, C)>,
) -> fmt::Result
where
    K: fmt::Display,
    C: fmt::Display,
{
    writeln!(f, "\n## {title}\n")?;
    writeln!(f, "| {column} | {count_column} |")?;
    writeln!(
        f,
        "|{}|{}|",
        "-".repeat(column.len() + 2),
        "-".repeat(count_column.len() + 2)
    )?;
    for (key, count) in rows {
        writeln!(f, "| {key} | {count} |")?;
    }
    Ok(())
}
