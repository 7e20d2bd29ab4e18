//! Single-pass scan: walk, identify, group, score, report.

use crate::error::ScanError;
use crate::models::ScanReport;
use crate::reporter::{self, ReportInput};
use crate::walker::{self, WalkOptions};
use crate::{grouper, identifier, scorer};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "node_modules",
    ".git",
    ".venv",
    "__pycache__",
    "dist",
    "build",
    "target",
];

pub const DEFAULT_UNDOCUMENTED_THRESHOLD: u8 = 60;

pub fn default_exclusions() -> BTreeSet<String> {
    DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub exclusions: BTreeSet<String>,
    pub exclude_globs: Vec<String>,
    pub include_hidden: bool,
    pub undocumented_threshold: u8,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclusions: default_exclusions(),
            exclude_globs: Vec::new(),
            include_hidden: false,
            undocumented_threshold: DEFAULT_UNDOCUMENTED_THRESHOLD,
        }
    }

    pub fn with_exclusions(mut self, exclusions: BTreeSet<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_exclude_globs(mut self, globs: Vec<String>) -> Self {
        self.exclude_globs = globs;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.undocumented_threshold = threshold;
        self
    }
}

/// Scans `root` and returns the finished report, or `RootNotFound` when the
/// root is missing or unreadable.
pub fn scan(
    root: impl AsRef<Path>,
    exclusions: &BTreeSet<String>,
    undocumented_threshold: u8,
) -> Result<ScanReport, ScanError> {
    let options = ScanOptions::new(root.as_ref())
        .with_exclusions(exclusions.clone())
        .with_threshold(undocumented_threshold);
    scan_with(&options)
}

pub fn scan_with(options: &ScanOptions) -> Result<ScanReport, ScanError> {
    let exclude_globs = walker::build_globset(&options.exclude_globs)?;
    let root = resolve_root(&options.root)?;
    info!(root = %root.display(), "Starting scan...");

    let walk_options = WalkOptions {
        exclusions: options.exclusions.clone(),
        exclude_globs,
        include_hidden: options.include_hidden,
    };
    let mut walk = walker::walk(&root, &walk_options);
    let mut projects: Vec<_> = walk
        .by_ref()
        .filter_map(|candidate| identifier::identify(&candidate))
        .collect();
    let directories_visited = walk.visited();
    let (file_type_histogram, warnings) = walk.finish();
    info!(
        directories = directories_visited,
        projects = projects.len(),
        warnings = warnings.len(),
        "Walk complete."
    );

    let duplicate_groups = grouper::group_duplicates(&projects);
    scorer::score_projects(&mut projects);

    let report = reporter::build_report(ReportInput {
        root,
        directories_visited,
        projects,
        duplicate_groups,
        file_type_histogram,
        warnings,
        undocumented_threshold: options.undocumented_threshold,
    });
    info!(
        projects = report.total_projects,
        duplicate_groups = report.duplicate_groups.len(),
        undocumented = report.undocumented.len(),
        "Scan complete."
    );
    Ok(report)
}

fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let not_found = |reason: String| ScanError::RootNotFound {
        path: root.to_path_buf(),
        reason,
    };
    let canonical = root.canonicalize().map_err(|e| not_found(e.to_string()))?;
    if !canonical.is_dir() {
        return Err(not_found("not a directory".to_string()));
    }
    fs::read_dir(&canonical).map_err(|e| not_found(e.to_string()))?;
    Ok(canonical)
}
