use crate::models::{DuplicateGroup, Project, ScanReport, ScanWarning};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything the earlier stages produced, handed to [`build_report`].
#[derive(Debug)]
pub struct ReportInput {
    pub root: PathBuf,
    pub directories_visited: usize,
    pub projects: Vec<Project>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub file_type_histogram: BTreeMap<String, usize>,
    pub warnings: Vec<ScanWarning>,
    pub undocumented_threshold: u8,
}

pub fn build_report(input: ReportInput) -> ScanReport {
    let ReportInput {
        root,
        directories_visited,
        mut projects,
        duplicate_groups,
        file_type_histogram,
        warnings,
        undocumented_threshold,
    } = input;
    projects.sort_by(|a, b| a.path.cmp(&b.path));

    let mut tag_histogram = BTreeMap::new();
    let mut kind_histogram = BTreeMap::new();
    let mut score_distribution = BTreeMap::new();
    for project in &projects {
        for tag in &project.tags {
            *tag_histogram.entry(tag.clone()).or_insert(0) += 1;
        }
        *kind_histogram.entry(project.kind).or_insert(0) += 1;
        *score_distribution.entry(project.health_score).or_insert(0) += 1;
    }

    let undocumented = projects
        .iter()
        .filter(|p| p.health_score < undocumented_threshold)
        .map(|p| p.path.clone())
        .collect();

    ScanReport {
        root,
        directories_visited,
        total_projects: projects.len(),
        total_size_bytes: projects.iter().map(|p| p.size_bytes).sum(),
        projects_with_git: projects.iter().filter(|p| p.flags.has_git).count(),
        projects_with_docker: projects.iter().filter(|p| p.flags.has_docker).count(),
        undocumented_threshold,
        projects,
        duplicate_groups,
        undocumented,
        tag_histogram,
        kind_histogram,
        score_distribution,
        file_type_histogram,
        warnings,
    }
}
