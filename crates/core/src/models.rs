use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// A directory visited during the walk, with the names of its immediate children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCandidate {
    pub path: PathBuf,
    /// Path below the scan root; `.` for the root itself.
    pub relative_path: PathBuf,
    pub depth: usize,
    pub files: BTreeSet<String>,
    pub dirs: BTreeSet<String>,
}

impl ProjectCandidate {
    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains(name)
    }

    pub fn has_dir(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    /// True when a child of either kind carries this name (`.git` can be a file in worktrees).
    pub fn has_child(&self, name: &str) -> bool {
        self.has_file(name) || self.has_dir(name)
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().chain(self.dirs.iter()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerFlags {
    pub has_git: bool,
    pub has_docker: bool,
    pub has_readme: bool,
    pub has_tests: bool,
    #[serde(default)]
    pub has_docs: bool,
    #[serde(default)]
    pub has_ci: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    WebApplication,
    ApiBackend,
    PythonTool,
    RustCrate,
    GoModule,
    Jvm,
    DotNet,
    Php,
    Ruby,
    NodePackage,
    Container,
    Unknown,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::WebApplication => "web_application",
            ProjectKind::ApiBackend => "api_backend",
            ProjectKind::PythonTool => "python_tool",
            ProjectKind::RustCrate => "rust_crate",
            ProjectKind::GoModule => "go_module",
            ProjectKind::Jvm => "jvm",
            ProjectKind::DotNet => "dot_net",
            ProjectKind::Php => "php",
            ProjectKind::Ruby => "ruby",
            ProjectKind::NodePackage => "node_package",
            ProjectKind::Container => "container",
            ProjectKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub path: PathBuf,
    #[serde(default)]
    pub relative_path: PathBuf,
    pub name: String,
    pub kind: ProjectKind,
    pub tags: BTreeSet<String>,
    pub size_bytes: u64,
    pub flags: MarkerFlags,
    pub health_score: u8,
    /// blake3 digest of the sorted immediate child names.
    pub fingerprint: String,
    pub depth: usize,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBasis {
    MatchingName,
    MatchingFingerprint,
    Mixed,
}

impl SimilarityBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityBasis::MatchingName => "matching directory name",
            SimilarityBasis::MatchingFingerprint => "matching immediate child file set",
            SimilarityBasis::Mixed => "matching name and child file set",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub members: Vec<PathBuf>,
    pub basis: SimilarityBasis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanWarning {
    DirectoryUnreadable { path: PathBuf, message: String },
}

impl ScanWarning {
    pub fn path(&self) -> &Path {
        match self {
            ScanWarning::DirectoryUnreadable { path, .. } => path,
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::DirectoryUnreadable { path, message } => {
                write!(f, "unreadable directory {}: {}", path.display(), message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub directories_visited: usize,
    pub total_projects: usize,
    pub total_size_bytes: u64,
    pub projects_with_git: usize,
    pub projects_with_docker: usize,
    pub undocumented_threshold: u8,
    pub projects: Vec<Project>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub undocumented: Vec<PathBuf>,
    pub tag_histogram: BTreeMap<String, usize>,
    pub kind_histogram: BTreeMap<ProjectKind, usize>,
    pub score_distribution: BTreeMap<u8, usize>,
    /// Lowercased file extension (`.rs`, or empty for none) -> files seen in
    /// every readable directory the walk visited.
    #[serde(default)]
    pub file_type_histogram: BTreeMap<String, usize>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    pub fn project(&self, path: &Path) -> Option<&Project> {
        self.projects.iter().find(|p| p.path == path)
    }

    /// The `limit` most common file extensions, most frequent first, ties by name.
    pub fn top_file_types(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut types: Vec<_> = self
            .file_type_histogram
            .iter()
            .map(|(ext, count)| (ext.as_str(), *count))
            .collect();
        types.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        types.truncate(limit);
        types
    }

    /// Index of the duplicate group containing `path`, if any.
    pub fn group_of(&self, path: &Path) -> Option<usize> {
        self.duplicate_groups
            .iter()
            .position(|g| g.members.iter().any(|m| m == path))
    }
}
