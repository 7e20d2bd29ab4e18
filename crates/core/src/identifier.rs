//! Decides whether a candidate directory is a project root and what it is built with.

use crate::models::{MarkerFlags, Project, ProjectCandidate, ProjectKind};
use crate::scorer;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Any one of these promotes a candidate to a project.
const STRONG_MARKERS: &[&str] = &[
    "package.json",
    "requirements.txt",
    ".git",
    "Dockerfile",
    "setup.py",
    "pyproject.toml",
    "Pipfile",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "composer.json",
    "Gemfile",
];

const STRONG_SUFFIXES: &[&str] = &[".csproj", ".sln"];

/// Filename suffix -> tags, for markers named after the project.
const SUFFIX_TAGS: &[(&str, &[&str])] = &[(".csproj", &[".NET", "C#"]), (".sln", &[".NET"])];

const TAG_TABLE: &[(&str, &[&str])] = &[
    ("package.json", &["Node.js", "JavaScript"]),
    ("requirements.txt", &["Python"]),
    ("setup.py", &["Python"]),
    ("pyproject.toml", &["Python"]),
    ("Pipfile", &["Python"]),
    ("Dockerfile", &["Docker"]),
    ("docker-compose.yml", &["Docker Compose"]),
    ("docker-compose.yaml", &["Docker Compose"]),
    ("Cargo.toml", &["Rust"]),
    ("go.mod", &["Go"]),
    ("pom.xml", &["Java", "Maven"]),
    ("build.gradle", &["Java", "Gradle"]),
    ("composer.json", &["PHP"]),
    ("Gemfile", &["Ruby"]),
];

/// package.json dependency key -> framework tag.
const FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue"),
    ("angular", "Angular"),
    ("@angular/core", "Angular"),
    ("next", "Next.js"),
    ("express", "Express"),
];

const DOC_FILES: &[&str] = &["DOCUMENTATION.md", "CONTRIBUTING.md", "CHANGELOG.md"];
const CI_FILES: &[&str] = &[
    ".gitlab-ci.yml",
    ".travis.yml",
    "Jenkinsfile",
    "azure-pipelines.yml",
];

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

pub fn is_project_root(candidate: &ProjectCandidate) -> bool {
    STRONG_MARKERS.iter().any(|m| candidate.has_child(m))
        || candidate
            .files
            .iter()
            .any(|f| STRONG_SUFFIXES.iter().any(|s| f.ends_with(s)))
}

/// Promotes a candidate to a [`Project`], or returns `None` when no strong
/// marker is present. The health score starts at the floor; the scoring
/// stage fills in the real value.
pub fn identify(candidate: &ProjectCandidate) -> Option<Project> {
    if !is_project_root(candidate) {
        return None;
    }
    let path = candidate.path.as_path();
    let tags = detect_tags(candidate);
    let kind = kind_for_tags(&tags);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!(path = %path.display(), %kind, "project root");

    Some(Project {
        path: path.to_path_buf(),
        relative_path: candidate.relative_path.clone(),
        name,
        kind,
        tags,
        size_bytes: directory_size(path),
        flags: marker_flags(candidate),
        health_score: scorer::FLOOR_SCORE,
        fingerprint: fingerprint(candidate),
        depth: candidate.depth,
        last_modified: last_modified(path),
    })
}

pub fn marker_flags(candidate: &ProjectCandidate) -> MarkerFlags {
    let path = candidate.path.as_path();
    MarkerFlags {
        has_git: candidate.has_child(".git"),
        has_docker: candidate.has_file("Dockerfile")
            || candidate.has_file("docker-compose.yml")
            || candidate.has_file("docker-compose.yaml"),
        has_readme: candidate
            .files
            .iter()
            .any(|f| f.to_ascii_lowercase().starts_with("readme")),
        has_tests: ["tests", "test"]
            .iter()
            .any(|d| candidate.has_dir(d) && contains_file(&path.join(d))),
        has_docs: candidate.has_dir("docs") || DOC_FILES.iter().any(|f| candidate.has_file(f)),
        has_ci: CI_FILES.iter().any(|f| candidate.has_file(f))
            || candidate.has_dir(".circleci")
            || (candidate.has_dir(".github") && path.join(".github/workflows").is_dir()),
    }
}

pub fn detect_tags(candidate: &ProjectCandidate) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    for (marker, marker_tags) in TAG_TABLE {
        if candidate.has_file(marker) {
            tags.extend(marker_tags.iter().map(|t| t.to_string()));
        }
    }
    for (suffix, suffix_tags) in SUFFIX_TAGS {
        if candidate.files.iter().any(|f| f.ends_with(suffix)) {
            tags.extend(suffix_tags.iter().map(|t| t.to_string()));
        }
    }
    if candidate.has_file("package.json") {
        tags.extend(
            package_frameworks(&candidate.path.join("package.json"))
                .into_iter()
                .map(str::to_string),
        );
    }
    tags
}

/// Framework tags from package.json dependencies. Unreadable or malformed
/// manifests yield nothing.
fn package_frameworks(manifest_path: &Path) -> Vec<&'static str> {
    let content = match fs::read_to_string(manifest_path) {
        Ok(c) => c,
        Err(err) => {
            debug!(path = %manifest_path.display(), error = %err, "package.json unreadable");
            return Vec::new();
        }
    };
    let manifest: PackageManifest = match serde_json::from_str(&content) {
        Ok(m) => m,
        Err(err) => {
            debug!(path = %manifest_path.display(), error = %err, "package.json malformed");
            return Vec::new();
        }
    };
    let mut found = Vec::new();
    for (dep, tag) in FRAMEWORKS {
        let declared = manifest.dependencies.contains_key(*dep)
            || manifest.dev_dependencies.contains_key(*dep);
        if declared && !found.contains(tag) {
            found.push(*tag);
        }
    }
    found
}

pub fn kind_for_tags(tags: &BTreeSet<String>) -> ProjectKind {
    let has = |t: &str| tags.contains(t);
    if ["React", "Vue", "Angular", "Next.js"].iter().any(|t| has(*t)) {
        ProjectKind::WebApplication
    } else if has("Express") {
        ProjectKind::ApiBackend
    } else if has("Python") {
        ProjectKind::PythonTool
    } else if has("Rust") {
        ProjectKind::RustCrate
    } else if has("Go") {
        ProjectKind::GoModule
    } else if has("Java") {
        ProjectKind::Jvm
    } else if has(".NET") {
        ProjectKind::DotNet
    } else if has("PHP") {
        ProjectKind::Php
    } else if has("Ruby") {
        ProjectKind::Ruby
    } else if has("Node.js") {
        ProjectKind::NodePackage
    } else if has("Docker") || has("Docker Compose") {
        ProjectKind::Container
    } else {
        ProjectKind::Unknown
    }
}

/// blake3 over the sorted immediate child names.
pub fn fingerprint(candidate: &ProjectCandidate) -> String {
    let names: BTreeSet<&str> = candidate.child_names().collect();
    let mut hasher = blake3::Hasher::new();
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
    }
    hasher.finalize().to_hex().to_string()
}

/// Recursive size of regular files. Entries that cannot be read count as zero.
pub fn directory_size(path: &Path) -> u64 {
    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "size: skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(meta) => total += meta.len(),
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "size: unreadable file counted as 0");
            }
        }
    }
    total
}

fn contains_file(dir: &Path) -> bool {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .any(|e| e.file_type().is_file())
}

fn last_modified(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}
