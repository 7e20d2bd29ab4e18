//! Walks a directory tree and yields every directory as a project candidate.
//!
//! Traversal is depth-first in file-name order, never follows symlinks and
//! prunes excluded subtrees before descending into them.

use crate::error::ScanError;
use crate::models::{ProjectCandidate, ScanWarning};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Directory names whose whole subtree is skipped.
    pub exclusions: BTreeSet<String>,
    /// Matched against both the directory name and its full path.
    pub exclude_globs: GlobSet,
    pub include_hidden: bool,
}

type EntryFilter = Box<dyn FnMut(&DirEntry) -> bool + Send>;

/// Lazy walk over candidate directories. Unreadable directories are skipped
/// and remembered as warnings, once per path.
pub struct Walk {
    root: PathBuf,
    entries: walkdir::FilterEntry<walkdir::IntoIter, EntryFilter>,
    file_types: BTreeMap<String, usize>,
    warnings: Vec<ScanWarning>,
    warned: HashSet<PathBuf>,
    visited: usize,
}

pub fn walk(root: &Path, options: &WalkOptions) -> Walk {
    let options = options.clone();
    let filter: EntryFilter =
        Box::new(move |entry: &DirEntry| entry.depth() == 0 || should_descend(entry, &options));
    let entries = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(filter);
    Walk {
        root: root.to_path_buf(),
        entries,
        file_types: BTreeMap::new(),
        warnings: Vec::new(),
        warned: HashSet::new(),
        visited: 0,
    }
}

impl Walk {
    /// Number of directories reached so far, readable or not.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Extension histogram over the files of every directory yielded so far.
    pub fn file_types(&self) -> &BTreeMap<String, usize> {
        &self.file_types
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Consumes the walk, returning the extension histogram and the warnings.
    pub fn finish(self) -> (BTreeMap<String, usize>, Vec<ScanWarning>) {
        (self.file_types, self.warnings)
    }

    fn count_file_types(&mut self, files: &BTreeSet<String>) {
        for name in files {
            *self.file_types.entry(file_extension(name)).or_insert(0) += 1;
        }
    }

    fn record_unreadable(&mut self, path: &Path, err: &dyn Display) {
        if !self.warned.insert(path.to_path_buf()) {
            return;
        }
        warn!(path = %path.display(), error = %err, "skipping unreadable directory");
        self.warnings.push(ScanWarning::DirectoryUnreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }
}

impl Iterator for Walk {
    type Item = ProjectCandidate;

    fn next(&mut self) -> Option<ProjectCandidate> {
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    self.visited += 1;
                    match read_children(entry.path()) {
                        Ok((files, dirs)) => {
                            self.count_file_types(&files);
                            let relative_path = match entry.path().strip_prefix(&self.root) {
                                Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
                                _ => PathBuf::from("."),
                            };
                            return Some(ProjectCandidate {
                                path: entry.path().to_path_buf(),
                                relative_path,
                                depth: entry.depth(),
                                files,
                                dirs,
                            });
                        }
                        Err(err) => self.record_unreadable(entry.path(), &err),
                    }
                }
                Err(err) => match err.path().map(Path::to_path_buf) {
                    Some(path) => self.record_unreadable(&path, &err),
                    None => warn!(error = %err, "walk error"),
                },
            }
        }
    }
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|source| ScanError::InvalidExclusion {
            pattern: pat.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ScanError::InvalidExclusion {
        pattern: patterns.join(","),
        source,
    })
}

fn should_descend(entry: &DirEntry, options: &WalkOptions) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let path = entry.path();
    if is_excluded(path, options) {
        debug!(path = %path.display(), "excluded");
        return false;
    }
    if !options.include_hidden && is_hidden(path) {
        return false;
    }
    true
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_excluded(path: &Path, options: &WalkOptions) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy();
    let name: &str = &name;
    options.exclusions.contains(name)
        || options.exclude_globs.is_match(name)
        || options.exclude_globs.is_match(path)
}

/// Lowercased extension with its dot, or an empty string. Dotfiles such as
/// `.gitignore` have no extension.
pub fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn read_children(dir: &Path) -> std::io::Result<(BTreeSet<String>, BTreeSet<String>)> {
    let mut files = BTreeSet::new();
    let mut dirs = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() {
            dirs.insert(name);
        } else {
            files.insert(name);
        }
    }
    Ok((files, dirs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(root: &Path, options: &WalkOptions) -> Vec<PathBuf> {
        walk(root, options)
            .map(|c| c.path.strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn visits_directories_depth_first_in_name_order() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("b/inner")).unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("a/file.txt"), "x").unwrap();

        let visited = names(temp.path(), &WalkOptions::default());
        assert_eq!(
            visited,
            vec![
                PathBuf::new(),
                PathBuf::from("a"),
                PathBuf::from("b"),
                PathBuf::from("b/inner"),
            ]
        );
    }

    #[test]
    fn candidate_lists_immediate_children() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("tests")).unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();

        let root = walk(temp.path(), &WalkOptions::default()).next().unwrap();
        assert_eq!(root.depth, 0);
        assert!(root.has_file("package.json"));
        assert!(root.has_dir("tests"));
        assert!(!root.has_file("tests"));
    }

    #[test]
    fn excluded_names_prune_whole_subtree() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("node_modules/left-pad")).unwrap();
        fs::create_dir_all(temp.path().join("app")).unwrap();

        let options = WalkOptions {
            exclusions: ["node_modules".to_string()].into_iter().collect(),
            ..WalkOptions::default()
        };
        let visited = names(temp.path(), &options);
        assert!(visited.contains(&PathBuf::from("app")));
        assert!(!visited.iter().any(|p| p.starts_with("node_modules")));
    }

    #[test]
    fn hidden_directories_skipped_unless_requested() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(".cache/nested")).unwrap();

        let visited = names(temp.path(), &WalkOptions::default());
        assert_eq!(visited, vec![PathBuf::new()]);

        let options = WalkOptions {
            include_hidden: true,
            ..WalkOptions::default()
        };
        let visited = names(temp.path(), &options);
        assert!(visited.contains(&PathBuf::from(".cache/nested")));
    }

    #[test]
    fn glob_exclusions_match_directory_names() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("old-archive")).unwrap();
        fs::create_dir_all(temp.path().join("current")).unwrap();

        let options = WalkOptions {
            exclude_globs: build_globset(&["*-archive".to_string()]).unwrap(),
            ..WalkOptions::default()
        };
        let visited = names(temp.path(), &options);
        assert!(visited.contains(&PathBuf::from("current")));
        assert!(!visited.contains(&PathBuf::from("old-archive")));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = build_globset(&["[unclosed".to_string()]).unwrap_err();
        assert!(matches!(err, ScanError::InvalidExclusion { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("real/nested")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("link")).unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("real/loop")).unwrap();

        let visited = names(temp.path(), &WalkOptions::default());
        assert!(visited.contains(&PathBuf::from("real/nested")));
        assert!(!visited.iter().any(|p| p.starts_with("link")));
        assert!(!visited.iter().any(|p| p.ends_with("loop")));
    }

    #[test]
    fn visited_counts_every_directory() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b/c")).unwrap();

        let mut walker = walk(temp.path(), &WalkOptions::default());
        let count = walker.by_ref().count();
        assert_eq!(count, 4);
        assert_eq!(walker.visited(), 4);
        assert!(walker.warnings().is_empty());
    }

    #[test]
    fn candidates_carry_root_relative_paths() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("clients/acme")).unwrap();

        let relative: Vec<_> = walk(temp.path(), &WalkOptions::default())
            .map(|c| c.relative_path)
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("."),
                PathBuf::from("clients"),
                PathBuf::from("clients/acme"),
            ]
        );
    }

    #[test]
    fn file_types_counted_for_walked_directories_only() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::create_dir_all(temp.path().join("node_modules/dep")).unwrap();
        fs::write(temp.path().join("README.MD"), "").unwrap();
        fs::write(temp.path().join("Makefile"), "").unwrap();
        fs::write(temp.path().join(".gitignore"), "").unwrap();
        fs::write(temp.path().join("src/main.rs"), "").unwrap();
        fs::write(temp.path().join("src/lib.rs"), "").unwrap();
        fs::write(temp.path().join("node_modules/dep/index.js"), "").unwrap();

        let options = WalkOptions {
            exclusions: ["node_modules".to_string()].into_iter().collect(),
            ..WalkOptions::default()
        };
        let mut walker = walk(temp.path(), &options);
        walker.by_ref().for_each(drop);
        let (file_types, warnings) = walker.finish();
        assert!(warnings.is_empty());
        assert_eq!(file_types[".rs"], 2);
        assert_eq!(file_types[".md"], 1);
        assert_eq!(file_types[""], 2);
        assert!(!file_types.contains_key(".js"));
    }

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(file_extension("App.CSPROJ"), ".csproj");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension(".env"), "");
        assert_eq!(file_extension("LICENSE"), "");
    }

    #[test]
    fn unreadable_paths_warn_once() {
        let temp = tempdir().unwrap();
        let mut walker = walk(temp.path(), &WalkOptions::default());
        let locked = temp.path().join("locked");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");

        walker.record_unreadable(&locked, &denied);
        walker.record_unreadable(&locked, &"walkdir: same path again");
        walker.record_unreadable(&temp.path().join("other"), &denied);

        let warnings = walker.warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].path(), locked.as_path());
        assert_eq!(
            warnings[0].to_string(),
            format!("unreadable directory {}: Permission denied", locked.display())
        );
    }
}
