//! Clusters projects that look like copies of one another.
//!
//! Two projects are joined when their normalized directory names are equal,
//! or, failing that, when their immediate child sets are identical and their
//! names share a prefix of at least [`MIN_SHARED_PREFIX`] characters. Joins
//! are transitive, so the result is a partition of the duplicated projects.
//! The heuristic is advisory only.

use crate::models::{DuplicateGroup, Project, SimilarityBasis};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub const MIN_SHARED_PREFIX: usize = 4;

/// Trailing tokens that usually mark a copy rather than a different project.
const NOISE_TOKENS: &[&str] = &[
    "main", "master", "copy", "backup", "bak", "old", "new", "final", "v",
];

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '_' | ' ' | '.' | '(' | ')')
}

/// Lowercases, strips copy and version suffixes until stable, then drops
/// separators. Falls back to the lowercased name if nothing would be left.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let mut current = lowered.as_str();
    loop {
        let next = strip_suffix_once(current);
        if next.len() == current.len() {
            break;
        }
        current = next;
    }
    let normalized: String = current.chars().filter(|c| !is_separator(*c)).collect();
    if normalized.is_empty() {
        lowered
    } else {
        normalized
    }
}

fn strip_suffix_once(s: &str) -> &str {
    let trimmed = s.trim_end_matches(|c: char| c.is_ascii_digit() || is_separator(c));
    if trimmed.len() != s.len() {
        return trimmed;
    }
    if let Some(idx) = s.rfind(is_separator) {
        if NOISE_TOKENS.contains(&&s[idx + 1..]) {
            return &s[..idx];
        }
    }
    s
}

fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .flat_map(char::to_lowercase)
        .zip(b.chars().flat_map(char::to_lowercase))
        .take_while(|(x, y)| x == y)
        .count()
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

pub fn group_duplicates(projects: &[Project]) -> Vec<DuplicateGroup> {
    let normalized: Vec<String> = projects.iter().map(|p| normalize_name(&p.name)).collect();
    let mut sets = UnionFind::new(projects.len());
    let mut edges: Vec<(usize, SimilarityBasis)> = Vec::new();

    let mut by_name: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, key) in normalized.iter().enumerate() {
        by_name.entry(key.as_str()).or_default().push(idx);
    }
    for members in by_name.values() {
        for &other in &members[1..] {
            sets.union(members[0], other);
            edges.push((members[0], SimilarityBasis::MatchingName));
        }
    }

    let mut by_fingerprint: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, project) in projects.iter().enumerate() {
        by_fingerprint
            .entry(project.fingerprint.as_str())
            .or_default()
            .push(idx);
    }
    for members in by_fingerprint.values() {
        for (pos, &a) in members.iter().enumerate() {
            for &b in &members[pos + 1..] {
                // the name rule already decided this pair
                if normalized[a] == normalized[b] {
                    continue;
                }
                if shared_prefix_len(&projects[a].name, &projects[b].name) >= MIN_SHARED_PREFIX {
                    sets.union(a, b);
                    edges.push((a, SimilarityBasis::MatchingFingerprint));
                }
            }
        }
    }

    let mut members_by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    for idx in 0..projects.len() {
        members_by_root.entry(sets.find(idx)).or_default().push(idx);
    }
    let mut basis_by_root: HashMap<usize, SimilarityBasis> = HashMap::new();
    for (idx, basis) in edges {
        let root = sets.find(idx);
        basis_by_root
            .entry(root)
            .and_modify(|b| {
                if *b != basis {
                    *b = SimilarityBasis::Mixed;
                }
            })
            .or_insert(basis);
    }

    let mut groups: Vec<DuplicateGroup> = members_by_root
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(root, members)| {
            let mut paths: Vec<_> = members.iter().map(|&i| projects[i].path.clone()).collect();
            paths.sort();
            DuplicateGroup {
                members: paths,
                basis: basis_by_root
                    .get(&root)
                    .copied()
                    .unwrap_or(SimilarityBasis::MatchingName),
            }
        })
        .collect();
    groups.sort_by(|a, b| a.members.cmp(&b.members));
    debug!(groups = groups.len(), "duplicate grouping done");
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MarkerFlags, ProjectKind};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn project(path: &str, fingerprint: &str) -> Project {
        let path = PathBuf::from(path);
        Project {
            name: path.file_name().unwrap().to_string_lossy().into_owned(),
            relative_path: PathBuf::from(path.file_name().unwrap()),
            path,
            kind: ProjectKind::Unknown,
            tags: BTreeSet::new(),
            size_bytes: 0,
            flags: MarkerFlags::default(),
            health_score: 40,
            fingerprint: fingerprint.to_string(),
            depth: 1,
            last_modified: None,
        }
    }

    #[test]
    fn normalization_strips_copy_and_version_suffixes() {
        assert_eq!(normalize_name("foo-main"), "foo");
        assert_eq!(normalize_name("foo-main2"), "foo");
        assert_eq!(normalize_name("Foo-Copy"), "foo");
        assert_eq!(normalize_name("foo (copy)"), "foo");
        assert_eq!(normalize_name("foo-v2.0.3"), "foo");
        assert_eq!(normalize_name("foo_v2-backup"), "foo");
        assert_eq!(normalize_name("xpress-delivery-3"), "xpressdelivery");
        assert_eq!(normalize_name("my_app"), normalize_name("my-app"));
    }

    #[test]
    fn normalization_never_returns_empty() {
        assert_eq!(normalize_name("2023"), "2023");
        assert_eq!(normalize_name("main"), "main");
    }

    #[test]
    fn name_rule_groups_siblings() {
        let projects = vec![
            project("/r/foo-main", "a"),
            project("/r/foo-main2", "b"),
            project("/r/bar", "c"),
        ];
        let groups = group_duplicates(&projects);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].members,
            vec![PathBuf::from("/r/foo-main"), PathBuf::from("/r/foo-main2")]
        );
        assert_eq!(groups[0].basis, SimilarityBasis::MatchingName);
    }

    #[test]
    fn fingerprint_rule_needs_shared_prefix() {
        let projects = vec![
            project("/r/dashboard-react", "same"),
            project("/r/dashboard-vue", "same"),
            project("/r/api", "same"),
        ];
        let groups = group_duplicates(&projects);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 2);
        assert!(!groups[0].members.contains(&PathBuf::from("/r/api")));
        assert_eq!(groups[0].basis, SimilarityBasis::MatchingFingerprint);
    }

    #[test]
    fn grouping_is_transitive() {
        // a~b by name, b~c by fingerprint: one group of three
        let projects = vec![
            project("/r/shop-old", "x"),
            project("/x/shop", "y"),
            project("/r/shopfront", "y"),
        ];
        let groups = group_duplicates(&projects);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 3);
        assert_eq!(groups[0].basis, SimilarityBasis::Mixed);
    }

    #[test]
    fn groups_partition_and_exclude_singletons() {
        let projects = vec![
            project("/r/a-copy", "1"),
            project("/r/a", "2"),
            project("/r/b-final", "3"),
            project("/r/b", "4"),
            project("/r/unique", "5"),
        ];
        let groups = group_duplicates(&projects);
        assert_eq!(groups.len(), 2);
        let mut seen = BTreeSet::new();
        for g in &groups {
            assert!(g.members.len() >= 2);
            for m in &g.members {
                assert!(seen.insert(m.clone()), "{} in two groups", m.display());
            }
        }
        assert!(!seen.contains(&PathBuf::from("/r/unique")));
    }

    #[test]
    fn shared_prefix_is_case_insensitive() {
        assert_eq!(shared_prefix_len("Zenith", "zenbook"), 3);
        assert_eq!(shared_prefix_len("Zenith-api", "zenith-web"), 7);
    }
}
