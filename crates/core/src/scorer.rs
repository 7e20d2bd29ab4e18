//! Advisory health score from marker flags.

use crate::models::{MarkerFlags, Project};

/// Score given when no rule above the floor applies.
pub const FLOOR_SCORE: u8 = 40;

pub struct ScoreRule {
    pub name: &'static str,
    pub score: u8,
    applies: fn(&MarkerFlags) -> bool,
}

/// Evaluated top to bottom, first match wins. The last rule always applies.
pub const RULES: &[ScoreRule] = &[
    ScoreRule {
        name: "readme, tests and docs",
        score: 90,
        applies: |f| f.has_readme && f.has_tests && f.has_docs,
    },
    ScoreRule {
        name: "readme with tests or docs",
        score: 75,
        applies: |f| f.has_readme && (f.has_tests || f.has_docs),
    },
    ScoreRule {
        name: "readme only",
        score: 60,
        applies: |f| f.has_readme,
    },
    ScoreRule {
        name: "tests only",
        score: 50,
        applies: |f| f.has_tests,
    },
    ScoreRule {
        name: "floor",
        score: FLOOR_SCORE,
        applies: |_| true,
    },
];

pub fn matching_rule(flags: &MarkerFlags) -> &'static ScoreRule {
    RULES
        .iter()
        .find(|r| (r.applies)(flags))
        .unwrap_or(&RULES[RULES.len() - 1])
}

pub fn health_score(flags: &MarkerFlags) -> u8 {
    matching_rule(flags).score.min(100)
}

pub fn score_projects(projects: &mut [Project]) {
    for project in projects {
        project.health_score = health_score(&project.flags);
    }
}
