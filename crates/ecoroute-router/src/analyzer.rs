// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-based query analysis.
//!
//! Produces a [`QueryProfile`] from raw query text using fixed keyword sets.
//! No model call, no network, never fails.
//!
//! Words are the distinct lower-cased whitespace-separated tokens of the
//! query. Duplicates collapse: "sort sort sort" is one word, and both the
//! 5% code ratio and the 20-word complexity cutoff are measured against
//! distinct words.

use std::collections::{BTreeMap, HashSet};

use ecoroute_core::{QueryProfile, TaskKind};

/// Code keyword matches above this fraction of distinct words mark a code query.
const CODE_RATIO_THRESHOLD: f64 = 0.05;

/// More distinct words than this makes a query complex on its own.
const COMPLEX_WORD_COUNT: usize = 20;

const COMPLEX_KEYWORDS: &[&str] = &[
    "analyze",
    "explain",
    "compare",
    "evaluate",
    "synthesize",
    "technical",
    "detailed",
    "in-depth",
    "comprehensive",
];

const CODE_GENERAL: &[&str] = &[
    "code", "program", "function", "class", "algorithm", "implement", "debug", "fix", "error",
    "bug", "compile", "runtime", "syntax",
];

const CODE_LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "c++",
    "cpp",
    "rust",
    "go",
    "html",
    "css",
    "sql",
    "php",
    "swift",
    "kotlin",
];

const CODE_CONCEPTS: &[&str] = &[
    "array",
    "string",
    "list",
    "dictionary",
    "hash",
    "tree",
    "graph",
    "stack",
    "queue",
    "recursion",
    "iteration",
    "loop",
    "sort",
    "search",
    "binary",
    "api",
    "async",
    "promise",
    "callback",
    "object",
    "class",
];

const TASK_GENERAL: &[&str] = &["what", "who", "when", "where", "tell", "describe"];
const TASK_ANALYSIS: &[&str] = &["why", "how", "analyze", "explain", "compare"];
const TASK_QA: &[&str] = &["what is", "define", "meaning of", "difference between"];
/// Names of the code vocabulary categories. Real code queries reach
/// `TaskKind::Code` through the code detector, not through task scoring.
const TASK_CODE: &[&str] = &["general", "languages", "concepts"];

/// Keyword sets driving the analyzer.
///
/// Code keywords are matched as whole words; task keywords are matched as
/// substrings of each word, so a multi-word task keyword such as
/// `"what is"` can never match a single whitespace-free token.
#[derive(Debug, Clone)]
pub struct KeywordSets {
    pub complex: HashSet<String>,
    pub code_general: HashSet<String>,
    pub code_languages: HashSet<String>,
    pub code_concepts: HashSet<String>,
    /// Substring keywords per task, scored in `TaskKind` order.
    pub tasks: BTreeMap<TaskKind, Vec<String>>,
}

fn owned_set(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn owned_vec(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for KeywordSets {
    fn default() -> Self {
        Self {
            complex: owned_set(COMPLEX_KEYWORDS),
            code_general: owned_set(CODE_GENERAL),
            code_languages: owned_set(CODE_LANGUAGES),
            code_concepts: owned_set(CODE_CONCEPTS),
            tasks: BTreeMap::from([
                (TaskKind::General, owned_vec(TASK_GENERAL)),
                (TaskKind::Analysis, owned_vec(TASK_ANALYSIS)),
                (TaskKind::Code, owned_vec(TASK_CODE)),
                (TaskKind::Qa, owned_vec(TASK_QA)),
            ]),
        }
    }
}

/// Classifies query text into a capability and complexity profile.
#[derive(Debug, Clone, Default)]
pub struct QueryAnalyzer {
    keywords: KeywordSets,
}

impl QueryAnalyzer {
    pub fn new(keywords: KeywordSets) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &KeywordSets {
        &self.keywords
    }

    /// Profile `text`. Empty or whitespace-only input yields `word_count == 0`.
    pub fn analyze(&self, text: &str) -> QueryProfile {
        let lowered = text.to_lowercase();
        let words: HashSet<&str> = lowered.split_whitespace().collect();
        if words.is_empty() {
            return QueryProfile::empty();
        }

        let hits = |set: &HashSet<String>| words.iter().filter(|w| set.contains(**w)).count();
        let language_hits = hits(&self.keywords.code_languages);
        // A keyword listed in two categories counts once per category.
        let code_hits =
            hits(&self.keywords.code_general) + language_hits + hits(&self.keywords.code_concepts);
        let code_score = code_hits as f64 / words.len() as f64;
        let is_code = language_hits > 0 || code_score > CODE_RATIO_THRESHOLD;

        let mut is_complex = words.iter().any(|w| self.keywords.complex.contains(*w))
            || words.len() > COMPLEX_WORD_COUNT;

        let task_scores: BTreeMap<TaskKind, usize> = TaskKind::ALL
            .iter()
            .map(|task| {
                let keywords = self
                    .keywords
                    .tasks
                    .get(task)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let score = words
                    .iter()
                    .filter(|w| keywords.iter().any(|kw| w.contains(kw.as_str())))
                    .count();
                (*task, score)
            })
            .collect();

        let mut capability_hint = best_task(&task_scores);
        if is_code {
            capability_hint = TaskKind::Code;
            is_complex = true;
        }

        QueryProfile {
            is_complex,
            capability_hint,
            task_scores,
            word_count: words.len(),
            is_code,
            code_score,
        }
    }
}

/// Highest-scoring task; on a tie the earliest in `TaskKind` order wins.
fn best_task(scores: &BTreeMap<TaskKind, usize>) -> TaskKind {
    let mut best = (TaskKind::General, 0);
    for (task, score) in scores {
        if *score > best.1 {
            best = (*task, *score);
        }
    }
    best.0
}
