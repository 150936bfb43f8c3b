//! Tag set membership predicates.
//!
//! Comparison is exact, case-sensitive string match — tags are matched
//! bit-exact against how they were stored.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a set of query tags is evaluated against a memory's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagMatch {
    /// At least one query tag present (non-empty intersection).
    Any,
    /// Every query tag present (query set is a subset of the memory's tags).
    All,
}

impl TagMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::All => "ALL",
        }
    }
}

impl std::fmt::Display for TagMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags as accepted on the wire: either a JSON list of strings or a single
/// comma-separated string. Normalized to a list before any other processing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    /// Normalize to a plain list. CSV entries are trimmed; empties dropped.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(tags) => tags,
            Self::Csv(csv) => csv
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl Default for TagsInput {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// Evaluate the tag predicate.
///
/// Contract: `query_tags` must be non-empty — callers validate before
/// reaching this point.
pub fn matches(memory_tags: &[String], query_tags: &[String], mode: TagMatch) -> bool {
    debug_assert!(!query_tags.is_empty(), "query_tags must not be empty");
    match mode {
        TagMatch::Any => query_tags.iter().any(|t| memory_tags.contains(t)),
        TagMatch::All => query_tags.iter().all(|t| memory_tags.contains(t)),
    }
}

/// The query tags actually present on the memory, in query order.
/// Used to build human-readable relevance reasons.
pub fn matched_tags(memory_tags: &[String], query_tags: &[String]) -> Vec<String> {
    query_tags
        .iter()
        .filter(|t| memory_tags.contains(t))
        .cloned()
        .collect()
}
