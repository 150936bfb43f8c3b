//! Core memory type definitions.
//!
//! Defines [`Memory`] (the stored record, keyed by content hash) and
//! [`MemoryQueryResult`] (an ephemeral scored wrapper produced by searches).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::memory::hashing::generate_content_hash;

/// A memory record, matching the `memories` table schema.
///
/// The primary key is `content_hash`, a deterministic fingerprint of
/// `(content, metadata)` — two memories with identical content and metadata
/// collide to the same hash and are treated as duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// The full text content of the memory.
    pub content: String,
    /// SHA-256 fingerprint of `(content, metadata)`; primary key.
    pub content_hash: String,
    /// Category labels. No duplicates, no empty strings; insertion order kept.
    pub tags: Vec<String>,
    /// Optional free-form classification (e.g. `"note"`, `"decision"`, `"task"`).
    pub memory_type: Option<String>,
    /// Open key-value extension fields (e.g. hostname of the storing client).
    pub metadata: Map<String, Value>,
    /// Seconds since epoch. Immutable after creation.
    pub created_at: f64,
    /// Seconds since epoch. Bumped on any mutation; always `>= created_at`.
    pub updated_at: f64,
}

impl Memory {
    /// Build a new memory with a freshly computed content hash and timestamps.
    ///
    /// Tags are sanitized here: empty strings dropped, duplicates removed
    /// (case-sensitive exact match), first-seen order preserved.
    pub fn new(
        content: impl Into<String>,
        tags: Vec<String>,
        memory_type: Option<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        let content = content.into();
        let content_hash = generate_content_hash(&content, &metadata);
        let now = epoch_now();
        Self {
            content,
            content_hash,
            tags: sanitize_tags(tags),
            memory_type,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// ISO 8601 form of `created_at`.
    pub fn created_at_iso(&self) -> String {
        iso_from_epoch(self.created_at)
    }

    /// ISO 8601 form of `updated_at`.
    pub fn updated_at_iso(&self) -> String {
        iso_from_epoch(self.updated_at)
    }
}

/// A single scored search result. Ephemeral — never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryQueryResult {
    pub memory: Memory,
    /// Similarity score in `[0, 1]`. `None` for pure tag matches.
    pub relevance_score: Option<f64>,
    /// Human-readable explanation of why this item matched.
    pub relevance_reason: Option<String>,
}

/// Current time as fractional seconds since the Unix epoch.
pub fn epoch_now() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_millis()) / 1000.0
}

/// Convert an epoch-seconds timestamp to an ISO 8601 string (UTC).
pub fn iso_from_epoch(ts: f64) -> String {
    let secs = ts.trunc() as i64;
    let nanos = ((ts.fract() * 1_000_000_000.0).round() as u32).min(999_999_999);
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is valid"))
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Drop empty tags and case-sensitive duplicates, keeping first-seen order.
pub fn sanitize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
