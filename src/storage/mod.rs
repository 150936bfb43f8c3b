//! Storage abstraction consumed by the query service.
//!
//! [`MemoryStorage`] is the backend-agnostic capability surface; concrete
//! backends implement it and are selected once at startup via
//! [`create_storage`]. Methods are synchronous — async front-ends call the
//! service through `tokio::task::spawn_blocking`.

pub mod sqlite;

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::embedding::EmbeddingProvider;
use crate::memory::tags::TagMatch;
use crate::memory::types::{Memory, MemoryQueryResult};

/// Backend-agnostic storage capability.
pub trait MemoryStorage: Send + Sync {
    /// Persist a memory. Returns `(success, message)`; storing a duplicate
    /// content hash is reported as `success = false`, not an error.
    fn store(&self, memory: &Memory) -> Result<(bool, String)>;

    /// Similarity search: the `n_results` nearest memories to `query`,
    /// already ranked best-first with scores in `[0, 1]`.
    fn retrieve(&self, query: &str, n_results: usize) -> Result<Vec<MemoryQueryResult>>;

    /// Memories carrying at least one of `tags` (ANY semantics).
    fn search_by_tag(&self, tags: &[String]) -> Result<Vec<Memory>> {
        self.search_by_tags(tags, TagMatch::Any)
    }

    /// Memories matching `tags` under the given combination mode.
    fn search_by_tags(&self, tags: &[String], mode: TagMatch) -> Result<Vec<Memory>>;

    /// Look up a single memory by content hash.
    fn get_by_hash(&self, content_hash: &str) -> Result<Option<Memory>>;

    /// Delete by content hash. Returns `(success, message)`; a missing hash
    /// is `success = false` with a "not found" message.
    fn delete(&self, content_hash: &str) -> Result<(bool, String)>;

    /// Page through all memories, newest first, with optional tag and
    /// type filters applied at the storage level.
    fn get_all_memories(
        &self,
        limit: Option<usize>,
        offset: usize,
        tags: Option<&[String]>,
        memory_type: Option<&str>,
    ) -> Result<Vec<Memory>>;

    /// Total number of stored memories.
    fn count_all_memories(&self) -> Result<usize>;

    /// Backend statistics as a loose JSON map. Field names vary per backend;
    /// the service normalizes them into one canonical shape.
    fn get_stats(&self) -> Result<Value>;

    /// Short backend identifier for health reporting.
    fn backend_name(&self) -> &'static str;
}

/// Build the configured storage backend. Resolved once at startup.
pub fn create_storage(
    config: &StorageConfig,
    embedding: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn MemoryStorage>> {
    match config.backend.as_str() {
        "sqlite_vec" => {
            let storage = sqlite::SqliteVecStorage::open(&config.resolved_db_path(), embedding)?;
            Ok(Arc::new(storage))
        }
        other => anyhow::bail!("unknown storage backend: {other}. Supported: sqlite_vec"),
    }
}
