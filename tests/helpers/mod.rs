#![allow(dead_code)]

use chrono::{Duration, Local};
use mnemo::config::QueryConfig;
use mnemo::embedding::hashed::HashedEmbedding;
use mnemo::memory::types::Memory;
use mnemo::service::{MemoryService, StoreRequest};
use mnemo::storage::sqlite::SqliteVecStorage;
use mnemo::storage::MemoryStorage;
use serde_json::Map;
use std::sync::Arc;

/// Fresh in-memory storage plus a service over it. The storage handle lets
/// tests plant rows directly (e.g. back-dated memories).
pub fn test_stack() -> (Arc<SqliteVecStorage>, MemoryService) {
    let storage =
        Arc::new(SqliteVecStorage::in_memory(Arc::new(HashedEmbedding::new())).unwrap());
    let dyn_storage: Arc<dyn MemoryStorage> = storage.clone();
    let service = MemoryService::new(dyn_storage, QueryConfig::default());
    (storage, service)
}

pub fn test_service() -> MemoryService {
    test_stack().1
}

/// Store through the service and return the content hash.
pub fn store(
    service: &MemoryService,
    content: &str,
    tags: &[&str],
    memory_type: Option<&str>,
) -> String {
    let outcome = service.store(StoreRequest {
        content: content.into(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        memory_type: memory_type.map(str::to_string),
        ..StoreRequest::default()
    });
    assert!(outcome.success, "store failed: {}", outcome.message);
    outcome.content_hash.unwrap()
}

/// A memory whose creation timestamp lies `days_ago` full days in the past.
/// Planted directly into storage, bypassing the service.
pub fn backdated_memory(content: &str, days_ago: i64) -> Memory {
    let mut memory = Memory::new(content, vec![], None, Map::new());
    let ts = (Local::now() - Duration::days(days_ago)).timestamp() as f64;
    memory.created_at = ts;
    memory.updated_at = ts;
    memory
}
