//! Canonical response shapes shared by every front-end.
//!
//! Two families: search-style (query-driven, scored) and list-style
//! (paginated). Front-ends serialize these directly; the MCP projection of a
//! listing renames `total` to `total_found` without touching order or
//! content.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::memory::types::{Memory, MemoryQueryResult};

/// A memory as presented to callers: timestamps in both numeric and ISO form.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryResponse {
    pub content: String,
    pub content_hash: String,
    pub tags: Vec<String>,
    pub memory_type: Option<String>,
    pub metadata: Map<String, Value>,
    pub created_at: f64,
    pub created_at_iso: String,
    pub updated_at: f64,
    pub updated_at_iso: String,
}

impl From<&Memory> for MemoryResponse {
    fn from(memory: &Memory) -> Self {
        Self {
            content: memory.content.clone(),
            content_hash: memory.content_hash.clone(),
            tags: memory.tags.clone(),
            memory_type: memory.memory_type.clone(),
            metadata: memory.metadata.clone(),
            created_at: memory.created_at,
            created_at_iso: memory.created_at_iso(),
            updated_at: memory.updated_at,
            updated_at_iso: memory.updated_at_iso(),
        }
    }
}

/// One scored entry in a search-style response.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub memory: MemoryResponse,
    pub similarity_score: Option<f64>,
    pub relevance_reason: Option<String>,
}

impl From<&MemoryQueryResult> for SearchResult {
    fn from(result: &MemoryQueryResult) -> Self {
        Self {
            memory: MemoryResponse::from(&result.memory),
            similarity_score: result.relevance_score,
            relevance_reason: result.relevance_reason.clone(),
        }
    }
}

/// Search-style response, used by semantic, tag, and time searches.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total_found: usize,
    pub query: String,
    pub search_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn success(
        results: Vec<SearchResult>,
        query: String,
        search_type: &'static str,
        processing_time_ms: f64,
    ) -> Self {
        Self {
            total_found: results.len(),
            results,
            query,
            search_type,
            processing_time_ms: Some(processing_time_ms),
            error: None,
        }
    }

    pub fn failure(query: String, search_type: &'static str, error: String) -> Self {
        Self {
            results: Vec::new(),
            total_found: 0,
            query,
            search_type,
            processing_time_ms: None,
            error: Some(error),
        }
    }
}

/// Similar-to response: the target memory plus its neighbors.
#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub target_memory: Option<MemoryResponse>,
    pub results: Vec<SearchResult>,
    pub total_found: usize,
    pub query: String,
    pub search_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

/// Outcome of a store operation.
#[derive(Debug, Serialize)]
pub struct StoreOutcome {
    pub success: bool,
    pub message: String,
    pub content_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryResponse>,
}

/// Outcome of a delete operation.
#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
    pub content_hash: String,
}

/// List-style response for paginated listings.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub memories: Vec<MemoryResponse>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
}

/// MCP projection of a listing: `total` becomes `total_found` (the count of
/// items on this page). Pure rename — ordering and content untouched.
#[derive(Debug, Serialize)]
pub struct McpListResponse {
    pub memories: Vec<MemoryResponse>,
    pub page: usize,
    pub page_size: usize,
    pub total_found: usize,
}

impl From<ListResponse> for McpListResponse {
    fn from(list: ListResponse) -> Self {
        Self {
            total_found: list.memories.len(),
            memories: list.memories,
            page: list.page,
            page_size: list.page_size,
        }
    }
}

/// Canonical statistics shape reported by the health check, independent of
/// which field names the backend used.
#[derive(Debug, Serialize)]
pub struct HealthStatistics {
    pub total_memories: u64,
    pub total_tags: u64,
    pub storage_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dimension: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<HealthStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}
