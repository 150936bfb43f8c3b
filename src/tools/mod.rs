pub mod check_database_health;
pub mod delete_memory;
pub mod list_memories;
pub mod retrieve_memory;
pub mod search_by_tag;
pub mod search_by_time;
pub mod search_similar;
pub mod store_memory;

use check_database_health::CheckDatabaseHealthParams;
use delete_memory::DeleteMemoryParams;
use list_memories::ListMemoriesParams;
use retrieve_memory::RetrieveMemoryParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use search_by_tag::SearchByTagParams;
use search_by_time::SearchByTimeParams;
use search_similar::SearchSimilarParams;
use serde::Serialize;
use std::sync::Arc;
use store_memory::StoreMemoryParams;

use crate::service::format::McpListResponse;
use crate::service::{MemoryService, StoreRequest};

/// The mnemo MCP tool handler. Holds the shared query service and exposes
/// all MCP tools via the `#[tool_router]` macro.
///
/// The service is synchronous; every tool hops to `spawn_blocking` so the
/// async executor never blocks on SQLite or embedding work.
#[derive(Clone)]
pub struct MnemoTools {
    tool_router: ToolRouter<Self>,
    service: Arc<MemoryService>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl MnemoTools {
    pub fn new(service: Arc<MemoryService>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service,
        }
    }

    /// Store a new memory.
    #[tool(description = "Store a new memory with optional tags, memory_type, and metadata. Duplicate content (same content and metadata) is detected and skipped.")]
    async fn store_memory(
        &self,
        Parameters(params): Parameters<StoreMemoryParams>,
    ) -> Result<String, String> {
        tracing::info!(content_len = params.content.len(), "store_memory called");

        let service = Arc::clone(&self.service);
        let request = StoreRequest {
            content: params.content,
            tags: params.tags.map(|t| t.into_vec()).unwrap_or_default(),
            memory_type: params.memory_type,
            metadata: params.metadata.unwrap_or_default(),
            client_hostname: params.client_hostname,
            header_hostname: None,
        };

        let outcome = tokio::task::spawn_blocking(move || service.store(request))
            .await
            .map_err(|e| format!("store task failed: {e}"))?;

        to_json(&outcome)
    }

    /// Search memories by semantic similarity.
    #[tool(description = "Search memories by natural language query. Returns results ranked by semantic similarity, optionally filtered by a minimum score.")]
    async fn retrieve_memory(
        &self,
        Parameters(params): Parameters<RetrieveMemoryParams>,
    ) -> Result<String, String> {
        tracing::info!(query = %params.query, "retrieve_memory called");

        let service = Arc::clone(&self.service);
        let n_results = params.n_results.unwrap_or(service.default_n_results());
        let threshold = params.similarity_threshold;

        let response = tokio::task::spawn_blocking(move || {
            service.retrieve(&params.query, n_results, threshold)
        })
        .await
        .map_err(|e| format!("retrieve task failed: {e}"))?;

        to_json(&response)
    }

    /// Search memories by tags.
    #[tool(description = "Search memories by tags. Matches ANY of the tags by default; set match_all=true to require ALL of them. Tag comparison is exact and case-sensitive.")]
    async fn search_by_tag(
        &self,
        Parameters(params): Parameters<SearchByTagParams>,
    ) -> Result<String, String> {
        let query_tags = params.tags.into_vec();
        let match_all = params.match_all.unwrap_or(false);
        tracing::info!(tags = ?query_tags, match_all, "search_by_tag called");

        let service = Arc::clone(&self.service);
        let response =
            tokio::task::spawn_blocking(move || service.search_by_tag(&query_tags, match_all))
                .await
                .map_err(|e| format!("tag search task failed: {e}"))?;

        to_json(&response)
    }

    /// Search memories by a natural language time phrase.
    #[tool(description = "Search memories created within a natural language time range: 'today', 'yesterday', 'this week', 'this month', 'last week', 'last month', 'last 2 weeks'.")]
    async fn search_by_time(
        &self,
        Parameters(params): Parameters<SearchByTimeParams>,
    ) -> Result<String, String> {
        tracing::info!(query = %params.query, "search_by_time called");

        let service = Arc::clone(&self.service);
        let n_results = params.n_results.unwrap_or(service.default_n_results());

        let response =
            tokio::task::spawn_blocking(move || service.search_by_time(&params.query, n_results))
                .await
                .map_err(|e| format!("time search task failed: {e}"))?;

        to_json(&response)
    }

    /// Find memories similar to an existing one.
    #[tool(description = "Find memories similar to an existing memory, identified by its content hash. The target memory itself is excluded from the results.")]
    async fn search_similar(
        &self,
        Parameters(params): Parameters<SearchSimilarParams>,
    ) -> Result<String, String> {
        tracing::info!(content_hash = %params.content_hash, "search_similar called");

        let service = Arc::clone(&self.service);
        let limit = params.limit.unwrap_or(service.default_n_results());

        let response = tokio::task::spawn_blocking(move || {
            service.search_similar(&params.content_hash, limit)
        })
        .await
        .map_err(|e| format!("similar search task failed: {e}"))?;

        to_json(&response)
    }

    /// Delete a memory by content hash.
    #[tool(description = "Delete a memory by its content hash.")]
    async fn delete_memory(
        &self,
        Parameters(params): Parameters<DeleteMemoryParams>,
    ) -> Result<String, String> {
        tracing::info!(content_hash = %params.content_hash, "delete_memory called");

        let service = Arc::clone(&self.service);
        let outcome =
            tokio::task::spawn_blocking(move || service.delete_memory(&params.content_hash))
                .await
                .map_err(|e| format!("delete task failed: {e}"))?;

        to_json(&outcome)
    }

    /// List memories with pagination and optional filters.
    #[tool(description = "List memories page by page, newest first, optionally filtered by tag and/or memory_type. Pages are 1-based.")]
    async fn list_memories(
        &self,
        Parameters(params): Parameters<ListMemoriesParams>,
    ) -> Result<String, String> {
        let page = params.page.unwrap_or(1);
        let page_size = params.page_size.unwrap_or(10);
        tracing::info!(page, page_size, "list_memories called");

        let service = Arc::clone(&self.service);
        let list = tokio::task::spawn_blocking(move || {
            service.list_memories(
                page,
                page_size,
                params.tag.as_deref(),
                params.memory_type.as_deref(),
            )
        })
        .await
        .map_err(|e| format!("list task failed: {e}"))?;

        to_json(&McpListResponse::from(list))
    }

    /// Check storage backend health and statistics.
    #[tool(description = "Check database health. Returns backend status and statistics: memory count, unique tag count, storage size, embedding model.")]
    async fn check_database_health(
        &self,
        Parameters(_params): Parameters<CheckDatabaseHealthParams>,
    ) -> Result<String, String> {
        tracing::info!("check_database_health called");

        let service = Arc::clone(&self.service);
        let health = tokio::task::spawn_blocking(move || service.check_database_health())
            .await
            .map_err(|e| format!("health task failed: {e}"))?;

        to_json(&health)
    }
}

#[tool_handler]
impl ServerHandler for MnemoTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "mnemo is a semantic memory server. Use store_memory to save memories, \
                 retrieve_memory for semantic search, search_by_tag / search_by_time for \
                 filtered search, and list_memories to browse."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
