//! The query service — single source of truth for every front-end.
//!
//! [`MemoryService`] dispatches each query kind to the leaf components
//! (fingerprinting, time parsing, tag matching, ranking), applies pagination,
//! and shapes results uniformly. It is stateless across calls and total over
//! its structured result types: storage failures are caught here and folded
//! into `success: false` / `error` fields, never propagated as panics or
//! `Err` to callers.

pub mod format;

use chrono::{Local, TimeZone};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use crate::config::QueryConfig;
use crate::error::ServiceError;
use crate::memory::ranking;
use crate::memory::tags::{self, TagMatch};
use crate::memory::timex;
use crate::memory::types::{iso_from_epoch, epoch_now, Memory, MemoryQueryResult};
use crate::storage::MemoryStorage;
use format::{
    DeleteOutcome, HealthResponse, HealthStatistics, ListResponse, MemoryResponse,
    SearchResponse, SearchResult, SimilarResponse, StoreOutcome,
};

/// Inputs to a store operation, already normalized by the front-end
/// (tags always arrive as a plain list of strings).
#[derive(Debug, Default)]
pub struct StoreRequest {
    pub content: String,
    pub tags: Vec<String>,
    pub memory_type: Option<String>,
    pub metadata: Map<String, Value>,
    /// Hostname explicitly supplied by the client, highest precedence.
    pub client_hostname: Option<String>,
    /// Hostname from the `X-Client-Hostname` request header.
    pub header_hostname: Option<String>,
}

pub struct MemoryService {
    storage: Arc<dyn MemoryStorage>,
    config: QueryConfig,
}

impl MemoryService {
    pub fn new(storage: Arc<dyn MemoryStorage>, config: QueryConfig) -> Self {
        Self { storage, config }
    }

    /// Result count used when a caller leaves `n_results` unspecified.
    pub fn default_n_results(&self) -> usize {
        self.config.default_n_results
    }

    /// Store a new memory. Computes the fingerprint, optionally augments
    /// tags/metadata with the originating hostname, and delegates
    /// persistence to the storage backend.
    pub fn store(&self, req: StoreRequest) -> StoreOutcome {
        if req.content.is_empty() {
            return StoreOutcome {
                success: false,
                message: "Content must not be empty".into(),
                content_hash: None,
                memory: None,
            };
        }

        let mut final_tags = req.tags;
        let mut final_metadata = req.metadata;

        if self.config.include_hostname {
            let hostname = resolve_hostname(
                req.client_hostname.as_deref(),
                req.header_hostname.as_deref(),
            );
            let source_tag = format!("source:{hostname}");
            if !final_tags.contains(&source_tag) {
                final_tags.push(source_tag);
            }
            final_metadata.insert("hostname".into(), json!(hostname));
        }

        // Metadata participates in the fingerprint, so augmentation must
        // happen before the hash is computed.
        let memory = Memory::new(req.content, final_tags, req.memory_type, final_metadata);

        match self.storage.store(&memory) {
            Ok((success, message)) => {
                debug!(hash = %memory.content_hash, success, "store");
                StoreOutcome {
                    success,
                    message,
                    content_hash: Some(memory.content_hash.clone()),
                    memory: Some(MemoryResponse::from(&memory)),
                }
            }
            Err(e) => {
                error!(error = %e, "store failed");
                StoreOutcome {
                    success: false,
                    message: format!("Failed to store memory: {e}"),
                    content_hash: None,
                    memory: None,
                }
            }
        }
    }

    /// Semantic retrieval: storage ranks candidates; the threshold filter is
    /// re-applied here as defense in depth.
    pub fn retrieve(
        &self,
        query: &str,
        n_results: usize,
        similarity_threshold: Option<f64>,
    ) -> SearchResponse {
        let started = Instant::now();
        match self.storage.retrieve(query, n_results) {
            Ok(candidates) => {
                let scored: Vec<MemoryQueryResult> = candidates
                    .into_iter()
                    .map(|mut r| {
                        r.relevance_reason = r
                            .relevance_score
                            .map(|s| format!("Semantic similarity: {s:.3}"));
                        r
                    })
                    .collect();
                let ranked = ranking::rank(scored, n_results, similarity_threshold);
                let results = ranked.iter().map(SearchResult::from).collect();
                SearchResponse::success(results, query.into(), "semantic", ms_since(started))
            }
            Err(e) => {
                error!(error = %e, "retrieve failed");
                SearchResponse::failure(
                    query.into(),
                    "semantic",
                    format!("Failed to retrieve memories: {e}"),
                )
            }
        }
    }

    /// Tag search. `match_all = false` is ANY semantics, `true` is ALL.
    pub fn search_by_tag(&self, query_tags: &[String], match_all: bool) -> SearchResponse {
        let started = Instant::now();
        let mode = if match_all { TagMatch::All } else { TagMatch::Any };
        let query_string = if query_tags.is_empty() {
            "Tags: []".to_string()
        } else {
            format!("Tags: {} ({mode})", query_tags.join(", "))
        };

        match self.search_by_tag_inner(query_tags, mode) {
            Ok(results) => {
                SearchResponse::success(results, query_string, "tag", ms_since(started))
            }
            Err(e) => {
                // Validation messages stay verbatim; only collaborator
                // faults get the "Failed" prefix front-ends map to 5xx.
                let error = match &e {
                    ServiceError::Backend(err) => {
                        error!(error = %err, "tag search failed");
                        format!("Failed to search by tags: {err}")
                    }
                    other => other.to_string(),
                };
                SearchResponse::failure(query_string, "tag", error)
            }
        }
    }

    fn search_by_tag_inner(
        &self,
        query_tags: &[String],
        mode: TagMatch,
    ) -> Result<Vec<SearchResult>, ServiceError> {
        if query_tags.is_empty() {
            return Err(ServiceError::Validation(
                "At least one tag must be specified".into(),
            ));
        }

        let mut memories = self.storage.search_by_tag(query_tags)?;
        if mode == TagMatch::All {
            memories.retain(|m| tags::matches(&m.tags, query_tags, TagMatch::All));
        }

        Ok(memories
            .iter()
            .map(|memory| {
                let matched = tags::matched_tags(&memory.tags, query_tags);
                SearchResult {
                    memory: MemoryResponse::from(memory),
                    similarity_score: None,
                    relevance_reason: Some(format!(
                        "Tags match ({mode}): {}",
                        matched.join(", ")
                    )),
                }
            })
            .collect())
    }

    /// Time-phrase search: parse the phrase, pull a broad candidate pool, and
    /// filter by creation time against the inclusive range.
    pub fn search_by_time(&self, query: &str, n_results: usize) -> SearchResponse {
        let started = Instant::now();

        let now = Local::now().naive_local();
        let Some(range) = timex::parse_time_expression(query, now) else {
            return SearchResponse::failure(
                query.into(),
                "time",
                format!(
                    "Could not parse time query: '{query}'. \
                     Try 'yesterday', 'last week', 'this month', etc."
                ),
            );
        };

        // The storage layer has no time index, so approximate "everything"
        // with a broad similarity pool and filter here.
        let pool = match self.storage.retrieve("", self.config.time_search_pool) {
            Ok(pool) => pool,
            Err(e) => {
                error!(error = %e, "time search pool fetch failed");
                return SearchResponse::failure(
                    query.into(),
                    "time",
                    format!("Failed to search by time: {e}"),
                );
            }
        };

        let results: Vec<SearchResult> = pool
            .into_iter()
            .filter(|r| {
                local_naive(r.memory.created_at)
                    .map(|t| range.contains(t))
                    .unwrap_or(false)
            })
            .take(n_results)
            .map(|mut r| {
                r.relevance_reason = Some(format!("Time match: {query}"));
                SearchResult::from(&r)
            })
            .collect();

        SearchResponse::success(results, query.into(), "time", ms_since(started))
    }

    /// Similar-to search: rank against the target memory's own content and
    /// exclude the target itself from the results.
    pub fn search_similar(&self, content_hash: &str, limit: usize) -> SimilarResponse {
        let started = Instant::now();

        match self.search_similar_inner(content_hash, limit) {
            Ok((target, ranked)) => {
                let preview: String = target.content.chars().take(50).collect();
                let results: Vec<SearchResult> = ranked.iter().map(SearchResult::from).collect();
                SimilarResponse {
                    success: true,
                    message: None,
                    target_memory: Some(MemoryResponse::from(&target)),
                    total_found: results.len(),
                    results,
                    query: format!("Similar to: {preview}..."),
                    search_type: "similar",
                    processing_time_ms: Some(ms_since(started)),
                }
            }
            Err(e) => SimilarResponse {
                success: false,
                message: Some(match &e {
                    ServiceError::Backend(err) => {
                        error!(error = %err, "similar search failed");
                        format!("Failed to search similar memories: {err}")
                    }
                    other => other.to_string(),
                }),
                target_memory: None,
                results: Vec::new(),
                total_found: 0,
                query: format!("Similar to content_hash: {content_hash}"),
                search_type: "similar",
                processing_time_ms: None,
            },
        }
    }

    fn search_similar_inner(
        &self,
        content_hash: &str,
        limit: usize,
    ) -> Result<(Memory, Vec<MemoryQueryResult>), ServiceError> {
        if content_hash.is_empty() {
            return Err(ServiceError::Validation(
                "Content hash must be specified".into(),
            ));
        }

        let target = self
            .storage
            .get_by_hash(content_hash)?
            .ok_or_else(|| ServiceError::NotFound("Memory".into()))?;

        // Fetch one extra candidate: the target itself will rank first and
        // is removed, keeping the result count stable.
        let candidates = self.storage.retrieve(&target.content, limit + 1)?;
        let mut ranked = ranking::rank(
            ranking::exclude_hash(candidates, content_hash),
            limit,
            None,
        );
        for r in &mut ranked {
            r.relevance_reason = r
                .relevance_score
                .map(|s| format!("Similar to target memory: {s:.3}"));
        }
        Ok((target, ranked))
    }

    /// Delete a memory by content hash.
    pub fn delete_memory(&self, content_hash: &str) -> DeleteOutcome {
        if content_hash.is_empty() {
            return DeleteOutcome {
                success: false,
                message: "Content hash must be specified".into(),
                content_hash: content_hash.into(),
            };
        }

        match self.storage.delete(content_hash) {
            Ok((success, message)) => DeleteOutcome {
                success,
                message,
                content_hash: content_hash.into(),
            },
            Err(e) => {
                error!(error = %e, "delete failed");
                DeleteOutcome {
                    success: false,
                    message: format!("Failed to delete memory: {e}"),
                    content_hash: content_hash.into(),
                }
            }
        }
    }

    /// Paginated listing with optional tag and type filters. Pages are
    /// 1-based; `offset = (page - 1) * page_size`.
    pub fn list_memories(
        &self,
        page: usize,
        page_size: usize,
        tag: Option<&str>,
        memory_type: Option<&str>,
    ) -> ListResponse {
        let page = page.max(1);
        let page_size = page_size.max(1);

        match self.list_memories_inner(page, page_size, tag, memory_type) {
            Ok(list) => list,
            Err(e) => {
                error!(error = %e, "list_memories failed");
                ListResponse {
                    memories: Vec::new(),
                    total: 0,
                    page,
                    page_size,
                    has_more: false,
                }
            }
        }
    }

    fn list_memories_inner(
        &self,
        page: usize,
        page_size: usize,
        tag: Option<&str>,
        memory_type: Option<&str>,
    ) -> Result<ListResponse, ServiceError> {
        let offset = (page - 1) * page_size;

        if let Some(tag) = tag {
            // Tag path: storage pagination cannot pre-filter by tag here, so
            // fetch the whole tag-filtered set and slice. `total` reflects
            // the filtered count.
            let mut all = self.storage.search_by_tag(&[tag.to_string()])?;
            if let Some(mt) = memory_type {
                all.retain(|m| m.memory_type.as_deref() == Some(mt));
            }
            let total = all.len();
            let memories: Vec<MemoryResponse> = all
                .iter()
                .skip(offset)
                .take(page_size)
                .map(MemoryResponse::from)
                .collect();
            return Ok(ListResponse {
                memories,
                total,
                page,
                page_size,
                has_more: offset + page_size < total,
            });
        }

        let mut total = self.storage.count_all_memories()?;
        let mut page_memories =
            self.storage
                .get_all_memories(Some(page_size), offset, None, None)?;

        if let Some(mt) = memory_type {
            page_memories.retain(|m| m.memory_type.as_deref() == Some(mt));
            // The unfiltered count no longer matches; recount against
            // storage so has_more stays accurate.
            total = self
                .storage
                .get_all_memories(None, 0, None, Some(mt))?
                .len();
        }

        let has_more = offset + page_memories.len() < total;
        Ok(ListResponse {
            memories: page_memories.iter().map(MemoryResponse::from).collect(),
            total,
            page,
            page_size,
            has_more,
        })
    }

    /// Health check: normalize whatever statistics shape the backend reports
    /// into one canonical form.
    pub fn check_database_health(&self) -> HealthResponse {
        let backend = self.storage.backend_name().to_string();

        let stats = match self.storage.get_stats() {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "health check failed");
                return HealthResponse {
                    status: "error",
                    backend,
                    statistics: None,
                    error: Some(format!("Health check failed: {e}")),
                    timestamp: iso_from_epoch(epoch_now()),
                };
            }
        };

        if let Some(err) = stats.get("error") {
            return HealthResponse {
                status: "error",
                backend,
                statistics: None,
                error: Some(format!("Storage backend error: {err}")),
                timestamp: iso_from_epoch(epoch_now()),
            };
        }

        // Backends disagree on field names; map the variants we know about.
        let storage_size = if let Some(mb) = stats.get("database_size_mb").and_then(Value::as_f64)
        {
            format!("{mb:.2} MB")
        } else if let Some(s) = stats.get("storage_size").and_then(Value::as_str) {
            s.to_string()
        } else {
            "unknown".to_string()
        };

        let total_tags = stats
            .get("total_tags")
            .or_else(|| stats.get("unique_tags"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let timestamp = stats
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| iso_from_epoch(epoch_now()));

        HealthResponse {
            status: "healthy",
            backend,
            statistics: Some(HealthStatistics {
                total_memories: stats
                    .get("total_memories")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                total_tags,
                storage_size,
                embedding_model: stats
                    .get("embedding_model")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                embedding_dimension: stats.get("embedding_dimension").and_then(Value::as_u64),
            }),
            error: None,
            timestamp,
        }
    }
}

/// Hostname precedence: explicit client value, then request header, then the
/// local machine. First non-empty wins.
fn resolve_hostname(client: Option<&str>, header: Option<&str>) -> String {
    client
        .filter(|h| !h.is_empty())
        .or(header.filter(|h| !h.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(local_hostname)
}

/// Local machine hostname: `HOSTNAME` env var, `COMPUTERNAME` on Windows,
/// else a fixed fallback.
fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string())
}

/// Convert an epoch-seconds timestamp to local wall-clock time for
/// comparison against parsed time ranges.
fn local_naive(ts: f64) -> Option<chrono::NaiveDateTime> {
    let secs = ts.trunc() as i64;
    let nanos = ((ts.fract() * 1_000_000_000.0).round() as u32).min(999_999_999);
    Local
        .timestamp_opt(secs, nanos)
        .single()
        .map(|dt| dt.naive_local())
}

fn ms_since(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hashed::HashedEmbedding;
    use crate::storage::sqlite::SqliteVecStorage;
    use anyhow::anyhow;

    /// Storage double whose stats capability misbehaves in a chosen way.
    /// Other methods answer with empty defaults; health only touches stats.
    enum StatsMode {
        Fail,
        ErrorPayload,
    }

    struct StubStorage(StatsMode);

    impl MemoryStorage for StubStorage {
        fn store(&self, _memory: &Memory) -> anyhow::Result<(bool, String)> {
            Ok((true, "Memory stored successfully".into()))
        }
        fn retrieve(&self, _query: &str, _n: usize) -> anyhow::Result<Vec<MemoryQueryResult>> {
            Ok(Vec::new())
        }
        fn search_by_tags(
            &self,
            _tags: &[String],
            _mode: TagMatch,
        ) -> anyhow::Result<Vec<Memory>> {
            Ok(Vec::new())
        }
        fn get_by_hash(&self, _hash: &str) -> anyhow::Result<Option<Memory>> {
            Ok(None)
        }
        fn delete(&self, _hash: &str) -> anyhow::Result<(bool, String)> {
            Ok((false, "not found".into()))
        }
        fn get_all_memories(
            &self,
            _limit: Option<usize>,
            _offset: usize,
            _tags: Option<&[String]>,
            _memory_type: Option<&str>,
        ) -> anyhow::Result<Vec<Memory>> {
            Ok(Vec::new())
        }
        fn count_all_memories(&self) -> anyhow::Result<usize> {
            Ok(0)
        }
        fn get_stats(&self) -> anyhow::Result<Value> {
            match self.0 {
                StatsMode::Fail => Err(anyhow!("stats table unreadable")),
                StatsMode::ErrorPayload => Ok(json!({ "error": "vector index corrupt" })),
            }
        }
        fn backend_name(&self) -> &'static str {
            "stub"
        }
    }

    fn service() -> MemoryService {
        let storage = SqliteVecStorage::in_memory(Arc::new(HashedEmbedding::new())).unwrap();
        MemoryService::new(Arc::new(storage), QueryConfig::default())
    }

    fn service_with_hostname() -> MemoryService {
        let storage = SqliteVecStorage::in_memory(Arc::new(HashedEmbedding::new())).unwrap();
        let config = QueryConfig {
            include_hostname: true,
            ..QueryConfig::default()
        };
        MemoryService::new(Arc::new(storage), config)
    }

    fn store_simple(svc: &MemoryService, content: &str, tag_list: &[&str]) -> String {
        let outcome = svc.store(StoreRequest {
            content: content.into(),
            tags: tag_list.iter().map(|s| s.to_string()).collect(),
            ..StoreRequest::default()
        });
        assert!(outcome.success, "store failed: {}", outcome.message);
        outcome.content_hash.unwrap()
    }

    #[test]
    fn store_rejects_empty_content() {
        let svc = service();
        let outcome = svc.store(StoreRequest::default());
        assert!(!outcome.success);
        assert!(outcome.content_hash.is_none());
    }

    #[test]
    fn hostname_augmentation_uses_client_value_first() {
        let svc = service_with_hostname();
        let outcome = svc.store(StoreRequest {
            content: "with hostname".into(),
            client_hostname: Some("laptop-7".into()),
            header_hostname: Some("ignored".into()),
            ..StoreRequest::default()
        });
        assert!(outcome.success);
        let mem = outcome.memory.unwrap();
        assert!(mem.tags.contains(&"source:laptop-7".to_string()));
        assert_eq!(mem.metadata["hostname"], "laptop-7");
    }

    #[test]
    fn search_by_tag_rejects_empty_tag_list() {
        let svc = service();
        let resp = svc.search_by_tag(&[], false);
        assert_eq!(resp.total_found, 0);
        assert!(resp
            .error
            .as_deref()
            .unwrap()
            .contains("At least one tag must be specified"));
    }

    #[test]
    fn tag_search_any_vs_all() {
        let svc = service();
        store_simple(&svc, "both tags", &["test", "python"]);
        store_simple(&svc, "one tag", &["test"]);

        let q = vec!["test".to_string(), "python".to_string()];
        let any = svc.search_by_tag(&q, false);
        assert_eq!(any.total_found, 2);

        let all = svc.search_by_tag(&q, true);
        assert_eq!(all.total_found, 1);
        let reason = all.results[0].relevance_reason.as_deref().unwrap();
        assert!(reason.starts_with("Tags match (ALL):"));
        assert!(reason.contains("test"));
        assert!(reason.contains("python"));
        assert!(all.results[0].similarity_score.is_none());
    }

    #[test]
    fn unparseable_time_query_is_a_structured_error() {
        let svc = service();
        let resp = svc.search_by_time("gibberish", 10);
        assert_eq!(resp.total_found, 0);
        assert!(resp.error.as_deref().unwrap().contains("Could not parse"));
    }

    #[test]
    fn time_search_finds_recent_memories() {
        let svc = service();
        store_simple(&svc, "created just now", &[]);
        let resp = svc.search_by_time("today", 10);
        assert!(resp.error.is_none());
        assert_eq!(resp.total_found, 1);
        assert_eq!(
            resp.results[0].relevance_reason.as_deref(),
            Some("Time match: today")
        );
    }

    #[test]
    fn similar_excludes_the_seed_and_caps_results() {
        let svc = service();
        let seed = store_simple(&svc, "the rust borrow checker enforces ownership", &[]);
        store_simple(&svc, "rust ownership and the borrow checker", &[]);
        store_simple(&svc, "rust borrow checker rules for ownership", &[]);
        store_simple(&svc, "gardening tips for spring tomatoes", &[]);

        let resp = svc.search_similar(&seed, 2);
        assert!(resp.success);
        assert!(resp.total_found <= 2);
        assert!(resp
            .results
            .iter()
            .all(|r| r.memory.content_hash != seed));
        assert!(resp.target_memory.is_some());
    }

    #[test]
    fn similar_to_missing_hash_is_not_found() {
        let svc = service();
        let resp = svc.search_similar("no-such-hash", 5);
        assert!(!resp.success);
        assert!(resp.message.as_deref().unwrap().contains("not found"));
    }

    #[test]
    fn health_check_reports_canonical_statistics() {
        let svc = service();
        store_simple(&svc, "a memory", &["a", "b"]);

        let health = svc.check_database_health();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.backend, "sqlite_vec");
        let stats = health.statistics.unwrap();
        assert_eq!(stats.total_memories, 1);
        assert_eq!(stats.total_tags, 2);
        assert!(stats.storage_size.ends_with("MB") || stats.storage_size == "unknown");
    }

    #[test]
    fn health_is_error_when_stats_retrieval_fails() {
        let svc = MemoryService::new(
            Arc::new(StubStorage(StatsMode::Fail)),
            QueryConfig::default(),
        );
        let health = svc.check_database_health();
        assert_eq!(health.status, "error");
        assert_eq!(health.backend, "stub");
        assert!(health.statistics.is_none());
        let err = health.error.as_deref().unwrap();
        assert!(err.contains("Health check failed"));
        assert!(err.contains("stats table unreadable"));
        assert!(!health.timestamp.is_empty());
    }

    #[test]
    fn health_is_error_when_stats_payload_signals_one() {
        let svc = MemoryService::new(
            Arc::new(StubStorage(StatsMode::ErrorPayload)),
            QueryConfig::default(),
        );
        let health = svc.check_database_health();
        assert_eq!(health.status, "error");
        assert!(health.statistics.is_none());
        let err = health.error.as_deref().unwrap();
        assert!(err.contains("Storage backend error"));
        assert!(err.contains("vector index corrupt"));
    }

    #[test]
    fn hostname_header_wins_when_client_is_absent_or_empty() {
        assert_eq!(resolve_hostname(None, Some("bastion-2")), "bastion-2");
        assert_eq!(resolve_hostname(Some(""), Some("bastion-2")), "bastion-2");
    }

    #[test]
    fn hostname_falls_back_to_the_local_machine() {
        let local = local_hostname();
        assert!(!local.is_empty());
        assert_eq!(resolve_hostname(None, None), local);
        assert_eq!(resolve_hostname(Some(""), Some("")), local);
    }

    #[test]
    fn retrieve_threshold_filters_weak_matches() {
        let svc = service();
        store_simple(&svc, "Paris is the capital of France", &[]);
        store_simple(&svc, "quantum chromodynamics lattice simulations", &[]);

        let loose = svc.retrieve("capital of France", 10, None);
        assert_eq!(loose.total_found, 2);

        let strict = svc.retrieve("capital of France", 10, Some(0.6));
        assert!(strict.total_found <= loose.total_found);
        for r in &strict.results {
            assert!(r.similarity_score.unwrap() >= 0.6);
        }
    }
}
