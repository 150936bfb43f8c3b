//! HTTP API front-end.
//!
//! A thin axum layer over [`MemoryService`]: handlers decode the request,
//! hop to `spawn_blocking` for the synchronous service call, and map the
//! structured outcome to an HTTP status. All response bodies are the
//! service's canonical shapes, serialized as-is.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::memory::tags::TagsInput;
use crate::service::format::{
    DeleteOutcome, HealthResponse, ListResponse, SearchResponse, SimilarResponse, StoreOutcome,
};
use crate::service::{MemoryService, StoreRequest};

type ApiState = Arc<MemoryService>;

pub fn router(service: ApiState) -> Router {
    Router::new()
        .route("/api/memories", post(store_memory).get(list_memories))
        .route("/api/memories/{content_hash}", delete(delete_memory))
        .route("/api/search", post(search))
        .route("/api/search/by-tag", post(search_by_tag))
        .route("/api/search/by-time", post(search_by_time))
        .route("/api/search/similar/{content_hash}", get(search_similar))
        .route("/api/health", get(health))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct StoreBody {
    pub content: String,
    #[serde(default)]
    pub tags: Option<TagsInput>,
    #[serde(default)]
    pub memory_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub client_hostname: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub query: String,
    #[serde(default)]
    pub n_results: Option<usize>,
    #[serde(default)]
    pub similarity_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TagSearchBody {
    pub tags: TagsInput,
    #[serde(default)]
    pub match_all: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TimeSearchBody {
    pub query: String,
    #[serde(default)]
    pub n_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub memory_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

async fn store_memory(
    State(service): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<StoreBody>,
) -> Result<(StatusCode, Json<StoreOutcome>), StatusCode> {
    let header_hostname = headers
        .get("x-client-hostname")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let request = StoreRequest {
        content: body.content,
        tags: body.tags.map(|t| t.into_vec()).unwrap_or_default(),
        memory_type: body.memory_type,
        metadata: body.metadata.unwrap_or_default(),
        client_hostname: body.client_hostname,
        header_hostname,
    };

    let outcome = tokio::task::spawn_blocking(move || service.store(request))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let status = if outcome.success {
        StatusCode::CREATED
    } else if outcome.content_hash.is_some() {
        // Reached storage and came back structured: a duplicate, not an error.
        StatusCode::OK
    } else if outcome.message.contains("Failed") {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(outcome)))
}

async fn list_memories(
    State(service): State<ApiState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse>, StatusCode> {
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(10);

    let list = tokio::task::spawn_blocking(move || {
        service.list_memories(
            page,
            page_size,
            params.tag.as_deref(),
            params.memory_type.as_deref(),
        )
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(list))
}

async fn delete_memory(
    State(service): State<ApiState>,
    Path(content_hash): Path<String>,
) -> Result<(StatusCode, Json<DeleteOutcome>), StatusCode> {
    let outcome = tokio::task::spawn_blocking(move || service.delete_memory(&content_hash))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let status = if outcome.success {
        StatusCode::OK
    } else if outcome.message.contains("not found") {
        StatusCode::NOT_FOUND
    } else if outcome.message.contains("Failed") {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(outcome)))
}

async fn search(
    State(service): State<ApiState>,
    Json(body): Json<SearchBody>,
) -> Result<(StatusCode, Json<SearchResponse>), StatusCode> {
    let n_results = body.n_results.unwrap_or(service.default_n_results());

    let response = tokio::task::spawn_blocking(move || {
        service.retrieve(&body.query, n_results, body.similarity_threshold)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((search_status(&response), Json(response)))
}

async fn search_by_tag(
    State(service): State<ApiState>,
    Json(body): Json<TagSearchBody>,
) -> Result<(StatusCode, Json<SearchResponse>), StatusCode> {
    let query_tags = body.tags.into_vec();
    let match_all = body.match_all.unwrap_or(false);

    let response =
        tokio::task::spawn_blocking(move || service.search_by_tag(&query_tags, match_all))
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((search_status(&response), Json(response)))
}

async fn search_by_time(
    State(service): State<ApiState>,
    Json(body): Json<TimeSearchBody>,
) -> Result<(StatusCode, Json<SearchResponse>), StatusCode> {
    let n_results = body.n_results.unwrap_or(service.default_n_results());

    let response =
        tokio::task::spawn_blocking(move || service.search_by_time(&body.query, n_results))
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((search_status(&response), Json(response)))
}

async fn search_similar(
    State(service): State<ApiState>,
    Path(content_hash): Path<String>,
    Query(params): Query<SimilarQuery>,
) -> Result<(StatusCode, Json<SimilarResponse>), StatusCode> {
    let limit = params.limit.unwrap_or(service.default_n_results());

    let response =
        tokio::task::spawn_blocking(move || service.search_similar(&content_hash, limit))
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let status = if response.success {
        StatusCode::OK
    } else {
        match response.message.as_deref() {
            Some(m) if m.contains("not found") => StatusCode::NOT_FOUND,
            Some(m) if m.contains("Failed") => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    };

    Ok((status, Json(response)))
}

async fn health(
    State(service): State<ApiState>,
) -> Result<(StatusCode, Json<HealthResponse>), StatusCode> {
    let response = tokio::task::spawn_blocking(move || service.check_database_health())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let status = if response.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Ok((status, Json(response)))
}

/// Searches always return a structured body; the status distinguishes
/// caller mistakes (unparseable phrase, empty tag list) from backend faults.
fn search_status(response: &SearchResponse) -> StatusCode {
    match response.error.as_deref() {
        None => StatusCode::OK,
        Some(e) if e.contains("Failed") => StatusCode::INTERNAL_SERVER_ERROR,
        Some(_) => StatusCode::BAD_REQUEST,
    }
}
