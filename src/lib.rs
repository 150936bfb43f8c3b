//! Semantic memory service for AI agents — persistent, taggable,
//! time-searchable memory over MCP and HTTP.
//!
//! mnemo is an [MCP](https://modelcontextprotocol.io/) server and REST API
//! around one storage-agnostic query engine. Every memory is keyed by a
//! deterministic content hash, embedded into a vector space for semantic
//! search, and carries tags, an optional type, and open metadata.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   for vector search, behind the [`storage::MemoryStorage`] trait
//! - **Embeddings**: pluggable [`embedding::EmbeddingProvider`] (default:
//!   deterministic feature-hashed bag-of-words, 384 dimensions)
//! - **Query engine**: [`service::MemoryService`] — semantic, tag, time, and
//!   similar-to search with uniform result shaping across front-ends
//! - **Transports**: MCP over stdio or Streamable HTTP, plus a REST API on
//!   the same listener
//!
//! # Modules
//!
//! - [`config`] — configuration from TOML files and environment variables
//! - [`db`] — SQLite initialization and schema
//! - [`embedding`] — text-to-vector providers
//! - [`memory`] — core domain: types, hashing, tags, time parsing, ranking
//! - [`service`] — the query service shared by every front-end
//! - [`storage`] — storage backends behind one trait
//! - [`api`] / [`tools`] / [`server`] — HTTP and MCP front-ends

pub mod api;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod server;
pub mod service;
pub mod storage;
pub mod tools;
