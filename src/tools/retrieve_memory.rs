//! MCP `retrieve_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `retrieve_memory` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RetrieveMemoryParams {
    /// Natural language query for semantic search.
    #[schemars(description = "Natural language query to search memories semantically.")]
    pub query: String,

    /// Maximum number of results to return. Defaults to the server setting.
    #[schemars(description = "Maximum number of results to return. Defaults to 10.")]
    pub n_results: Option<usize>,

    /// Minimum similarity score (0.0-1.0). Results below it are dropped.
    #[schemars(
        description = "Minimum similarity score (0.0-1.0). Results scoring below it are excluded."
    )]
    pub similarity_threshold: Option<f64>,
}
