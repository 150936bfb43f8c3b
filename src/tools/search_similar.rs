//! MCP `search_similar` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_similar` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchSimilarParams {
    /// Content hash of the memory to find neighbors of.
    #[schemars(description = "Content hash of the memory to find similar memories for.")]
    pub content_hash: String,

    /// Maximum number of similar memories to return. Defaults to the
    /// server setting. The target memory itself is never included.
    #[schemars(description = "Maximum number of similar memories to return. Defaults to 10.")]
    pub limit: Option<usize>,
}
