//! MCP `list_memories` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `list_memories` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListMemoriesParams {
    /// 1-based page number. Defaults to 1.
    #[schemars(description = "Page number, 1-based. Defaults to 1.")]
    pub page: Option<usize>,

    /// Number of memories per page. Defaults to 10.
    #[schemars(description = "Number of memories per page. Defaults to 10.")]
    pub page_size: Option<usize>,

    /// Only list memories carrying this tag.
    #[schemars(description = "Filter: only memories carrying this exact tag.")]
    pub tag: Option<String>,

    /// Only list memories of this type.
    #[schemars(description = "Filter: only memories of this memory_type.")]
    pub memory_type: Option<String>,
}
