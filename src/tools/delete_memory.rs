//! MCP `delete_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `delete_memory` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteMemoryParams {
    /// Content hash of the memory to delete.
    #[schemars(description = "Content hash of the memory to delete.")]
    pub content_hash: String,
}
