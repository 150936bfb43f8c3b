//! MCP `search_by_tag` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::tags::TagsInput;

/// Parameters for the `search_by_tag` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchByTagParams {
    /// Tags to search for, as a list or one comma-separated string.
    #[schemars(
        description = "Tags to search for, either as a list of strings or a single comma-separated string."
    )]
    pub tags: TagsInput,

    /// `true` requires every tag to be present (ALL); `false` (default)
    /// matches memories carrying any of the tags (ANY).
    #[schemars(
        description = "If true, only memories carrying every tag match (ALL). Defaults to false (ANY)."
    )]
    pub match_all: Option<bool>,
}
