//! MCP `search_by_time` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_by_time` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchByTimeParams {
    /// Natural language time phrase, e.g. `"yesterday"`, `"last week"`.
    #[schemars(
        description = "Natural language time phrase: 'today', 'yesterday', 'this week', 'this month', 'last week', 'last month', 'last 2 weeks'."
    )]
    pub query: String,

    /// Maximum number of results to return. Defaults to the server setting.
    #[schemars(description = "Maximum number of results to return. Defaults to 10.")]
    pub n_results: Option<usize>,
}
