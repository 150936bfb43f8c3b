//! MCP `store_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::memory::tags::TagsInput;

/// Parameters for the `store_memory` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreMemoryParams {
    /// The text content to store.
    #[schemars(description = "The text content of the memory to store.")]
    pub content: String,

    /// Tags as a list of strings or one comma-separated string.
    #[schemars(
        description = "Tags for the memory, either as a list of strings or a single comma-separated string."
    )]
    pub tags: Option<TagsInput>,

    /// Optional free-form classification, e.g. `"note"`, `"decision"`, `"task"`.
    #[schemars(description = "Optional memory type, e.g. 'note', 'decision', 'task'.")]
    pub memory_type: Option<String>,

    /// Open key-value extension fields stored with the memory.
    #[schemars(description = "Optional metadata object stored alongside the memory.")]
    pub metadata: Option<Map<String, Value>>,

    /// Hostname of the machine this memory originates from. Takes precedence
    /// over header- and server-derived hostnames when source tracking is on.
    #[schemars(
        description = "Hostname of the originating machine. Used for source tracking when enabled."
    )]
    pub client_hostname: Option<String>,
}
