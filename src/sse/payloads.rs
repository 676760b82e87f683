//! Deserialization structs for stream frame payloads.
//!
//! Every field is optional: the service sends whatever subset applies, and
//! several signals may coexist in one frame.

use serde::Deserialize;
use serde_json::Value;

/// One JSON frame from the query stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChunkPayload {
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub chunk: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<DataPayload>,
}

/// Nested `data` record carried by some frames.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DataPayload {
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub execution_result: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}
