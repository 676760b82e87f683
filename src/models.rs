//! Request and response models for the query service API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /query` and `POST /query/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The natural-language question.
    pub question: String,
    /// Target database, when the service hosts more than one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Ask the service to include the generated SQL in its responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_sql: Option<bool>,
}

impl QueryRequest {
    /// Create a request for `question` with SQL included.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            database: None,
            include_sql: Some(true),
        }
    }

    /// Target a specific database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

/// Response of the non-streaming `POST /query` endpoint.
///
/// The degenerate, single-frame case of the streaming contract; see
/// [`crate::session::StreamSession::apply_response`].
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub question: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub sql: Option<String>,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Response of `GET /tables`.
#[derive(Debug, Clone, Deserialize)]
pub struct TableListResponse {
    pub tables: Vec<String>,
}

/// One column in a table schema.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Schema details for one table.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaInfo {
    pub table_name: String,
    pub ddl: String,
    pub columns: Vec<SchemaColumn>,
}

/// Response of `GET /schema/{table}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaResponse {
    pub table: String,
    pub schema: SchemaInfo,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
