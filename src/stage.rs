//! Pipeline stage vocabulary and progress mapping.
//!
//! The service tags each stream chunk with the pipeline stage it came from.
//! The known stages form a fixed, ordered vocabulary; each one maps to a
//! progress percentage for display. Stage names the client does not know are
//! carried through verbatim with progress 0 rather than rejected, so a newer
//! backend never crashes an older client.

use std::fmt;

/// A pipeline stage reported by the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Mapping natural-language terms onto schema vocabulary
    SemanticMapping,
    /// Preparing schema context for generation
    SchemaPrep,
    /// Generating the SQL statement
    SqlGeneration,
    /// Security validation of the generated SQL
    Security,
    /// Executing the query against the database
    Execution,
    /// Producing the natural-language explanation
    Explaining,
    /// Pipeline finished
    Done,
    /// A stage name this client does not recognize
    Other(String),
}

impl Stage {
    /// Parse a stage name from the wire. Total: unknown names become
    /// [`Stage::Other`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "semantic_mapping" => Stage::SemanticMapping,
            "schema_prep" => Stage::SchemaPrep,
            "sql_generation" => Stage::SqlGeneration,
            "security" => Stage::Security,
            "execution" => Stage::Execution,
            "explaining" => Stage::Explaining,
            "done" => Stage::Done,
            other => Stage::Other(other.to_string()),
        }
    }

    /// The wire-format name of this stage.
    pub fn name(&self) -> &str {
        match self {
            Stage::SemanticMapping => "semantic_mapping",
            Stage::SchemaPrep => "schema_prep",
            Stage::SqlGeneration => "sql_generation",
            Stage::Security => "security",
            Stage::Execution => "execution",
            Stage::Explaining => "explaining",
            Stage::Done => "done",
            Stage::Other(name) => name,
        }
    }

    /// Progress percentage shown for this stage. Unknown stages report 0.
    pub fn progress(&self) -> u8 {
        match self {
            Stage::SemanticMapping => 16,
            Stage::SchemaPrep => 33,
            Stage::SqlGeneration => 50,
            Stage::Security => 66,
            Stage::Execution => 83,
            Stage::Explaining => 95,
            Stage::Done => 100,
            Stage::Other(_) => 0,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
