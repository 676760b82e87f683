//! Stream event types.
//!
//! [`QueryEvent`] is the closed set of things a decoded stream frame can mean
//! to a session. Events are immutable once constructed; the session merges
//! them into its state in arrival order.

use crate::rows::Row;

/// A classified event from the query stream.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// Stage notification. `sql` is a side-channel: generated SQL rides on
    /// whatever frame carries it rather than being its own event kind, so a
    /// frame with only an `sql` field produces a `StageUpdate` without a
    /// stage name.
    StageUpdate {
        stage: Option<String>,
        sql: Option<String>,
    },
    /// A streamed fragment of the model's reasoning text, tags stripped.
    TextDelta { text: String },
    /// The full reasoning transcript, replacing anything streamed so far.
    TextFinal { text: String },
    /// A new result set that fully replaces the previous one.
    ResultDelta(ResultPayload),
    /// The service reported a terminal error; the message is verbatim.
    TerminalError { message: String },
    /// The `[DONE]` sentinel: the stream is over.
    StreamEnd,
    /// A legal frame that carried no recognized signal (keep-alive).
    /// Delivered to the caller so liveness stays observable.
    Noop,
}

/// Payload of a [`QueryEvent::ResultDelta`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPayload {
    /// The executor's tuple-list text, not yet coerced into rows.
    Raw {
        text: String,
        columns: Option<Vec<String>>,
    },
    /// Rows that arrived already structured.
    Rows(Vec<Row>),
}

impl QueryEvent {
    /// Event kind name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryEvent::StageUpdate { .. } => "stage_update",
            QueryEvent::TextDelta { .. } => "text_delta",
            QueryEvent::TextFinal { .. } => "text_final",
            QueryEvent::ResultDelta(_) => "result_delta",
            QueryEvent::TerminalError { .. } => "terminal_error",
            QueryEvent::StreamEnd => "stream_end",
            QueryEvent::Noop => "noop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(
            QueryEvent::StageUpdate {
                stage: None,
                sql: None
            }
            .kind(),
            "stage_update"
        );
        assert_eq!(QueryEvent::StreamEnd.kind(), "stream_end");
        assert_eq!(QueryEvent::Noop.kind(), "noop");
    }
}
