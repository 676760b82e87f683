//! Frame classification.
//!
//! Turns one decoded frame payload into the events it carries. The rules are
//! ordered but independent: one frame may carry several signals at once
//! (stage, SQL, and a result set commonly arrive together), and every rule
//! that matches produces an event. A frame matching no rule yields exactly
//! one [`QueryEvent::Noop`], so keep-alives stay visible to the caller
//! without tripping any error path.

use crate::error::ParseFailure;
use crate::models::QueryResponse;
use crate::rows::Row;
use crate::sse::events::{QueryEvent, ResultPayload};
use crate::sse::payloads::ChunkPayload;
use serde_json::Value;

/// Wrapper markers the model emits around reasoning text.
const THINKING_OPEN: &str = "<thinking>";
const THINKING_CLOSE: &str = "</thinking>";

/// Strip literal reasoning wrapper tags. Callers never see the raw markers,
/// whether the text arrives as deltas or as one finalized block.
pub fn strip_thinking_tags(text: &str) -> String {
    text.replace(THINKING_OPEN, "").replace(THINKING_CLOSE, "")
}

/// Classify one frame payload.
///
/// Unparseable JSON is a [`ParseFailure`]; the session logs and skips it.
pub fn classify(frame: &str) -> Result<Vec<QueryEvent>, ParseFailure> {
    let payload: ChunkPayload = serde_json::from_str(frame).map_err(|e| ParseFailure {
        message: e.to_string(),
    })?;
    Ok(classify_payload(&payload))
}

/// Classify the non-streaming `POST /query` response as a single terminal
/// frame, through the same rules as the stream.
pub fn classify_response(response: &QueryResponse) -> Vec<QueryEvent> {
    let payload = ChunkPayload {
        sql: response.sql.clone(),
        result: response.result.clone(),
        error: if response.is_success() {
            None
        } else {
            Some(
                response
                    .error
                    .clone()
                    .unwrap_or_else(|| "query failed".to_string()),
            )
        },
        ..ChunkPayload::default()
    };
    classify_payload(&payload)
}

pub(crate) fn classify_payload(payload: &ChunkPayload) -> Vec<QueryEvent> {
    let mut events = Vec::new();
    let data = payload.data.as_ref();

    // Streaming reasoning delta.
    if payload.stage.as_deref() == Some("thinking")
        && payload.status.as_deref() == Some("streaming")
    {
        if let Some(chunk) = &payload.chunk {
            events.push(QueryEvent::TextDelta {
                text: strip_thinking_tags(chunk),
            });
        }
    }

    // Finalized reasoning transcript.
    if payload.stage.as_deref() == Some("thinking_done") {
        if let Some(thinking) = data.and_then(|d| d.thinking.as_ref()) {
            events.push(QueryEvent::TextFinal {
                text: strip_thinking_tags(thinking),
            });
        }
    }

    // Explicit service error.
    if let Some(error) = payload.error.as_ref().filter(|e| !e.is_empty()) {
        events.push(QueryEvent::TerminalError {
            message: error.clone(),
        });
    }

    // Stage notification, with generated SQL riding along. Nested data.sql
    // wins over the top-level field.
    let sql = data
        .and_then(|d| d.sql.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| payload.sql.clone().filter(|s| !s.is_empty()));
    if payload.stage.is_some() || sql.is_some() {
        events.push(QueryEvent::StageUpdate {
            stage: payload.stage.clone(),
            sql,
        });
    }

    // Execution result as tuple-list text. Suppressed on "explained" frames,
    // which re-send the result purely as explanation context.
    if let Some(raw) = data.and_then(|d| d.execution_result.as_ref()) {
        if payload.stage.as_deref() != Some("explained") {
            events.push(QueryEvent::ResultDelta(ResultPayload::Raw {
                text: raw.clone(),
                columns: data
                    .and_then(|d| d.columns.clone())
                    .filter(|c| !c.is_empty()),
            }));
        }
    }

    // Already-structured result rows.
    if let Some(result) = &payload.result {
        events.push(QueryEvent::ResultDelta(ResultPayload::Rows(
            normalize_result(result),
        )));
    }

    if events.is_empty() {
        events.push(QueryEvent::Noop);
    }
    events
}

/// Normalize a `result` value to a row sequence: an array maps per element,
/// a lone record becomes a one-element sequence, a scalar is wrapped under a
/// `value` column, null is empty.
fn normalize_result(value: &Value) -> Vec<Row> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(value_to_row).collect(),
        other => vec![value_to_row(other)],
    }
}

fn value_to_row(value: &Value) -> Row {
    match value {
        Value::Object(map) => map.clone(),
        other => {
            let mut row = Row::new();
            row.insert("value".to_string(), other.clone());
            row
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_thinking_delta_strips_tags() {
        let events =
            classify(r#"{"stage": "thinking", "status": "streaming", "chunk": "<thinking>A"}"#)
                .unwrap();
        assert_eq!(
            events[0],
            QueryEvent::TextDelta {
                text: "A".to_string()
            }
        );
    }

    #[test]
    fn test_thinking_delta_also_fires_stage_update() {
        // The stage field is present, so the stage rule fires too.
        let events =
            classify(r#"{"stage": "thinking", "status": "streaming", "chunk": "x"}"#).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            QueryEvent::StageUpdate { stage: Some(s), sql: None } if s == "thinking"
        ));
    }

    #[test]
    fn test_thinking_without_streaming_status_is_not_a_delta() {
        let events = classify(r#"{"stage": "thinking", "chunk": "x"}"#).unwrap();
        assert!(matches!(events[0], QueryEvent::StageUpdate { .. }));
    }

    #[test]
    fn test_thinking_done_finalizes() {
        let events = classify(
            r#"{"stage": "thinking_done", "data": {"thinking": "<thinking>full text</thinking>"}}"#,
        )
        .unwrap();
        assert_eq!(
            events[0],
            QueryEvent::TextFinal {
                text: "full text".to_string()
            }
        );
    }

    #[test]
    fn test_error_frame() {
        let events = classify(r#"{"error": "syntax error near SELECT"}"#).unwrap();
        assert_eq!(
            events,
            vec![QueryEvent::TerminalError {
                message: "syntax error near SELECT".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_error_ignored() {
        let events = classify(r#"{"error": ""}"#).unwrap();
        assert_eq!(events, vec![QueryEvent::Noop]);
    }

    #[test]
    fn test_top_level_sql_without_stage() {
        let events = classify(r#"{"sql": "SELECT 1"}"#).unwrap();
        assert_eq!(
            events,
            vec![QueryEvent::StageUpdate {
                stage: None,
                sql: Some("SELECT 1".to_string())
            }]
        );
    }

    #[test]
    fn test_nested_sql_wins_over_top_level() {
        let events =
            classify(r#"{"sql": "SELECT 1", "data": {"sql": "SELECT 2"}}"#).unwrap();
        assert_eq!(
            events,
            vec![QueryEvent::StageUpdate {
                stage: None,
                sql: Some("SELECT 2".to_string())
            }]
        );
    }

    #[test]
    fn test_empty_sql_ignored() {
        let events = classify(r#"{"stage": "sql_generation", "sql": ""}"#).unwrap();
        assert_eq!(
            events,
            vec![QueryEvent::StageUpdate {
                stage: Some("sql_generation".to_string()),
                sql: None
            }]
        );
    }

    #[test]
    fn test_execution_result_with_columns() {
        let events = classify(
            r#"{"stage": "execution", "data": {"execution_result": "[(1, 'a')]", "columns": ["id", "name"]}}"#,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            QueryEvent::ResultDelta(ResultPayload::Raw {
                text: "[(1, 'a')]".to_string(),
                columns: Some(vec!["id".to_string(), "name".to_string()]),
            })
        );
    }

    #[test]
    fn test_execution_result_suppressed_on_explained_stage() {
        let events = classify(
            r#"{"stage": "explained", "data": {"execution_result": "[(1, 'a')]"}}"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![QueryEvent::StageUpdate {
                stage: Some("explained".to_string()),
                sql: None
            }]
        );
    }

    #[test]
    fn test_structured_result_array() {
        let events = classify(r#"{"result": [{"id": 1}, {"id": 2}]}"#).unwrap();
        match &events[0] {
            QueryEvent::ResultDelta(ResultPayload::Rows(rows)) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[1].get("id"), Some(&json!(2)));
            }
            other => panic!("expected ResultDelta, got {other:?}"),
        }
    }

    #[test]
    fn test_structured_result_lone_record_wrapped() {
        let events = classify(r#"{"result": {"count": 7}}"#).unwrap();
        match &events[0] {
            QueryEvent::ResultDelta(ResultPayload::Rows(rows)) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].get("count"), Some(&json!(7)));
            }
            other => panic!("expected ResultDelta, got {other:?}"),
        }
    }

    #[test]
    fn test_structured_result_scalar_wrapped_under_value() {
        let events = classify(r#"{"result": 42}"#).unwrap();
        match &events[0] {
            QueryEvent::ResultDelta(ResultPayload::Rows(rows)) => {
                assert_eq!(rows[0].get("value"), Some(&json!(42)));
            }
            other => panic!("expected ResultDelta, got {other:?}"),
        }
    }

    #[test]
    fn test_combined_frame_fires_all_rules_in_order() {
        let events = classify(
            r#"{"stage": "execution", "sql": "SELECT *", "data": {"execution_result": "[(1, 'a')]"}}"#,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            QueryEvent::StageUpdate {
                stage: Some("execution".to_string()),
                sql: Some("SELECT *".to_string())
            }
        );
        assert!(matches!(events[1], QueryEvent::ResultDelta(_)));
    }

    #[test]
    fn test_empty_frame_is_noop() {
        assert_eq!(classify("{}").unwrap(), vec![QueryEvent::Noop]);
    }

    #[test]
    fn test_malformed_frame_is_parse_failure() {
        assert!(classify("not json").is_err());
        assert!(classify(r#"{"stage": "#).is_err());
    }

    #[test]
    fn test_classify_success_response() {
        let response: QueryResponse = serde_json::from_str(
            r#"{"question": "q", "result": [{"n": 1}], "sql": "SELECT 1", "status": "success"}"#,
        )
        .unwrap();
        let events = classify_response(&response);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            QueryEvent::StageUpdate { sql: Some(s), .. } if s == "SELECT 1"
        ));
        assert!(matches!(&events[1], QueryEvent::ResultDelta(_)));
    }

    #[test]
    fn test_classify_error_response() {
        let response: QueryResponse =
            serde_json::from_str(r#"{"question": "q", "status": "error"}"#).unwrap();
        let events = classify_response(&response);
        assert_eq!(
            events,
            vec![QueryEvent::TerminalError {
                message: "query failed".to_string()
            }]
        );
    }

    #[test]
    fn test_strip_thinking_tags() {
        assert_eq!(strip_thinking_tags("<thinking>abc</thinking>"), "abc");
        assert_eq!(strip_thinking_tags("no tags"), "no tags");
        assert_eq!(strip_thinking_tags("a</thinking>"), "a");
    }
}
