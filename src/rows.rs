//! Coercion of the service's textual result sets into structured rows.
//!
//! The execution backend serializes result sets as a Python-literal list of
//! tuples, e.g. `[(1, 'widget'), (2, 'gadget')]`, not as JSON. Coercion is a
//! narrow lexical transform - parentheses become brackets, single quotes
//! become double quotes - followed by a strict JSON parse, isolated here so
//! it can be swapped out without touching the session logic.
//!
//! Known gap: a string scalar containing a literal parenthesis or apostrophe
//! corrupts the transform. The producer does not escape those today; such
//! payloads fail the JSON parse and surface as [`CoercionError`], which the
//! session absorbs.

use crate::error::CoercionError;
use serde_json::Value;

/// One result row: an ordered column-name to value mapping.
///
/// `serde_json` is built with `preserve_order`, so iteration follows
/// insertion (column) order.
pub type Row = serde_json::Map<String, Value>;

/// Coerce a tuple-list text payload into rows.
///
/// - Empty or whitespace-only input is "no rows", not a failure.
/// - Column names come from `columns` when present and non-empty, otherwise
///   `column_0..column_{k-1}` where k is the widest row observed.
/// - Values are zipped positionally onto names; row order is preserved.
pub fn coerce_rows(raw: &str, columns: Option<&[String]>) -> Result<Vec<Row>, CoercionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let json_text: String = trimmed
        .chars()
        .map(|c| match c {
            '(' => '[',
            ')' => ']',
            '\'' => '"',
            other => other,
        })
        .collect();

    let tuples: Vec<Vec<Value>> =
        serde_json::from_str(&json_text).map_err(|e| CoercionError {
            message: e.to_string(),
        })?;

    let names = column_names(columns, &tuples);
    Ok(tuples
        .into_iter()
        .map(|tuple| names.iter().cloned().zip(tuple).collect())
        .collect())
}

fn column_names(columns: Option<&[String]>, tuples: &[Vec<Value>]) -> Vec<String> {
    match columns {
        Some(cols) if !cols.is_empty() => cols.to_vec(),
        _ => {
            let arity = tuples.iter().map(Vec::len).max().unwrap_or(0);
            (0..arity).map(|i| format!("column_{i}")).collect()
        }
    }
}
