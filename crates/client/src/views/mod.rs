//! View models: each view loads its queries through the [`AppContext`]
//! cache and renders itself as a plain-text panel via `Display`.
//!
//! [`AppContext`]: crate::AppContext

pub mod alerts;
pub mod analytics;
pub mod anomalies;
pub mod components;
pub mod control_room;
pub mod incidents;
pub mod queries;

use std::fmt;

use crate::error::ApiError;

/// Outcome of one query as a view sees it.
///
/// A failed query carries only its message; views never substitute a
/// default value for it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Ready(T),
    Failed(String),
    /// The query's precondition did not hold, so it was not sent.
    Disabled,
}

impl<T> QueryState<T> {
    /// Convert a query result, logging failures under `what`.
    pub fn from_result(what: &'static str, result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => QueryState::Ready(value),
            Err(e) => {
                tracing::warn!(query = what, error = %e, "Query failed");
                QueryState::Failed(e.to_string())
            }
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, QueryState::Ready(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryState::Failed(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, QueryState::Disabled)
    }
}

// ---------------------------------------------------------------------------
// Panel rendering helpers
// ---------------------------------------------------------------------------

pub(crate) fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "== {title} ==")
}

/// Render a titled section, or its error/disabled placeholder.
pub(crate) fn section<T>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    state: &QueryState<T>,
    render: impl FnOnce(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    writeln!(f, "-- {title} --")?;
    match state {
        QueryState::Ready(value) => render(f, value),
        QueryState::Failed(message) => writeln!(f, "  error: {message}"),
        QueryState::Disabled => writeln!(f, "  (not loaded)"),
    }
}

/// One line per JSON row, for endpoints whose rows are only tabulated.
pub(crate) fn json_rows(f: &mut fmt::Formatter<'_>, rows: &[serde_json::Value]) -> fmt::Result {
    if rows.is_empty() {
        return writeln!(f, "  (no data)");
    }
    for row in rows {
        writeln!(f, "  {row}")?;
    }
    Ok(())
}

pub(crate) fn json_map(
    f: &mut fmt::Formatter<'_>,
    map: &serde_json::Map<String, serde_json::Value>,
) -> fmt::Result {
    if map.is_empty() {
        return writeln!(f, "  (no data)");
    }
    for (key, value) in map {
        writeln!(f, "  {key}: {value}")?;
    }
    Ok(())
}
