// crates/flight-atlas-core/src/core/rows.rs
// ============================================================================
// Module: Flight Atlas Result Rows
// Description: Ordered column-to-value rows decoded from engine results.
// Purpose: Carry tabular backend output into the transformer.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A result row is an ordered mapping of column name to string value, decoded
//! from the delimited output of a completed engine job. Column order follows
//! the result header; lookups are by name. Values are untrusted and parsed
//! per-field by the transformer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Result Row
// ============================================================================

/// Ordered mapping of column name to string value.
///
/// # Invariants
/// - Column order matches the source header; duplicate names resolve to the
///   first occurrence on lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow {
    /// Column name/value pairs in header order.
    columns: Vec<(String, String)>,
}

impl ResultRow {
    /// Creates a row from column name/value pairs in header order.
    #[must_use]
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self {
            columns,
        }
    }

    /// Looks up a column value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates column name/value pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(column, value)| (column.as_str(), value.as_str()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::ResultRow;

    #[test]
    fn lookup_is_by_name_and_first_wins() {
        let row = ResultRow::new(vec![
            ("iata".to_string(), "SEA".to_string()),
            ("title".to_string(), "Seattle".to_string()),
            ("iata".to_string(), "JFK".to_string()),
        ]);
        assert_eq!(row.get("iata"), Some("SEA"));
        assert_eq!(row.get("title"), Some("Seattle"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 3);
    }
}
