// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Lookup criteria and pass-through query options.

use serde_json::Value;

use crate::Row;

/// Equality criteria for `get_by` lookups.
///
/// All pairs must match. Order is kept for repositories that build queries
/// from it.
///
/// # Example
///
/// ```rust
/// use schema_crud_core::Filter;
///
/// let filter = Filter::new().eq("email", "ann@example.com").eq("active", true);
/// assert_eq!(filter.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pairs: Vec<(String, Value)>
}

impl Filter {
    /// Empty filter, matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field = value` criterion.
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.pairs.push((field.to_owned(), value.into()));
        self
    }

    /// Criteria in insertion order.
    pub fn pairs(&self) -> &[(String, Value)] {
        &self.pairs
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no criteria.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Check a storage row against every criterion.
    ///
    /// A field missing from the row compares as `null`.
    pub fn matches(&self, row: &Row) -> bool {
        self.pairs
            .iter()
            .all(|(field, value)| row.get(field).unwrap_or(&Value::Null) == value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect()
        }
    }
}

/// Opaque options handed to the repository unchanged.
///
/// The generated methods never read these; their meaning belongs to the
/// repository implementation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    entries: Vec<(String, Value)>
}

impl QueryOptions {
    /// No options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing a previous value.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_owned(), value))
        }
        self
    }

    /// Value of `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    /// Whether no option was set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
