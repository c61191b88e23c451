// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Change descriptions for record writes.
//!
//! A [`Changeset`] pairs an original record with the field deltas that
//! should be written, the validation errors found so far and the constraints
//! the repository must check at commit time.
//!
//! # Lifecycle
//!
//! ```text
//! Schema::changeset(data, attrs)      cast + validations
//!        │
//!        ▼
//! .unique_constraint("email")         declarations, checked at commit
//!        │
//!        ▼
//! Repository::insert / update         sets the action, commits or
//!        │                            returns the changeset with errors
//!        ▼
//! Ok(record) | Err(changeset)
//! ```
//!
//! Builder methods consume and return the changeset so they chain:
//!
//! ```rust,ignore
//! let changeset = Changeset::cast(User::default(), attrs, User::FIELDS)
//!     .validate_required(&["email"])
//!     .validate_length("name", 2..=64)
//!     .unique_constraint("email");
//! ```

use std::{
    fmt,
    ops::{Bound, RangeBounds}
};

use serde_json::Value;
use thiserror::Error;

use crate::{
    Row,
    schema::{Schema, SchemaError}
};

/// Write operation a changeset was submitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// New record.
    Insert,
    /// Existing record.
    Update
}

impl Action {
    /// Lowercase name of the action.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update"
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Value could not be cast to the field type.
    Cast,
    /// Required value is missing or blank.
    Required,
    /// Value is too short or too long.
    Length,
    /// Value collides with an existing record.
    Unique,
    /// Error added by a custom validation.
    Custom
}

/// Error attached to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name, or `base` for errors not tied to a field.
    pub field:   String,
    /// Human-readable message, e.g. `has already been taken`.
    pub message: String,
    /// Error category.
    pub kind:    ErrorKind
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Uniqueness check declared on a changeset.
///
/// Declarations do nothing by themselves; the repository checks them when
/// committing and turns violations into [`ErrorKind::Unique`] errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Field that must be unique.
    pub field:   String,
    /// Message used when the check fails.
    pub message: String
}

/// Rejected changeset, detached from its record type.
///
/// Payload of [`RepoError::Invalid`](crate::RepoError::Invalid).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{schema}` changeset{}: {}", on_action(.action), describe(.errors))]
pub struct InvalidChangeset {
    /// Source of the schema.
    pub schema: &'static str,
    /// Action the changeset was submitted for.
    pub action: Option<Action>,
    /// Collected errors.
    pub errors: Vec<FieldError>
}

impl InvalidChangeset {
    /// Messages recorded for `field`.
    pub fn errors_on(&self, field: &str) -> Vec<&str> {
        messages_for(&self.errors, field)
    }
}

fn on_action(action: &Option<Action>) -> String {
    action.map(|a| format!(" on {a}")).unwrap_or_default()
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn messages_for<'a>(errors: &'a [FieldError], field: &str) -> Vec<&'a str> {
    errors
        .iter()
        .filter(|e| e.field == field)
        .map(|e| e.message.as_str())
        .collect()
}

/// Change description for one record.
#[derive(Debug, Clone)]
pub struct Changeset<S> {
    data:        S,
    changes:     Row,
    errors:      Vec<FieldError>,
    constraints: Vec<Constraint>,
    action:      Option<Action>
}

impl<S> Changeset<S> {
    /// Start an empty changeset for `data`.
    pub fn new(data: S) -> Self {
        Self {
            data,
            changes: Row::new(),
            errors: Vec::new(),
            constraints: Vec::new(),
            action: None
        }
    }

    /// Original record.
    pub fn data(&self) -> &S {
        &self.data
    }

    /// Take the original record.
    pub fn into_data(self) -> S {
        self.data
    }

    /// Field deltas, in the order they were cast.
    pub fn changes(&self) -> &Row {
        &self.changes
    }

    /// Pending value for `field`, if it changes.
    pub fn get_change(&self, field: &str) -> Option<&Value> {
        self.changes.get(field)
    }

    /// All recorded errors.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Messages recorded for `field`.
    pub fn errors_on(&self, field: &str) -> Vec<&str> {
        messages_for(&self.errors, field)
    }

    /// Whether no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Declared constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Action set by the repository on submission.
    pub fn action(&self) -> Option<Action> {
        self.action
    }

    /// Mark the changeset as submitted for `action`.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Record an error on `field`.
    #[must_use]
    pub fn add_error(mut self, field: &str, message: impl Into<String>, kind: ErrorKind) -> Self {
        self.push_error(field, message, kind);
        self
    }

    /// Record an error on `field` in place.
    pub fn push_error(&mut self, field: &str, message: impl Into<String>, kind: ErrorKind) {
        self.errors.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
            kind
        });
    }

    /// Declare that `field` must be unique.
    ///
    /// Declaring the same field twice keeps the first declaration.
    #[must_use]
    pub fn unique_constraint(self, field: &str) -> Self {
        self.unique_constraint_with_message(field, "has already been taken")
    }

    /// Declare that `field` must be unique, with a custom message.
    #[must_use]
    pub fn unique_constraint_with_message(mut self, field: &str, message: &str) -> Self {
        if !self.constraints.iter().any(|c| c.field == field) {
            self.constraints.push(Constraint {
                field:   field.to_owned(),
                message: message.to_owned()
            });
        }
        self
    }

    fn has_error_on(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl<S: Schema> Changeset<S> {
    /// Apply raw attributes to `data`, keeping only `permitted` fields.
    ///
    /// - `attrs` must be a JSON object; anything else records a `base` error.
    /// - Each permitted key is type-checked against the record type; values
    ///   that do not fit record an `is invalid` error.
    /// - Values equal to the current one are not recorded as changes.
    /// - Keys outside `permitted` are ignored.
    pub fn cast(data: S, attrs: Value, permitted: &[&str]) -> Self {
        let changeset = Self::new(data);
        let Value::Object(params) = attrs else {
            return changeset.add_error("base", "expected a map of attributes", ErrorKind::Cast);
        };
        let base = match changeset.data.to_row() {
            Ok(row) => row,
            Err(_) => {
                return changeset.add_error("base", "could not be encoded", ErrorKind::Cast);
            }
        };

        params
            .into_iter()
            .filter(|(key, _)| permitted.contains(&key.as_str()))
            .fold(changeset, |mut changeset, (key, value)| {
                if base.get(&key) == Some(&value) {
                    return changeset;
                }
                let mut candidate = base.clone();
                candidate.insert(key.clone(), value.clone());
                if S::from_row(candidate).is_ok() {
                    changeset.changes.insert(key, value);
                } else {
                    changeset.push_error(&key, "is invalid", ErrorKind::Cast);
                }
                changeset
            })
    }

    /// Set a change directly, bypassing casting.
    #[must_use]
    pub fn put_change(mut self, field: &str, value: Value) -> Self {
        self.changes.insert(field.to_owned(), value);
        self
    }

    /// Current value of `field`: the pending change, else the original.
    pub fn field(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.changes.get(name) {
            return Some(value.clone());
        }
        self.data.to_row().ok()?.remove(name)
    }

    /// Require `fields` to be present and not blank.
    ///
    /// Fields that already carry an error are skipped.
    #[must_use]
    pub fn validate_required(mut self, fields: &[&str]) -> Self {
        for field in fields {
            if self.has_error_on(field) {
                continue;
            }
            let blank = match self.field(field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false
            };
            if blank {
                self.push_error(field, "can't be blank", ErrorKind::Required);
            }
        }
        self
    }

    /// Require the length of a pending change to fall within `range`.
    ///
    /// Strings are measured in characters, arrays in elements. Fields
    /// without a change, or already carrying an error, are not checked.
    #[must_use]
    pub fn validate_length(mut self, field: &str, range: impl RangeBounds<usize>) -> Self {
        if self.has_error_on(field) {
            return self;
        }
        let len = match self.changes.get(field) {
            Some(Value::String(s)) => s.chars().count(),
            Some(Value::Array(items)) => items.len(),
            _ => return self
        };
        let min = match range.start_bound() {
            Bound::Included(n) => Some(*n),
            Bound::Excluded(n) => Some(n.saturating_add(1)),
            Bound::Unbounded => None
        };
        let max = match range.end_bound() {
            Bound::Included(n) => Some(*n),
            Bound::Excluded(n) => Some(n.saturating_sub(1)),
            Bound::Unbounded => None
        };

        if let Some(min) = min
            && len < min
        {
            self.push_error(
                field,
                format!("should be at least {min} character(s)"),
                ErrorKind::Length
            );
        } else if let Some(max) = max
            && len > max
        {
            self.push_error(
                field,
                format!("should be at most {max} character(s)"),
                ErrorKind::Length
            );
        }
        self
    }

    /// Run `check` on the pending change of `field`.
    ///
    /// Skipped when the change is `null` or the field already has an error.
    /// A returned message is recorded as an [`ErrorKind::Custom`] error.
    #[must_use]
    pub fn validate_change(mut self, field: &str, check: impl FnOnce(&Value) -> Option<String>) -> Self {
        if self.has_error_on(field) {
            return self;
        }
        if let Some(message) = self
            .changes
            .get(field)
            .filter(|value| !value.is_null())
            .and_then(check)
        {
            self.push_error(field, message, ErrorKind::Custom);
        }
        self
    }

    /// Storage row with all pending changes applied.
    ///
    /// # Errors
    ///
    /// Fails when the original record cannot be encoded.
    pub fn to_row(&self) -> Result<Row, SchemaError> {
        let mut row = self.data.to_row()?;
        for (field, value) in &self.changes {
            row.insert(field.clone(), value.clone());
        }
        Ok(row)
    }

    /// Record with all pending changes applied, ignoring validity.
    ///
    /// # Errors
    ///
    /// Fails when the merged row does not decode.
    pub fn apply_changes(&self) -> Result<S, SchemaError> {
        S::from_row(self.to_row()?)
    }

    /// Detach the errors from the record type.
    pub fn into_invalid(self) -> InvalidChangeset {
        InvalidChangeset {
            schema: S::SOURCE,
            action: self.action,
            errors: self.errors
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::fixtures::{Author, Post, has_error};

    fn author() -> Author {
        Author {
            id: 1,
            name: "Ann".into(),
            email: "ann@example.com".into(),
            ..Author::default()
        }
    }

    #[test]
    fn cast_records_only_differences() {
        let cs = Changeset::cast(author(), json!({"name": "Ann", "email": "new@example.com"}), Author::FIELDS);
        assert!(cs.is_valid());
        assert_eq!(cs.changes().len(), 1);
        assert_eq!(cs.get_change("email"), Some(&json!("new@example.com")));
        assert!(cs.get_change("name").is_none());
    }

    #[test]
    fn cast_ignores_unpermitted_keys() {
        let cs = Changeset::cast(author(), json!({"name": "Bob", "role": "admin"}), &["email"]);
        assert!(cs.changes().is_empty());
        assert!(cs.is_valid());
    }

    #[test]
    fn cast_rejects_wrong_types() {
        let cs = Changeset::cast(author(), json!({"id": "seven", "name": "Bob"}), Author::FIELDS);
        assert!(!cs.is_valid());
        assert_eq!(cs.errors_on("id"), vec!["is invalid"]);
        assert!(has_error(cs.errors(), "id", ErrorKind::Cast));
        assert_eq!(cs.get_change("name"), Some(&json!("Bob")));
    }

    #[test]
    fn cast_requires_a_map() {
        let cs = Changeset::cast(author(), json!(["name"]), Author::FIELDS);
        assert_eq!(cs.errors_on("base"), vec!["expected a map of attributes"]);
    }

    #[test]
    fn cast_preserves_attribute_order() {
        let cs = Changeset::cast(Post::default(), json!({"title": "T", "slug": "s"}), Post::FIELDS);
        let keys: Vec<&str> = cs.changes().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "slug"]);
    }

    #[test]
    fn field_prefers_pending_change() {
        let cs = Changeset::cast(author(), json!({"name": "Bob"}), Author::FIELDS);
        assert_eq!(cs.field("name"), Some(json!("Bob")));
        assert_eq!(cs.field("email"), Some(json!("ann@example.com")));
        assert_eq!(cs.field("unknown"), None);
    }

    #[test]
    fn validate_required_flags_blank_values() {
        let cs = Changeset::cast(Author::default(), json!({"name": "   "}), Author::FIELDS)
            .validate_required(&["name", "email"]);
        assert_eq!(cs.errors_on("name"), vec!["can't be blank"]);
        assert_eq!(cs.errors_on("email"), vec!["can't be blank"]);
    }

    #[test]
    fn validate_required_skips_fields_with_errors() {
        let cs = Changeset::cast(Post::default(), json!({"author_id": "x"}), Post::FIELDS)
            .validate_required(&["author_id"]);
        assert_eq!(cs.errors_on("author_id"), vec!["is invalid"]);
    }

    #[test]
    fn validate_length_bounds() {
        let short = Changeset::cast(Post::default(), json!({"title": "a"}), Post::FIELDS)
            .validate_length("title", 2..=5);
        assert_eq!(short.errors_on("title"), vec!["should be at least 2 character(s)"]);

        let long = Changeset::cast(Post::default(), json!({"title": "abcdef"}), Post::FIELDS)
            .validate_length("title", 2..6);
        assert_eq!(long.errors_on("title"), vec!["should be at most 5 character(s)"]);

        let fine = Changeset::cast(Post::default(), json!({"title": "ábc"}), Post::FIELDS)
            .validate_length("title", ..=3);
        assert!(fine.is_valid());
    }

    #[test]
    fn validate_change_only_runs_on_changes() {
        let unchanged = Changeset::cast(author(), json!({}), Author::FIELDS)
            .validate_change("email", |_| Some("never".into()));
        assert!(unchanged.is_valid());

        let changed = Changeset::cast(author(), json!({"email": "nope"}), Author::FIELDS)
            .validate_change("email", |v| (v == "nope").then(|| "rejected".into()));
        assert!(has_error(changed.errors(), "email", ErrorKind::Custom));
    }

    #[test]
    fn validations_skip_fields_with_errors() {
        let cs = Changeset::cast(Author::default(), json!({"name": ""}), Author::FIELDS)
            .validate_required(&["name"])
            .validate_length("name", 2..)
            .validate_change("name", |_| Some("never".into()));
        assert_eq!(cs.errors_on("name"), vec!["can't be blank"]);
    }

    #[test]
    fn unique_constraint_is_idempotent() {
        let cs = Changeset::new(author())
            .unique_constraint("email")
            .unique_constraint("name")
            .unique_constraint("email");
        let fields: Vec<&str> = cs.constraints().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "name"]);
        assert_eq!(cs.constraints()[0].message, "has already been taken");
    }

    #[test]
    fn apply_changes_merges_over_data() {
        let cs = Changeset::cast(author(), json!({"name": "Bob"}), Author::FIELDS);
        let applied = cs.apply_changes().unwrap();
        assert_eq!(applied.name, "Bob");
        assert_eq!(applied.email, "ann@example.com");
        assert_eq!(cs.data().name, "Ann");
    }

    #[test]
    fn into_invalid_describes_errors() {
        let invalid = Changeset::new(author())
            .add_error("email", "has already been taken", ErrorKind::Unique)
            .with_action(Action::Insert)
            .into_invalid();
        assert_eq!(invalid.schema, "authors");
        assert_eq!(invalid.errors_on("email"), vec!["has already been taken"]);
        assert_eq!(
            invalid.to_string(),
            "invalid `authors` changeset on insert: email has already been taken"
        );
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Insert.to_string(), "insert");
        assert_eq!(Action::Update.as_str(), "update");
    }
}
