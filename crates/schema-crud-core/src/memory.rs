// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! In-memory [`Repository`].
//!
//! Keeps one table per [`Schema::SOURCE`] behind a single lock. Meant for
//! tests and prototypes; nothing is persisted across process restarts.
//!
//! # Commit Rules
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | changeset already invalid | `Ok(Err(changeset))`, storage untouched |
//! | `null` or `0` integer primary key on insert | next table sequence value |
//! | primary key already stored | [`MemoryError::DuplicateKey`] |
//! | declared unique constraint violated | `Ok(Err(changeset))` with a `Unique` error |
//! | storage index violated, not declared | [`MemoryError::ConstraintViolation`] |
//! | integer key sequence at `i64::MAX` | [`MemoryError::SequenceExhausted`] |
//! | update of a row that is gone | [`MemoryError::StaleRecord`] |
//! | update without changes | record returned, nothing written |
//!
//! Updates merge only the changed fields into the stored row, so fields
//! absent from the changes keep their stored value even when the record
//! passed in is outdated. `null` values never conflict with each other.
//!
//! # Example
//!
//! ```rust,ignore
//! let repo = MemoryRepo::builder()
//!     .unique_index("users", "email")
//!     .build();
//! ```

use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard}
};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    Persisted, Row,
    changeset::{Action, Changeset, ErrorKind},
    query::{Filter, QueryOptions},
    repository::Repository,
    schema::{Schema, SchemaError}
};

/// Error raised by [`MemoryRepo`].
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Encoding, decoding or association failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A row with the same primary key is already stored.
    #[error("duplicate primary key {key} in `{schema}`")]
    DuplicateKey {
        /// Source of the schema.
        schema: &'static str,
        /// Conflicting key.
        key:    Value
    },

    /// A storage index was violated without a matching declared constraint.
    #[error("unique index on `{schema}.{field}` violated by {value}")]
    ConstraintViolation {
        /// Source of the schema.
        schema: &'static str,
        /// Indexed field.
        field:  String,
        /// Conflicting value.
        value:  Value
    },

    /// The record to update has no primary key value.
    #[error("`{schema}` record has no primary key")]
    MissingPrimaryKey {
        /// Source of the schema.
        schema: &'static str
    },

    /// The row to update no longer exists.
    #[error("`{schema}` record is stale, its row no longer exists")]
    StaleRecord {
        /// Source of the schema.
        schema: &'static str
    },

    /// A single-record lookup matched several rows.
    #[error("expected at most one `{schema}` record, found {count}")]
    MultipleResults {
        /// Source of the schema.
        schema: &'static str,
        /// Number of matching rows.
        count:  usize
    },

    /// The table sequence cannot produce another integer key.
    #[error("key sequence of `{schema}` is exhausted")]
    SequenceExhausted {
        /// Source of the schema.
        schema: &'static str
    },

    /// A thread panicked while holding the storage lock.
    #[error("memory storage lock poisoned")]
    Poisoned
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UniqueIndex {
    source: String,
    field:  String
}

#[derive(Debug, Default)]
struct Table {
    rows:     Vec<Row>,
    sequence: i64
}

impl Table {
    fn next_key(&self, schema: &'static str) -> Result<Value, MemoryError> {
        self.sequence
            .checked_add(1)
            .map(Value::from)
            .ok_or(MemoryError::SequenceExhausted {
                schema
            })
    }

    /// Keep the sequence at or above every stored integer key.
    fn advance(&mut self, key: &Value) {
        if let Some(key) = key.as_i64() {
            self.sequence = self.sequence.max(key);
        }
    }

    fn position(&self, field: &str, value: &Value) -> Option<usize> {
        self.rows.iter().position(|row| row.get(field) == Some(value))
    }

    /// Whether another row already holds the non-null value of `field`.
    fn conflicts(&self, row: &Row, field: &str, skip: Option<usize>) -> bool {
        let Some(value) = row.get(field).filter(|v| !v.is_null()) else {
            return false;
        };
        self.rows
            .iter()
            .enumerate()
            .any(|(index, other)| Some(index) != skip && other.get(field) == Some(value))
    }
}

/// Builder for [`MemoryRepo`].
#[derive(Debug, Default)]
pub struct MemoryRepoBuilder {
    indexes: Vec<UniqueIndex>
}

impl MemoryRepoBuilder {
    /// Add a storage-level unique index on `source.field`.
    #[must_use]
    pub fn unique_index(mut self, source: &str, field: &str) -> Self {
        let index = UniqueIndex {
            source: source.to_owned(),
            field:  field.to_owned()
        };
        if !self.indexes.contains(&index) {
            self.indexes.push(index);
        }
        self
    }

    /// Create the repository.
    pub fn build(self) -> MemoryRepo {
        MemoryRepo {
            tables:  RwLock::new(HashMap::new()),
            indexes: self.indexes
        }
    }
}

/// In-memory repository.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    tables:  RwLock<HashMap<String, Table>>,
    indexes: Vec<UniqueIndex>
}

impl MemoryRepo {
    /// Empty repository without storage indexes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start configuring a repository.
    pub fn builder() -> MemoryRepoBuilder {
        MemoryRepoBuilder::default()
    }

    /// Snapshot of the rows stored under `source`, in insertion order.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Poisoned`] if the lock is poisoned.
    pub fn rows(&self, source: &str) -> Result<Vec<Row>, MemoryError> {
        Ok(self
            .read()?
            .get(source)
            .map(|table| table.rows.clone())
            .unwrap_or_default())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Table>>, MemoryError> {
        self.tables.read().map_err(|_| MemoryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Table>>, MemoryError> {
        self.tables.write().map_err(|_| MemoryError::Poisoned)
    }

    fn indexed_fields<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.indexes
            .iter()
            .filter(move |index| index.source == source)
            .map(|index| index.field.as_str())
    }

    fn commit_insert<S: Schema>(&self, changeset: Changeset<S>) -> Result<Persisted<S>, MemoryError> {
        let changeset = changeset.with_action(Action::Insert);
        if !changeset.is_valid() {
            debug!(schema = S::SOURCE, errors = changeset.errors().len(), "insert rejected");
            return Ok(Err(changeset));
        }

        let mut row = changeset.to_row()?;
        let mut tables = self.write()?;
        let table = tables.entry(S::SOURCE.to_owned()).or_default();

        let key = match row.get(S::PRIMARY_KEY) {
            None | Some(Value::Null) => table.next_key(S::SOURCE)?,
            Some(Value::Number(n)) if n.as_i64() == Some(0) => table.next_key(S::SOURCE)?,
            Some(key) => key.clone()
        };
        if table.position(S::PRIMARY_KEY, &key).is_some() {
            return Err(MemoryError::DuplicateKey {
                schema: S::SOURCE,
                key
            });
        }
        row.insert(S::PRIMARY_KEY.to_owned(), key.clone());

        let changeset = check_constraints(changeset, &row, table, None);
        if !changeset.is_valid() {
            debug!(schema = S::SOURCE, errors = changeset.errors().len(), "insert violated constraints");
            return Ok(Err(changeset));
        }
        self.check_indexes::<S>(&row, table, None)?;

        table.advance(&key);
        table.rows.push(row.clone());
        drop(tables);

        trace!(schema = S::SOURCE, %key, "row inserted");
        Ok(Ok(S::from_row(row)?))
    }

    fn commit_update<S: Schema>(&self, changeset: Changeset<S>) -> Result<Persisted<S>, MemoryError> {
        let changeset = changeset.with_action(Action::Update);
        if !changeset.is_valid() {
            debug!(schema = S::SOURCE, errors = changeset.errors().len(), "update rejected");
            return Ok(Err(changeset));
        }
        if changeset.changes().is_empty() {
            return Ok(Ok(changeset.into_data()));
        }

        let key = changeset
            .data()
            .to_row()?
            .remove(S::PRIMARY_KEY)
            .filter(|key| !key.is_null())
            .ok_or(MemoryError::MissingPrimaryKey {
                schema: S::SOURCE
            })?;

        let mut tables = self.write()?;
        let stale = || MemoryError::StaleRecord {
            schema: S::SOURCE
        };
        let table = tables.get_mut(S::SOURCE).ok_or_else(stale)?;
        let index = table.position(S::PRIMARY_KEY, &key).ok_or_else(stale)?;

        let mut row = table.rows[index].clone();
        for (field, value) in changeset.changes() {
            if S::FIELDS.contains(&field.as_str()) {
                row.insert(field.clone(), value.clone());
            }
        }

        if let Some(new_key) = row.get(S::PRIMARY_KEY)
            && *new_key != key
            && table.conflicts(&row, S::PRIMARY_KEY, Some(index))
        {
            return Err(MemoryError::DuplicateKey {
                schema: S::SOURCE,
                key:    new_key.clone()
            });
        }

        let changeset = check_constraints(changeset, &row, table, Some(index));
        if !changeset.is_valid() {
            debug!(schema = S::SOURCE, errors = changeset.errors().len(), "update violated constraints");
            return Ok(Err(changeset));
        }
        self.check_indexes::<S>(&row, table, Some(index))?;

        if let Some(new_key) = row.get(S::PRIMARY_KEY) {
            table.advance(new_key);
        }
        table.rows[index] = row.clone();
        drop(tables);

        trace!(schema = S::SOURCE, %key, "row updated");
        Ok(Ok(S::from_row(row)?))
    }

    fn check_indexes<S: Schema>(&self, row: &Row, table: &Table, skip: Option<usize>) -> Result<(), MemoryError> {
        match self
            .indexed_fields(S::SOURCE)
            .find(|field| table.conflicts(row, field, skip))
        {
            Some(field) => Err(MemoryError::ConstraintViolation {
                schema: S::SOURCE,
                field:  field.to_owned(),
                value:  row.get(field).cloned().unwrap_or(Value::Null)
            }),
            None => Ok(())
        }
    }

    fn find_one<S: Schema>(&self, filter: &Filter) -> Result<Option<Row>, MemoryError> {
        let tables = self.read()?;
        let Some(table) = tables.get(S::SOURCE) else {
            return Ok(None);
        };
        let mut matches = table.rows.iter().filter(|row| filter.matches(row));
        let first = matches.next().cloned();
        let rest = matches.count();
        if rest > 0 {
            return Err(MemoryError::MultipleResults {
                schema: S::SOURCE,
                count:  rest + 1
            });
        }
        Ok(first)
    }

    fn children(&self, related: &str, foreign_key: &str, owner: &Value) -> Result<Vec<Row>, MemoryError> {
        if owner.is_null() {
            return Ok(Vec::new());
        }
        Ok(self
            .read()?
            .get(related)
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter(|row| row.get(foreign_key) == Some(owner))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Record a `Unique` error for every declared constraint `row` violates.
fn check_constraints<S>(mut changeset: Changeset<S>, row: &Row, table: &Table, skip: Option<usize>) -> Changeset<S> {
    let taken: Vec<_> = changeset
        .constraints()
        .iter()
        .filter(|constraint| table.conflicts(row, &constraint.field, skip))
        .cloned()
        .collect();
    for constraint in taken {
        changeset.push_error(&constraint.field, constraint.message, ErrorKind::Unique);
    }
    changeset
}

#[async_trait]
impl Repository for MemoryRepo {
    type Error = MemoryError;

    async fn insert<S: Schema>(&self, changeset: Changeset<S>) -> Result<Persisted<S>, MemoryError> {
        self.commit_insert(changeset)
    }

    async fn update<S: Schema>(&self, changeset: Changeset<S>) -> Result<Persisted<S>, MemoryError> {
        self.commit_update(changeset)
    }

    async fn get<S: Schema>(&self, id: &S::Id, _options: &QueryOptions) -> Result<Option<S>, MemoryError> {
        let key = serde_json::to_value(id).map_err(|error| SchemaError::Encode {
            schema: S::SOURCE,
            error
        })?;
        let filter = Filter::new().eq(S::PRIMARY_KEY, key);
        self.find_one::<S>(&filter)?
            .map(S::from_row)
            .transpose()
            .map_err(MemoryError::from)
    }

    async fn get_by<S: Schema>(
        &self,
        filter: &Filter,
        _options: &QueryOptions
    ) -> Result<Option<S>, MemoryError> {
        self.find_one::<S>(filter)?
            .map(S::from_row)
            .transpose()
            .map_err(MemoryError::from)
    }

    async fn all<S: Schema>(&self, _options: &QueryOptions) -> Result<Vec<S>, MemoryError> {
        let rows = self.rows(S::SOURCE)?;
        rows.into_iter()
            .map(|row| S::from_row(row).map_err(MemoryError::from))
            .collect()
    }

    async fn preload<S: Schema>(&self, mut record: S, relation: &str) -> Result<S, MemoryError> {
        let assoc =
            S::association(relation).ok_or_else(|| SchemaError::unknown_association(S::SOURCE, relation))?;
        let owner = record
            .to_row()?
            .remove(assoc.owner_key)
            .unwrap_or(Value::Null);
        let rows = self.children(assoc.related, assoc.foreign_key, &owner)?;
        trace!(schema = S::SOURCE, relation, count = rows.len(), "association preloaded");
        record.attach(relation, rows)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::fixtures::{Author, Post, has_error};

    fn author_changeset(attrs: Value) -> Changeset<Author> {
        Author::changeset(Author::default(), attrs).unique_constraint("email")
    }

    async fn insert_author(repo: &MemoryRepo, name: &str, email: &str) -> Author {
        repo.insert(author_changeset(json!({"name": name, "email": email})))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_sequential_keys() {
        let repo = MemoryRepo::new();
        let ann = insert_author(&repo, "Ann", "ann@example.com").await;
        let bob = insert_author(&repo, "Bob", "bob@example.com").await;
        assert_eq!((ann.id, bob.id), (1, 2));
        assert_eq!(repo.rows("authors").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn explicit_keys_advance_the_sequence() {
        let repo = MemoryRepo::new();
        let cs = Author::changeset(Author::default(), json!({"id": 10, "name": "Ann", "email": "a@x.io"}));
        assert_eq!(repo.insert(cs).await.unwrap().unwrap().id, 10);
        assert_eq!(insert_author(&repo, "Bob", "b@x.io").await.id, 11);
    }

    #[tokio::test]
    async fn duplicate_key_is_a_backend_error() {
        let repo = MemoryRepo::new();
        let attrs = json!({"id": 5, "name": "Ann", "email": "a@x.io"});
        repo.insert(Author::changeset(Author::default(), attrs.clone()))
            .await
            .unwrap()
            .unwrap();
        let err = repo
            .insert(Author::changeset(Author::default(), attrs))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::DuplicateKey { schema: "authors", .. }));
    }

    #[tokio::test]
    async fn invalid_changeset_is_not_stored() {
        let repo = MemoryRepo::new();
        let rejected = repo
            .insert(author_changeset(json!({"email": "a@x.io"})))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(rejected.action(), Some(Action::Insert));
        assert!(has_error(rejected.errors(), "name", ErrorKind::Required));
        assert!(repo.rows("authors").unwrap().is_empty());
    }

    #[tokio::test]
    async fn declared_constraint_becomes_changeset_error() {
        let repo = MemoryRepo::new();
        insert_author(&repo, "Ann", "ann@example.com").await;
        let rejected = repo
            .insert(author_changeset(json!({"name": "Impostor", "email": "ann@example.com"})))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(rejected.errors_on("email"), vec!["has already been taken"]);
        assert!(has_error(rejected.errors(), "email", ErrorKind::Unique));
        assert_eq!(repo.rows("authors").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn undeclared_index_violation_is_a_backend_error() {
        let repo = MemoryRepo::builder().unique_index("authors", "name").build();
        insert_author(&repo, "Ann", "ann@example.com").await;
        let err = repo
            .insert(author_changeset(json!({"name": "Ann", "email": "other@example.com"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unique index on `authors.name` violated by \"Ann\"");
    }

    #[tokio::test]
    async fn declared_constraint_covers_index() {
        let repo = MemoryRepo::builder().unique_index("authors", "email").build();
        insert_author(&repo, "Ann", "ann@example.com").await;
        let outcome = repo
            .insert(author_changeset(json!({"name": "Bob", "email": "ann@example.com"})))
            .await
            .unwrap();
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn update_writes_changes_and_ignores_own_row() {
        let repo = MemoryRepo::new();
        let ann = insert_author(&repo, "Ann", "ann@example.com").await;
        let cs = Author::changeset(ann, json!({"name": "Annie"})).unique_constraint("email");
        let updated = repo.update(cs).await.unwrap().unwrap();
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.email, "ann@example.com");
        assert_eq!(repo.rows("authors").unwrap()[0]["name"], json!("Annie"));
    }

    #[tokio::test]
    async fn update_without_changes_returns_record() {
        let repo = MemoryRepo::new();
        let ann = insert_author(&repo, "Ann", "ann@example.com").await;
        let same = repo
            .update(Author::changeset(ann.clone(), json!({"name": "Ann"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same, ann);
    }

    #[tokio::test]
    async fn update_with_outdated_record_keeps_stored_fields() {
        let repo = MemoryRepo::new();
        let ann = insert_author(&repo, "Ann", "ann@example.com").await;
        repo.update(Author::changeset(ann.clone(), json!({"name": "Annie"})))
            .await
            .unwrap()
            .unwrap();

        let updated = repo
            .update(Author::changeset(ann, json!({"email": "annie@example.com"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.email, "annie@example.com");

        let stored = &repo.rows("authors").unwrap()[0];
        assert_eq!(stored["name"], json!("Annie"));
        assert_eq!(stored["email"], json!("annie@example.com"));
    }

    #[tokio::test]
    async fn key_change_on_update_advances_the_sequence() {
        let repo = MemoryRepo::new();
        let ann = insert_author(&repo, "Ann", "ann@example.com").await;
        let moved = repo
            .update(Author::changeset(ann, json!({"id": 5})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.id, 5);
        assert_eq!(insert_author(&repo, "Bob", "bob@example.com").await.id, 6);
    }

    #[tokio::test]
    async fn exhausted_sequence_is_a_backend_error() {
        let repo = MemoryRepo::new();
        let attrs = json!({"id": i64::MAX, "name": "Max", "email": "m@x.io"});
        let last = Author::changeset(Author::default(), attrs);
        assert_eq!(repo.insert(last).await.unwrap().unwrap().id, i64::MAX);

        let err = repo
            .insert(author_changeset(json!({"name": "Bob", "email": "b@x.io"})))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::SequenceExhausted { schema: "authors" }));
        assert_eq!(err.to_string(), "key sequence of `authors` is exhausted");
        assert_eq!(repo.rows("authors").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_stale() {
        let repo = MemoryRepo::new();
        let ghost = Author {
            id: 99,
            ..Author::default()
        };
        let err = repo
            .update(Author::changeset(ghost, json!({"name": "Ghost"})))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::StaleRecord { schema: "authors" }));
    }

    #[tokio::test]
    async fn get_and_get_by() {
        let repo = MemoryRepo::new();
        let ann = insert_author(&repo, "Ann", "ann@example.com").await;
        insert_author(&repo, "Bob", "bob@example.com").await;
        let options = QueryOptions::new();

        assert_eq!(repo.get::<Author>(&ann.id, &options).await.unwrap(), Some(ann.clone()));
        assert_eq!(repo.get::<Author>(&42, &options).await.unwrap(), None);

        let filter = Filter::new().eq("email", "ann@example.com");
        assert_eq!(repo.get_by::<Author>(&filter, &options).await.unwrap(), Some(ann));

        let err = repo
            .get_by::<Author>(&Filter::new(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::MultipleResults { count: 2, .. }));
    }

    #[tokio::test]
    async fn all_keeps_insertion_order() {
        let repo = MemoryRepo::new();
        assert!(repo.all::<Author>(&QueryOptions::new()).await.unwrap().is_empty());
        insert_author(&repo, "Ann", "ann@example.com").await;
        insert_author(&repo, "Bob", "bob@example.com").await;
        let names: Vec<String> = repo
            .all::<Author>(&QueryOptions::new())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
    }

    #[tokio::test]
    async fn preload_attaches_matching_children() {
        let repo = MemoryRepo::new();
        let ann = insert_author(&repo, "Ann", "ann@example.com").await;
        let bob = insert_author(&repo, "Bob", "bob@example.com").await;
        for (author_id, slug) in [(ann.id, "one"), (bob.id, "two"), (ann.id, "three")] {
            let cs = Post::changeset(Post::default(), json!({"author_id": author_id, "slug": slug}));
            repo.insert(cs).await.unwrap().unwrap();
        }

        let loaded = repo.preload(ann, "posts").await.unwrap();
        let slugs: Vec<String> = loaded.posts.into_vec().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn preload_unknown_relation() {
        let repo = MemoryRepo::new();
        let err = repo.preload(Author::default(), "comments").await.unwrap_err();
        assert!(matches!(
            err,
            MemoryError::Schema(SchemaError::UnknownAssociation { schema: "authors", .. })
        ));
    }
}
