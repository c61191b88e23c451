// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generic CRUD operations.
//!
//! Every method generated by `#[derive(Crud)]` is a one-line call into this
//! module. The functions can be called directly for types implementing
//! [`Crud`] by hand.
//!
//! # Write Pipeline
//!
//! ```text
//! insert:         S::default() ──► S::changeset(attrs) ──► S::unique_constraints ──► repo.insert
//! update:         record       ──► S::changeset(attrs) ──► S::unique_constraints ──► repo.update
//! insert_related: build_assoc  ──► C::changeset(attrs) ──► C::unique_constraints ──► repo.insert
//! ```
//!
//! Relation inserts run the child's own changeset and unique fields, never
//! the parent's.

use serde_json::Value;
use tracing::debug;

use crate::{
    Persisted,
    crud::{BackendError, Crud},
    query::{Filter, QueryOptions},
    repository::{RepoError, Repository},
    schema::{HasMany, Schema, build_assoc}
};

fn log_outcome<S: Schema>(operation: &'static str, outcome: &Persisted<S>) {
    if let Err(rejected) = outcome {
        debug!(
            schema = S::SOURCE,
            operation,
            errors = rejected.errors().len(),
            "changeset rejected"
        );
    }
}

/// Fetch every record of `S`.
///
/// # Errors
///
/// Backend failure.
pub async fn all<S: Crud>(repo: &S::Repo, options: &QueryOptions) -> Result<Vec<S>, BackendError<S>> {
    debug!(schema = S::SOURCE, operation = "all");
    repo.all::<S>(options).await
}

/// Fetch a record by primary key.
///
/// # Errors
///
/// Backend failure.
pub async fn get<S: Crud>(
    repo: &S::Repo,
    id: &S::Id,
    options: &QueryOptions
) -> Result<Option<S>, BackendError<S>> {
    debug!(schema = S::SOURCE, operation = "get", id = ?id);
    repo.get::<S>(id, options).await
}

/// Fetch a record by primary key, failing when absent.
///
/// # Errors
///
/// [`RepoError::NotFound`] or [`RepoError::Backend`].
pub async fn get_strict<S: Crud>(
    repo: &S::Repo,
    id: &S::Id,
    options: &QueryOptions
) -> Result<S, RepoError<BackendError<S>>> {
    debug!(schema = S::SOURCE, operation = "get_strict", id = ?id);
    repo.get_strict::<S>(id, options).await
}

/// Fetch the single record matching `filter`.
///
/// # Errors
///
/// Backend failure, including more than one match.
pub async fn get_by<S: Crud>(
    repo: &S::Repo,
    filter: &Filter,
    options: &QueryOptions
) -> Result<Option<S>, BackendError<S>> {
    debug!(schema = S::SOURCE, operation = "get_by", criteria = filter.len());
    repo.get_by::<S>(filter, options).await
}

/// Fetch the single record matching `filter`, failing when absent.
///
/// # Errors
///
/// [`RepoError::NotFound`] or [`RepoError::Backend`].
pub async fn get_by_strict<S: Crud>(
    repo: &S::Repo,
    filter: &Filter,
    options: &QueryOptions
) -> Result<S, RepoError<BackendError<S>>> {
    debug!(schema = S::SOURCE, operation = "get_by_strict", criteria = filter.len());
    repo.get_by_strict::<S>(filter, options).await
}

/// Insert a new record built from `attrs`.
///
/// # Errors
///
/// Backend failure. Validation and constraint failures come back as the
/// inner `Err(changeset)`.
pub async fn insert<S: Crud>(repo: &S::Repo, attrs: Value) -> Result<Persisted<S>, BackendError<S>> {
    debug!(schema = S::SOURCE, operation = "insert");
    let changeset = S::unique_constraints(S::changeset(S::default(), attrs));
    let outcome = repo.insert(changeset).await?;
    log_outcome("insert", &outcome);
    Ok(outcome)
}

/// Insert a new record built from `attrs`, failing on rejection.
///
/// # Errors
///
/// [`RepoError::Invalid`] or [`RepoError::Backend`].
pub async fn insert_strict<S: Crud>(repo: &S::Repo, attrs: Value) -> Result<S, RepoError<BackendError<S>>> {
    debug!(schema = S::SOURCE, operation = "insert_strict");
    let changeset = S::unique_constraints(S::changeset(S::default(), attrs));
    repo.insert_strict(changeset).await
}

/// Apply `attrs` to an existing record.
///
/// Fields absent from `attrs` keep their current value.
///
/// # Errors
///
/// Backend failure. Validation and constraint failures come back as the
/// inner `Err(changeset)`.
pub async fn update<S: Crud>(repo: &S::Repo, record: S, attrs: Value) -> Result<Persisted<S>, BackendError<S>> {
    debug!(schema = S::SOURCE, operation = "update");
    let changeset = S::unique_constraints(S::changeset(record, attrs));
    let outcome = repo.update(changeset).await?;
    log_outcome("update", &outcome);
    Ok(outcome)
}

/// Apply `attrs` to an existing record, failing on rejection.
///
/// # Errors
///
/// [`RepoError::Invalid`] or [`RepoError::Backend`].
pub async fn update_strict<S: Crud>(
    repo: &S::Repo,
    record: S,
    attrs: Value
) -> Result<S, RepoError<BackendError<S>>> {
    debug!(schema = S::SOURCE, operation = "update_strict");
    let changeset = S::unique_constraints(S::changeset(record, attrs));
    repo.update_strict(changeset).await
}

/// Insert a child of `parent` through the association `relation`.
///
/// The child starts pre-associated with `parent`, then goes through its own
/// changeset and unique fields. The parent's repository performs the write.
///
/// # Errors
///
/// Backend failure, including an undeclared or mismatched `relation`.
pub async fn insert_related<P: Crud, C: Crud>(
    repo: &P::Repo,
    parent: &P,
    relation: &str,
    attrs: Value
) -> Result<Persisted<C>, BackendError<P>> {
    debug!(schema = P::SOURCE, operation = "insert_related", relation, child = C::SOURCE);
    let child = build_assoc::<P, C>(parent, relation)?;
    let changeset = C::unique_constraints(C::changeset(child, attrs));
    let outcome = repo.insert(changeset).await?;
    log_outcome("insert_related", &outcome);
    Ok(outcome)
}

/// Insert a child of `parent`, failing on rejection.
///
/// # Errors
///
/// [`RepoError::Invalid`] or [`RepoError::Backend`].
pub async fn insert_related_strict<P: Crud, C: Crud>(
    repo: &P::Repo,
    parent: &P,
    relation: &str,
    attrs: Value
) -> Result<C, RepoError<BackendError<P>>> {
    debug!(schema = P::SOURCE, operation = "insert_related_strict", relation, child = C::SOURCE);
    let child = build_assoc::<P, C>(parent, relation)
        .map_err(|err| RepoError::<BackendError<P>>::Backend(err.into()))?;
    let changeset = C::unique_constraints(C::changeset(child, attrs));
    repo.insert_strict(changeset).await
}

/// Preload `relation` on a copy of `parent` and return its children.
///
/// `extract` takes the association slot out of the loaded copy.
///
/// # Errors
///
/// Backend failure, including an undeclared `relation`.
pub async fn related<P: Crud, C: Schema>(
    repo: &P::Repo,
    parent: &P,
    relation: &str,
    extract: impl FnOnce(P) -> HasMany<C> + Send
) -> Result<Vec<C>, BackendError<P>> {
    debug!(schema = P::SOURCE, operation = "related", relation);
    let loaded = repo.preload(parent.clone(), relation).await?;
    Ok(extract(loaded).into_vec())
}
