// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Persistence handle contract.
//!
//! A [`Repository`] executes writes and lookups for any [`Schema`]. The
//! generated CRUD methods only ever talk to this trait.
//!
//! # Required Behavior
//!
//! | Method | Contract |
//! |--------|----------|
//! | `insert` / `update` | Reject an invalid changeset without touching storage; turn violations of declared constraints into [`ErrorKind::Unique`](crate::ErrorKind::Unique) errors; set the changeset action |
//! | `get` | `None` when no record has the key |
//! | `get_by` | `None` when nothing matches |
//! | `all` | Stable order between calls without writes |
//! | `preload` | Fill the named association slot and return the record |
//!
//! The `*_strict` variants are provided and map failures to [`RepoError`].

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    Persisted,
    changeset::{Changeset, InvalidChangeset},
    query::{Filter, QueryOptions},
    schema::{Schema, SchemaError}
};

/// Error returned by strict operations.
#[derive(Debug, Error)]
pub enum RepoError<E> {
    /// A strict lookup found nothing.
    #[error("no `{schema}` record matched")]
    NotFound {
        /// Source of the schema.
        schema: &'static str
    },

    /// A strict write was rejected by validation or a constraint.
    #[error(transparent)]
    Invalid(#[from] InvalidChangeset),

    /// The repository itself failed.
    #[error("repository error: {0}")]
    Backend(#[source] E)
}

impl<E> RepoError<E> {
    /// Check if this is a [`RepoError::NotFound`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a [`RepoError::Invalid`].
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Borrow the rejected changeset, if any.
    pub fn invalid(&self) -> Option<&InvalidChangeset> {
        match self {
            Self::Invalid(invalid) => Some(invalid),
            _ => None
        }
    }
}

/// Persistence repository.
///
/// `Error` must absorb [`SchemaError`] so encode/decode and association
/// failures surface through the same channel as storage failures.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Backend error type.
    type Error: std::error::Error + From<SchemaError> + Send + Sync + 'static;

    /// Insert a new record.
    async fn insert<S: Schema>(&self, changeset: Changeset<S>) -> Result<Persisted<S>, Self::Error>;

    /// Update an existing record.
    async fn update<S: Schema>(&self, changeset: Changeset<S>) -> Result<Persisted<S>, Self::Error>;

    /// Fetch a record by primary key.
    async fn get<S: Schema>(&self, id: &S::Id, options: &QueryOptions) -> Result<Option<S>, Self::Error>;

    /// Fetch the single record matching `filter`.
    async fn get_by<S: Schema>(
        &self,
        filter: &Filter,
        options: &QueryOptions
    ) -> Result<Option<S>, Self::Error>;

    /// Fetch every record.
    async fn all<S: Schema>(&self, options: &QueryOptions) -> Result<Vec<S>, Self::Error>;

    /// Load the association `relation` into `record`.
    async fn preload<S: Schema>(&self, record: S, relation: &str) -> Result<S, Self::Error>;

    /// Insert, failing with [`RepoError::Invalid`] on rejection.
    async fn insert_strict<S: Schema>(&self, changeset: Changeset<S>) -> Result<S, RepoError<Self::Error>> {
        self.insert(changeset)
            .await
            .map_err(RepoError::Backend)?
            .map_err(|rejected| RepoError::Invalid(rejected.into_invalid()))
    }

    /// Update, failing with [`RepoError::Invalid`] on rejection.
    async fn update_strict<S: Schema>(&self, changeset: Changeset<S>) -> Result<S, RepoError<Self::Error>> {
        self.update(changeset)
            .await
            .map_err(RepoError::Backend)?
            .map_err(|rejected| RepoError::Invalid(rejected.into_invalid()))
    }

    /// Fetch by primary key, failing with [`RepoError::NotFound`].
    async fn get_strict<S: Schema>(
        &self,
        id: &S::Id,
        options: &QueryOptions
    ) -> Result<S, RepoError<Self::Error>> {
        self.get::<S>(id, options)
            .await
            .map_err(RepoError::Backend)?
            .ok_or(RepoError::NotFound {
                schema: S::SOURCE
            })
    }

    /// Fetch by filter, failing with [`RepoError::NotFound`].
    async fn get_by_strict<S: Schema>(
        &self,
        filter: &Filter,
        options: &QueryOptions
    ) -> Result<S, RepoError<Self::Error>> {
        self.get_by::<S>(filter, options)
            .await
            .map_err(RepoError::Backend)?
            .ok_or(RepoError::NotFound {
                schema: S::SOURCE
            })
    }
}
