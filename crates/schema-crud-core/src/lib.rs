// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Core traits and types for schema-crud.
//!
//! This crate provides everything the `#[derive(Schema)]` and
//! `#[derive(Crud)]` generated code delegates to. It can also be used
//! standalone with hand-written implementations.
//!
//! # Overview
//!
//! - [`Schema`] — Record type metadata, casting and association slots
//! - [`Changeset`] — Field deltas, validation errors and declared constraints
//! - [`Repository`] — Persistence handle contract (insert, update, get, ...)
//! - [`Crud`] — Capability of a record type with the CRUD mixin applied
//! - [`ops`] — Generic CRUD operations the generated methods call
//! - [`memory`] — In-memory [`Repository`] (feature `memory`)
//!
//! # Result Shapes
//!
//! Every write comes in two flavours:
//!
//! | Flavour | Return type | Failure |
//! |---------|-------------|---------|
//! | tagged | `Result<Persisted<S>, E>` | inner `Err(Changeset<S>)` with errors |
//! | strict | `Result<S, RepoError<E>>` | `RepoError::Invalid` |
//!
//! The outer error `E` is always the repository's backend error.
//!
//! # Manual Implementation
//!
//! ```rust,ignore
//! use schema_crud_core::prelude::*;
//!
//! impl Crud for User {
//!     type Repo = MemoryRepo;
//!
//!     fn unique_fields() -> &'static [&'static str] {
//!         &["email"]
//!     }
//! }
//!
//! let user = ops::insert::<User>(&repo, json!({"email": "a@b.c"})).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod changeset;
pub mod crud;
#[cfg(feature = "memory")]
#[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
pub mod memory;
pub mod ops;
pub mod prelude;
pub mod query;
pub mod repository;
pub mod schema;

/// Re-export async_trait for repository implementations.
pub use async_trait::async_trait;
pub use changeset::{Action, Changeset, Constraint, ErrorKind, FieldError, InvalidChangeset};
pub use crud::{BackendError, Crud, unique_constraints};
#[cfg(feature = "memory")]
pub use memory::{MemoryError, MemoryRepo, MemoryRepoBuilder};
pub use query::{Filter, QueryOptions};
pub use repository::{RepoError, Repository};
pub use schema::{Association, HasMany, Schema, SchemaError, build_assoc, decode_rows};
pub use serde_json::{Map, Value};

/// Storage form of a single record: field name to JSON value.
///
/// Keys follow the order of [`Schema::FIELDS`].
pub type Row = Map<String, Value>;

/// Outcome of a tagged write.
///
/// `Ok` carries the persisted record, `Err` the rejected changeset with its
/// errors populated.
pub type Persisted<S> = Result<S, Changeset<S>>;
