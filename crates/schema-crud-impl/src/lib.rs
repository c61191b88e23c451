// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]
#![deny(unsafe_code)]

//! Derive macros for schema-crud.
//!
//! Use the `schema-crud` crate instead of depending on this one directly;
//! the generated code refers to `::schema_crud` paths.
//!
//! # Quick Navigation
//!
//! - [`Schema`](macro@Schema) — record metadata, field list, associations
//! - [`Crud`](macro@Crud) — repository-backed CRUD methods and relation helpers
//!
//! # Attribute Quick Reference
//!
//! ## Struct-Level
//!
//! ```rust,ignore
//! #[derive(Schema, Crud)]
//! #[schema(
//!     source = "users",          // Required: storage name
//!     validate = "validate_user" // Optional: fn(Changeset<Self>) -> Changeset<Self>
//! )]
//! #[crud(
//!     repo = "MemoryRepo",       // Required: type implementing Repository
//!     unique(email),             // Optional: fields unique on every write
//!     related(posts)             // Optional: HasMany fields with helpers
//! )]
//! pub struct User { /* ... */ }
//! ```
//!
//! ## Field-Level
//!
//! ```rust,ignore
//! pub struct User {
//!     #[schema(primary_key)]                 // Defaults to the field named `id`
//!     pub id: i64,
//!
//!     pub email: String,
//!
//!     #[has_many(foreign_key = "author_id")] // Defaults to `user_id`
//!     pub posts: HasMany<Post>,
//! }
//! ```

mod crud;
mod schema;
mod utils;

use proc_macro::TokenStream;

/// Derive macro implementing `schema_crud::Schema`.
///
/// # Requirements
///
/// - Named-field struct
/// - `Serialize`, `Deserialize`, `Clone`, `Default` implemented, with field
///   names used as serialized keys
/// - Exactly one primary key: `#[schema(primary_key)]` or a field named `id`
///
/// # Generated Items
///
/// | Item | Value |
/// |------|-------|
/// | `type Id` | Type of the primary key field |
/// | `SOURCE` | `source` attribute |
/// | `PRIMARY_KEY` | Primary key field name |
/// | `FIELDS` | Every field except `HasMany` associations |
/// | `ASSOCIATIONS` | One entry per `HasMany<T>` field |
/// | `changeset` | Cast of all fields, piped through `validate` if set |
/// | `attach` | Decodes preloaded rows into the matching `HasMany` field |
///
/// # Associations
///
/// Every field of type `HasMany<Child>` is an association named after the
/// field. The child's foreign key defaults to `<snake_case struct>_id` and
/// references the parent's primary key.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Default, Serialize, Deserialize, Schema)]
/// #[schema(source = "users")]
/// pub struct User {
///     pub id: i64,
///     pub email: String,
///     pub posts: HasMany<Post>, // Post::user_id
/// }
/// ```
#[proc_macro_derive(Schema, attributes(schema, has_many))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    schema::derive(input)
}

/// Derive macro adding repository-backed CRUD methods.
///
/// Requires `Schema`. Implements `schema_crud::Crud` and adds associated
/// async functions taking the repository as first argument.
///
/// # Generated Methods
///
/// | Method | Returns |
/// |--------|---------|
/// | `all(repo, options)` | `Result<Vec<Self>, E>` |
/// | `get(repo, &id, options)` | `Result<Option<Self>, E>` |
/// | `get_strict(repo, &id, options)` | `Result<Self, RepoError<E>>` |
/// | `get_by(repo, filter, options)` | `Result<Option<Self>, E>` |
/// | `get_by_strict(repo, filter, options)` | `Result<Self, RepoError<E>>` |
/// | `insert(repo, attrs)` | `Result<Persisted<Self>, E>` |
/// | `insert_strict(repo, attrs)` | `Result<Self, RepoError<E>>` |
/// | `update(repo, record, attrs)` | `Result<Persisted<Self>, E>` |
/// | `update_strict(repo, record, attrs)` | `Result<Self, RepoError<E>>` |
///
/// For every `related(rel)` with field `rel: HasMany<Child>`:
///
/// | Method | Returns |
/// |--------|---------|
/// | `insert_rel(repo, &parent, attrs)` | `Result<Persisted<Child>, E>` |
/// | `insert_rel_strict(repo, &parent, attrs)` | `Result<Child, RepoError<E>>` |
/// | `rel(repo, &parent)` | `Result<Vec<Child>, E>` |
///
/// `E` is the repository error. Every insert and update declares the
/// `unique(...)` fields of the written type; relation inserts use the
/// child's own list, so `Child` must derive `Crud` too.
///
/// # Compile Errors
///
/// - `repo` missing
/// - `unique` naming an unknown field or a `HasMany` field
/// - `related` naming a field that is not `HasMany<T>`
/// - duplicate names, or relation helpers colliding with other methods
/// - relation helpers shadowing a `Schema` or `Crud` trait function
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
/// #[schema(source = "users")]
/// #[crud(repo = "MemoryRepo", unique(email), related(posts))]
/// pub struct User {
///     pub id: i64,
///     pub email: String,
///     pub posts: HasMany<Post>,
/// }
///
/// let user = User::insert_strict(&repo, json!({"email": "ann@example.com"})).await?;
/// User::insert_posts_strict(&repo, &user, json!({"title": "Hello"})).await?;
/// assert_eq!(User::posts(&repo, &user).await?.len(), 1);
/// ```
#[proc_macro_derive(Crud, attributes(crud))]
pub fn derive_crud(input: TokenStream) -> TokenStream {
    crud::derive(input)
}
