// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! # schema-crud
//!
//! Repository-backed CRUD methods for schema types. Re-exports:
//! - [`Schema`](macro@Schema) and [`Crud`](macro@Crud) derive macros from
//!   `schema-crud-impl`
//! - All types from `schema-crud-core` ([`Changeset`], [`Repository`],
//!   [`MemoryRepo`], [`ops`], ...)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use schema_crud::{Crud, HasMany, MemoryRepo, Schema};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
//! #[schema(source = "users")]
//! #[crud(repo = "MemoryRepo", unique(email), related(posts))]
//! pub struct User {
//!     pub id: i64,
//!     pub email: String,
//!     pub posts: HasMany<Post>,
//! }
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
//! #[schema(source = "posts")]
//! #[crud(repo = "MemoryRepo", unique(slug))]
//! pub struct Post {
//!     pub id: i64,
//!     pub user_id: i64,
//!     pub slug: String,
//! }
//!
//! let repo = MemoryRepo::new();
//! let user = User::insert_strict(&repo, json!({"email": "ann@example.com"})).await?;
//!
//! // Second insert with the same email comes back as a changeset with errors
//! let rejected = User::insert(&repo, json!({"email": "ann@example.com"})).await?.unwrap_err();
//! assert_eq!(rejected.errors_on("email"), ["has already been taken"]);
//!
//! User::insert_posts_strict(&repo, &user, json!({"slug": "hello"})).await?;
//! assert_eq!(User::posts(&repo, &user).await?.len(), 1);
//! ```

pub use schema_crud_core::*;
pub use schema_crud_impl::{Crud, Schema};
