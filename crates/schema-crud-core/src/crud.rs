// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! The CRUD mixin capability.
//!
//! Every type with `#[derive(Crud)]` implements [`Crud`], which fixes its
//! repository type and exposes its configured unique fields. Relation
//! inserts read the child's [`Crud::unique_fields`], so a parent and its
//! children keep independent uniqueness rules.

use crate::{changeset::Changeset, repository::Repository, schema::Schema};

/// Backend error of the repository configured for `S`.
pub type BackendError<S> = <<S as Crud>::Repo as Repository>::Error;

/// A record type with the CRUD mixin applied.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Schema, Crud)]
/// #[schema(source = "users")]
/// #[crud(repo = "MemoryRepo", unique(email))]
/// pub struct User { ... }
///
/// assert_eq!(User::unique_fields(), &["email"]);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not derive `Crud`",
    label = "`{Self}` needs `#[derive(Crud)]`",
    note = "types listed in `related(...)` must derive `Crud` so their own unique fields apply"
)]
pub trait Crud: Schema {
    /// Repository handling this record type.
    type Repo: Repository;

    /// Fields declared unique on every insert and update, in order.
    fn unique_fields() -> &'static [&'static str];

    /// Relations with generated helpers, in order.
    fn related() -> &'static [&'static str] {
        &[]
    }

    /// Declare this type's own unique fields on `changeset`.
    fn unique_constraints(changeset: Changeset<Self>) -> Changeset<Self> {
        unique_constraints(changeset, Self::unique_fields())
    }
}

/// Declare every field of `fields` unique on `changeset`, in order.
pub fn unique_constraints<S>(changeset: Changeset<S>, fields: &[&str]) -> Changeset<S> {
    fields
        .iter()
        .fold(changeset, |changeset, field| changeset.unique_constraint(field))
}
