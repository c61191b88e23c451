// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation context for Crud methods.

use proc_macro2::TokenStream;
use quote::quote;

use super::parse::CrudDef;

/// Precomputed tokens shared by every generated method.
///
/// | Field | Tokens |
/// |-------|--------|
/// | `repo` | `&<Self as ::schema_crud::Crud>::Repo` |
/// | `error` | `::schema_crud::BackendError<Self>` |
/// | `strict_error` | `::schema_crud::RepoError<::schema_crud::BackendError<Self>>` |
pub struct Context<'a> {
    /// Parsed definition.
    pub def:          &'a CrudDef,
    /// Repository parameter type.
    pub repo:         TokenStream,
    /// Error of non-raising methods.
    pub error:        TokenStream,
    /// Error of `_strict` methods.
    pub strict_error: TokenStream
}

impl<'a> Context<'a> {
    /// Create a context for `def`.
    pub fn new(def: &'a CrudDef) -> Self {
        Self {
            def,
            repo: quote! { &<Self as ::schema_crud::Crud>::Repo },
            error: quote! { ::schema_crud::BackendError<Self> },
            strict_error: quote! { ::schema_crud::RepoError<::schema_crud::BackendError<Self>> }
        }
    }
}
