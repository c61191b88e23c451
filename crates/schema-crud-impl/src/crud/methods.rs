// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Base CRUD methods present on every record type.
//!
//! Each method is a single call into `::schema_crud::ops`. Writes always go
//! through the type's own unique fields.

use proc_macro2::TokenStream;
use quote::quote;

use super::context::Context;

impl Context<'_> {
    /// `all`, `get`, `get_by`, `insert`, `update` and their `_strict` forms.
    pub fn base_methods(&self) -> TokenStream {
        let all = self.all_method();
        let get = self.get_methods();
        let get_by = self.get_by_methods();
        let insert = self.insert_methods();
        let update = self.update_methods();

        quote! {
            #all
            #get
            #get_by
            #insert
            #update
        }
    }

    fn all_method(&self) -> TokenStream {
        let vis = &self.def.vis;
        let repo = &self.repo;
        let error = &self.error;

        quote! {
            /// Fetch every record.
            #vis async fn all(
                repo: #repo,
                options: ::schema_crud::QueryOptions
            ) -> ::core::result::Result<::std::vec::Vec<Self>, #error> {
                ::schema_crud::ops::all::<Self>(repo, &options).await
            }
        }
    }

    fn get_methods(&self) -> TokenStream {
        let vis = &self.def.vis;
        let repo = &self.repo;
        let error = &self.error;
        let strict_error = &self.strict_error;

        quote! {
            /// Fetch a record by primary key.
            #vis async fn get(
                repo: #repo,
                id: &<Self as ::schema_crud::Schema>::Id,
                options: ::schema_crud::QueryOptions
            ) -> ::core::result::Result<::core::option::Option<Self>, #error> {
                ::schema_crud::ops::get::<Self>(repo, id, &options).await
            }

            /// Fetch a record by primary key, failing with `RepoError::NotFound`.
            #vis async fn get_strict(
                repo: #repo,
                id: &<Self as ::schema_crud::Schema>::Id,
                options: ::schema_crud::QueryOptions
            ) -> ::core::result::Result<Self, #strict_error> {
                ::schema_crud::ops::get_strict::<Self>(repo, id, &options).await
            }
        }
    }

    fn get_by_methods(&self) -> TokenStream {
        let vis = &self.def.vis;
        let repo = &self.repo;
        let error = &self.error;
        let strict_error = &self.strict_error;

        quote! {
            /// Fetch the single record matching `filter`.
            #vis async fn get_by(
                repo: #repo,
                filter: ::schema_crud::Filter,
                options: ::schema_crud::QueryOptions
            ) -> ::core::result::Result<::core::option::Option<Self>, #error> {
                ::schema_crud::ops::get_by::<Self>(repo, &filter, &options).await
            }

            /// Fetch the single record matching `filter`, failing with `RepoError::NotFound`.
            #vis async fn get_by_strict(
                repo: #repo,
                filter: ::schema_crud::Filter,
                options: ::schema_crud::QueryOptions
            ) -> ::core::result::Result<Self, #strict_error> {
                ::schema_crud::ops::get_by_strict::<Self>(repo, &filter, &options).await
            }
        }
    }

    fn insert_methods(&self) -> TokenStream {
        let vis = &self.def.vis;
        let repo = &self.repo;
        let error = &self.error;
        let strict_error = &self.strict_error;

        quote! {
            /// Insert a record built from `attrs`.
            ///
            /// A rejected changeset comes back as the inner `Err`.
            #vis async fn insert(
                repo: #repo,
                attrs: ::schema_crud::Value
            ) -> ::core::result::Result<::schema_crud::Persisted<Self>, #error> {
                ::schema_crud::ops::insert::<Self>(repo, attrs).await
            }

            /// Insert a record built from `attrs`, failing with `RepoError::Invalid`.
            #vis async fn insert_strict(
                repo: #repo,
                attrs: ::schema_crud::Value
            ) -> ::core::result::Result<Self, #strict_error> {
                ::schema_crud::ops::insert_strict::<Self>(repo, attrs).await
            }
        }
    }

    fn update_methods(&self) -> TokenStream {
        let vis = &self.def.vis;
        let repo = &self.repo;
        let error = &self.error;
        let strict_error = &self.strict_error;

        quote! {
            /// Apply `attrs` to `record`.
            ///
            /// A rejected changeset comes back as the inner `Err`.
            #vis async fn update(
                repo: #repo,
                record: Self,
                attrs: ::schema_crud::Value
            ) -> ::core::result::Result<::schema_crud::Persisted<Self>, #error> {
                ::schema_crud::ops::update::<Self>(repo, record, attrs).await
            }

            /// Apply `attrs` to `record`, failing with `RepoError::Invalid`.
            #vis async fn update_strict(
                repo: #repo,
                record: Self,
                attrs: ::schema_crud::Value
            ) -> ::core::result::Result<Self, #strict_error> {
                ::schema_crud::ops::update_strict::<Self>(repo, record, attrs).await
            }
        }
    }
}
