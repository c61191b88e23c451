// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Per-relation helpers.
//!
//! For `related(posts)` with `posts: HasMany<Post>`:
//!
//! ```text
//! insert_posts(repo, &parent, attrs)         Post pre-associated with parent,
//! insert_posts_strict(repo, &parent, attrs)  Post::changeset, Post's unique fields
//! posts(repo, &parent)                       preload + take the collection
//! ```

use proc_macro2::TokenStream;
use quote::quote;

use super::{context::Context, parse::RelationDef};

impl Context<'_> {
    /// Helpers for every declared relation, in declaration order.
    pub fn relation_methods(&self) -> TokenStream {
        let methods = self.def.related.iter().map(|rel| self.relation(rel));
        quote! { #(#methods)* }
    }

    fn relation(&self, rel: &RelationDef) -> TokenStream {
        let vis = &self.def.vis;
        let repo = &self.repo;
        let error = &self.error;
        let strict_error = &self.strict_error;
        let ident = &rel.ident;
        let name = ident.to_string();
        let child = &rel.child;
        let insert = rel.insert_ident();
        let insert_strict = rel.insert_strict_ident();

        let insert_doc = format!(" Insert a `{name}` child of `parent` built from `attrs`.");
        let strict_doc = format!(" Insert a `{name}` child of `parent`, failing with `RepoError::Invalid`.");
        let accessor_doc = format!(" Load the `{name}` of `parent`.");

        quote! {
            #[doc = #insert_doc]
            #vis async fn #insert(
                repo: #repo,
                parent: &Self,
                attrs: ::schema_crud::Value
            ) -> ::core::result::Result<::schema_crud::Persisted<#child>, #error> {
                ::schema_crud::ops::insert_related::<Self, #child>(repo, parent, #name, attrs).await
            }

            #[doc = #strict_doc]
            #vis async fn #insert_strict(
                repo: #repo,
                parent: &Self,
                attrs: ::schema_crud::Value
            ) -> ::core::result::Result<#child, #strict_error> {
                ::schema_crud::ops::insert_related_strict::<Self, #child>(repo, parent, #name, attrs).await
            }

            #[doc = #accessor_doc]
            #vis async fn #ident(
                repo: #repo,
                parent: &Self
            ) -> ::core::result::Result<::std::vec::Vec<#child>, #error> {
                ::schema_crud::ops::related::<Self, #child>(repo, parent, #name, |record| record.#ident).await
            }
        }
    }
}
