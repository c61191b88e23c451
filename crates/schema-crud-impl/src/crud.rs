// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Crud derive macro implementation.
//!
//! # Architecture
//!
//! ```text
//! crud.rs (orchestrator)
//! │
//! ├── parse.rs      → CrudDef, RelationDef, name validation
//! ├── context.rs    → Shared tokens (repo, error types)
//! ├── methods.rs    → all, get, get_by, insert, update (+ _strict)
//! └── relations.rs  → insert_<rel>, insert_<rel>_strict, <rel>
//! ```
//!
//! # Generated Code
//!
//! | Item | Purpose |
//! |------|---------|
//! | `impl ::schema_crud::Crud for T` | Repository type, unique fields, relation names |
//! | `impl T { ... }` | Async associated functions delegating to `::schema_crud::ops` |

mod context;
mod methods;
mod parse;
mod relations;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

use self::{context::Context, parse::CrudDef};

/// Main entry point for the Crud derive macro.
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match CrudDef::from_derive_input(&input) {
        Ok(def) => generate(&def).into(),
        Err(err) => err.write_errors().into()
    }
}

fn generate(def: &CrudDef) -> TokenStream2 {
    let ident = &def.ident;
    let (impl_generics, ty_generics, where_clause) = def.generics.split_for_impl();
    let repo = &def.repo;
    let unique = def.unique.iter().map(ToString::to_string);
    let related = def.related.iter().map(|rel| rel.ident.to_string());

    let ctx = Context::new(def);
    let base_methods = ctx.base_methods();
    let relation_methods = ctx.relation_methods();

    quote! {
        impl #impl_generics ::schema_crud::Crud for #ident #ty_generics #where_clause {
            type Repo = #repo;

            fn unique_fields() -> &'static [&'static str] {
                &[#(#unique),*]
            }

            fn related() -> &'static [&'static str] {
                &[#(#related),*]
            }
        }

        impl #impl_generics #ident #ty_generics #where_clause {
            #base_methods
            #relation_methods
        }
    }
}
