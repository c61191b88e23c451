// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Schema derive macro implementation.
//!
//! # Generated Code
//!
//! ```rust,ignore
//! #[derive(Schema)]
//! #[schema(source = "users", validate = "validate_user")]
//! pub struct User {
//!     pub id: i64,
//!     pub email: String,
//!     pub posts: HasMany<Post>,
//! }
//! ```
//!
//! expands to:
//!
//! ```rust,ignore
//! impl ::schema_crud::Schema for User {
//!     type Id = i64;
//!     const SOURCE: &'static str = "users";
//!     const PRIMARY_KEY: &'static str = "id";
//!     const FIELDS: &'static [&'static str] = &["id", "email"];
//!     const ASSOCIATIONS: &'static [::schema_crud::Association] = &[
//!         ::schema_crud::Association::new("posts", <Post as ::schema_crud::Schema>::SOURCE, "user_id", "id"),
//!     ];
//!
//!     fn primary_key(&self) -> &Self::Id { &self.id }
//!     fn changeset(data: Self, attrs: Value) -> Changeset<Self> {
//!         validate_user(Changeset::cast(data, attrs, Self::FIELDS))
//!     }
//!     fn attach(&mut self, relation: &str, rows: Vec<Row>) -> Result<(), SchemaError> { ... }
//! }
//! ```

mod parse;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

use self::parse::SchemaDef;

/// Main entry point for the Schema derive macro.
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match SchemaDef::from_derive_input(&input) {
        Ok(schema) => generate(&schema).into(),
        Err(err) => err.write_errors().into()
    }
}

fn generate(schema: &SchemaDef) -> TokenStream2 {
    let ident = &schema.ident;
    let (impl_generics, ty_generics, where_clause) = schema.generics.split_for_impl();
    let source = &schema.source;
    let pk = schema.primary_key();
    let pk_ident = &pk.ident;
    let pk_ty = &pk.ty;
    let pk_name = pk.name();
    let fields = schema.stored_fields().map(|field| field.name());

    let associations = generate_associations(schema);
    let changeset = generate_changeset(schema);
    let attach = generate_attach(schema);

    quote! {
        impl #impl_generics ::schema_crud::Schema for #ident #ty_generics #where_clause {
            type Id = #pk_ty;

            const SOURCE: &'static str = #source;
            const PRIMARY_KEY: &'static str = #pk_name;
            const FIELDS: &'static [&'static str] = &[#(#fields),*];
            #associations

            fn primary_key(&self) -> &Self::Id {
                &self.#pk_ident
            }

            #changeset
            #attach
        }
    }
}

fn generate_associations(schema: &SchemaDef) -> TokenStream2 {
    if schema.associations().next().is_none() {
        return TokenStream2::new();
    }
    let owner_key = schema.primary_key().name();
    let entries = schema.associations().map(|(field, assoc)| {
        let name = field.name();
        let child = &assoc.child;
        let foreign_key = schema.foreign_key(assoc);
        quote! {
            ::schema_crud::Association::new(
                #name,
                <#child as ::schema_crud::Schema>::SOURCE,
                #foreign_key,
                #owner_key
            )
        }
    });

    quote! {
        const ASSOCIATIONS: &'static [::schema_crud::Association] = &[#(#entries),*];
    }
}

fn generate_changeset(schema: &SchemaDef) -> TokenStream2 {
    let Some(validate) = &schema.validate else {
        return TokenStream2::new();
    };

    quote! {
        fn changeset(
            data: Self,
            attrs: ::schema_crud::Value
        ) -> ::schema_crud::Changeset<Self> {
            #validate(::schema_crud::Changeset::cast(
                data,
                attrs,
                <Self as ::schema_crud::Schema>::FIELDS
            ))
        }
    }
}

fn generate_attach(schema: &SchemaDef) -> TokenStream2 {
    if schema.associations().next().is_none() {
        return TokenStream2::new();
    }
    let arms = schema.associations().map(|(field, assoc)| {
        let name = field.name();
        let ident = &field.ident;
        let child = &assoc.child;
        quote! {
            #name => {
                self.#ident = ::schema_crud::HasMany::Loaded(
                    ::schema_crud::decode_rows::<#child>(rows)?
                );
                ::core::result::Result::Ok(())
            }
        }
    });

    quote! {
        fn attach(
            &mut self,
            relation: &str,
            rows: ::std::vec::Vec<::schema_crud::Row>
        ) -> ::core::result::Result<(), ::schema_crud::SchemaError> {
            match relation {
                #(#arms)*
                _ => ::core::result::Result::Err(::schema_crud::SchemaError::unknown_association(
                    <Self as ::schema_crud::Schema>::SOURCE,
                    relation
                ))
            }
        }
    }
}
