// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Attribute parsing for the Crud derive.
//!
//! # Supported Attributes
//!
//! | Attribute | Required | Default | Description |
//! |-----------|----------|---------|-------------|
//! | `repo` | Yes | — | Type implementing `Repository` |
//! | `unique(...)` | No | empty | Stored fields declared unique on every write |
//! | `related(...)` | No | empty | `HasMany<T>` fields with generated helpers |
//!
//! Names are checked against the struct fields so mistakes fail at compile
//! time instead of on the first write.

use darling::{FromDeriveInput, util::PathList};
use quote::format_ident;
use syn::{DeriveInput, Generics, Ident, Path, Type, Visibility};

use crate::utils::{has_many_inner, named_fields};

/// Method names generated for every record type.
pub const BASE_METHODS: &[&str] = &[
    "all",
    "get",
    "get_strict",
    "get_by",
    "get_by_strict",
    "insert",
    "insert_strict",
    "update",
    "update_strict"
];

/// `Schema` and `Crud` trait functions an inherent helper would shadow.
pub const TRAIT_FUNCTIONS: &[&str] = &[
    "primary_key",
    "changeset",
    "attach",
    "association",
    "to_row",
    "from_row",
    "unique_fields",
    "related",
    "unique_constraints"
];

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(crud), supports(struct_named))]
struct CrudAttrs {
    ident:    Ident,
    vis:      Visibility,
    generics: Generics,
    repo:     Path,
    #[darling(default)]
    unique:   PathList,
    #[darling(default)]
    related:  PathList
}

/// A `related(...)` entry resolved against its field.
#[derive(Debug)]
pub struct RelationDef {
    /// Relation name, equal to the field name.
    pub ident: Ident,
    /// Child record type.
    pub child: Type
}

impl RelationDef {
    /// `insert_<rel>`.
    pub fn insert_ident(&self) -> Ident {
        format_ident!("insert_{}", self.ident)
    }

    /// `insert_<rel>_strict`.
    pub fn insert_strict_ident(&self) -> Ident {
        format_ident!("insert_{}_strict", self.ident)
    }

    /// Every method name generated for this relation.
    pub fn method_names(&self) -> [String; 3] {
        [
            self.ident.to_string(),
            self.insert_ident().to_string(),
            self.insert_strict_ident().to_string()
        ]
    }
}

/// Complete parsed Crud definition.
#[derive(Debug)]
pub struct CrudDef {
    /// Struct identifier.
    pub ident:    Ident,
    /// Struct visibility, reused for generated methods.
    pub vis:      Visibility,
    /// Struct generics.
    pub generics: Generics,
    /// Repository type.
    pub repo:     Path,
    /// Unique fields, in declaration order.
    pub unique:   Vec<Ident>,
    /// Relations, in declaration order.
    pub related:  Vec<RelationDef>
}

impl CrudDef {
    /// Parse and validate a Crud definition.
    ///
    /// # Errors
    ///
    /// All problems are reported together:
    ///
    /// - `repo` missing, or the input is not a named-field struct
    /// - an entry that is not a plain identifier
    /// - an unknown field, or a duplicate entry
    /// - `unique` naming a `HasMany` field
    /// - `related` naming a field that is not `HasMany<T>`
    /// - relation helpers colliding with another generated method or
    ///   shadowing a `Schema`/`Crud` trait function
    pub fn from_derive_input(input: &DeriveInput) -> darling::Result<Self> {
        let attrs = CrudAttrs::from_derive_input(input)?;
        let fields = named_fields(input, "Crud")?;
        let field_type = |ident: &Ident| {
            fields
                .iter()
                .find(|field| field.ident.as_ref() == Some(ident))
                .map(|field| &field.ty)
        };

        let mut errors = darling::Error::accumulator();

        let mut unique: Vec<Ident> = Vec::new();
        for path in attrs.unique.iter() {
            let Some(ident) = errors.handle(plain_ident(path, "unique")) else {
                continue;
            };
            if unique.contains(&ident) {
                errors.push(
                    darling::Error::custom(format!("duplicate unique field `{ident}`")).with_span(&ident)
                );
                continue;
            }
            match field_type(&ident) {
                None => errors.push(
                    darling::Error::custom(format!("unknown field `{ident}` in `unique`")).with_span(&ident)
                ),
                Some(ty) if has_many_inner(ty).is_some() => errors.push(
                    darling::Error::custom(format!("`{ident}` is an association and cannot be unique"))
                        .with_span(&ident)
                ),
                Some(_) => unique.push(ident)
            }
        }

        let mut related: Vec<RelationDef> = Vec::new();
        for path in attrs.related.iter() {
            let Some(ident) = errors.handle(plain_ident(path, "related")) else {
                continue;
            };
            if related.iter().any(|rel| rel.ident == ident) {
                errors.push(
                    darling::Error::custom(format!("duplicate relation `{ident}`")).with_span(&ident)
                );
                continue;
            }
            match field_type(&ident).map(has_many_inner) {
                None => errors.push(
                    darling::Error::custom(format!("unknown field `{ident}` in `related`")).with_span(&ident)
                ),
                Some(None) => errors.push(
                    darling::Error::custom(format!("`{ident}` must be a HasMany<T> field to be related"))
                        .with_span(&ident)
                ),
                Some(Some(child)) => related.push(RelationDef {
                    ident,
                    child: child.clone()
                })
            }
        }

        let mut taken: Vec<String> = BASE_METHODS.iter().map(|name| (*name).to_owned()).collect();
        for rel in &related {
            for name in rel.method_names() {
                if TRAIT_FUNCTIONS.contains(&name.as_str()) {
                    errors.push(
                        darling::Error::custom(format!(
                            "relation `{}` generates `{name}`, which would shadow the trait function `{name}`",
                            rel.ident
                        ))
                        .with_span(&rel.ident)
                    );
                } else if taken.contains(&name) {
                    errors.push(
                        darling::Error::custom(format!(
                            "relation `{}` generates `{name}`, which collides with another generated method",
                            rel.ident
                        ))
                        .with_span(&rel.ident)
                    );
                } else {
                    taken.push(name);
                }
            }
        }

        errors.finish_with(Self {
            ident: attrs.ident,
            vis: attrs.vis,
            generics: attrs.generics,
            repo: attrs.repo,
            unique,
            related
        })
    }
}

fn plain_ident(path: &Path, key: &str) -> darling::Result<Ident> {
    path.get_ident()
        .cloned()
        .ok_or_else(|| darling::Error::custom(format!("`{key}` expects plain field names")).with_span(path))
}
