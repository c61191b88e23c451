// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Attribute parsing for the Schema derive.
//!
//! Struct-level `#[schema(...)]` is parsed with darling. Field-level
//! `#[schema(primary_key)]` and `#[has_many(...)]` are marker-style and
//! parsed by hand.
//!
//! # Data Structures
//!
//! ```text
//! SchemaDef
//! ├── ident: Ident             (struct name)
//! ├── generics: Generics
//! ├── source: String           (storage name)
//! ├── validate: Option<Path>   (changeset pipeline function)
//! ├── primary_key: usize       (index into fields)
//! └── fields: Vec<FieldDef>
//!     └── FieldDef
//!         ├── ident: Ident
//!         ├── ty: Type
//!         ├── primary_key: bool           (#[schema(primary_key)])
//!         └── association: Option<AssocDef>
//!             ├── child: Type             (T of HasMany<T>)
//!             └── foreign_key: Option<String>
//! ```

use convert_case::{Case, Casing};
use darling::FromDeriveInput;
use syn::{DeriveInput, Field, Generics, Ident, LitStr, Path, Type};

use crate::utils::{has_many_inner, named_fields};

/// Struct-level attributes parsed from `#[schema(...)]`.
///
/// | Attribute | Required | Description |
/// |-----------|----------|-------------|
/// | `source` | Yes | Storage name (table, collection) |
/// | `validate` | No | `fn(Changeset<Self>) -> Changeset<Self>` run after casting |
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(schema), supports(struct_named))]
struct SchemaAttrs {
    ident:    Ident,
    generics: Generics,
    source:   String,
    #[darling(default)]
    validate: Option<Path>
}

/// One-to-many association declared by a `HasMany<T>` field.
#[derive(Debug)]
pub struct AssocDef {
    /// Child record type.
    pub child:       Type,
    /// Explicit `#[has_many(foreign_key = "...")]`.
    pub foreign_key: Option<String>
}

/// Parsed struct field.
#[derive(Debug)]
pub struct FieldDef {
    /// Field identifier.
    pub ident:       Ident,
    /// Field type.
    pub ty:          Type,
    /// Marked with `#[schema(primary_key)]`.
    pub primary_key: bool,
    /// Set for `HasMany<T>` fields.
    pub association: Option<AssocDef>
}

impl FieldDef {
    /// Parse a named field and its attributes.
    ///
    /// # Errors
    ///
    /// - Unknown keys inside `#[schema(...)]` or `#[has_many(...)]`
    /// - `#[has_many]` on a field that is not `HasMany<T>`
    /// - `#[schema(primary_key)]` on an association
    pub fn from_field(field: &Field) -> darling::Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| darling::Error::custom("Schema fields must be named").with_span(field))?;

        let mut primary_key = false;
        let mut foreign_key = None;
        let mut has_many_attr = None;

        for attr in &field.attrs {
            if attr.path().is_ident("schema") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("primary_key") {
                        primary_key = true;
                        Ok(())
                    } else {
                        Err(meta.error("expected `primary_key`"))
                    }
                })?;
            } else if attr.path().is_ident("has_many") {
                has_many_attr = Some(attr);
                if let syn::Meta::List(_) = &attr.meta {
                    attr.parse_nested_meta(|meta| {
                        if meta.path.is_ident("foreign_key") {
                            let value: LitStr = meta.value()?.parse()?;
                            foreign_key = Some(value.value());
                            Ok(())
                        } else {
                            Err(meta.error("expected `foreign_key`"))
                        }
                    })?;
                }
            }
        }

        let child = has_many_inner(&field.ty).cloned();
        if let Some(attr) = has_many_attr
            && child.is_none()
        {
            return Err(
                darling::Error::custom("#[has_many] requires a field of type HasMany<T>").with_span(attr)
            );
        }
        if primary_key && child.is_some() {
            return Err(
                darling::Error::custom("a HasMany association cannot be the primary key").with_span(&ident)
            );
        }

        Ok(Self {
            ident,
            ty: field.ty.clone(),
            primary_key,
            association: child.map(|child| AssocDef {
                child,
                foreign_key
            })
        })
    }

    /// Field name as written in the struct.
    pub fn name(&self) -> String {
        self.ident.to_string()
    }
}

/// Complete parsed Schema definition.
#[derive(Debug)]
pub struct SchemaDef {
    /// Struct identifier.
    pub ident:       Ident,
    /// Struct generics.
    pub generics:    Generics,
    /// Storage name.
    pub source:      String,
    /// Changeset pipeline function.
    pub validate:    Option<Path>,
    /// All fields in declaration order.
    pub fields:      Vec<FieldDef>,
    /// Index of the primary key in `fields`.
    pub primary_key: usize
}

impl SchemaDef {
    /// Parse a Schema definition from syn's `DeriveInput`.
    ///
    /// # Errors
    ///
    /// - Missing or empty `source`
    /// - Not a struct with named fields
    /// - No primary key, or more than one `#[schema(primary_key)]`
    pub fn from_derive_input(input: &DeriveInput) -> darling::Result<Self> {
        let attrs = SchemaAttrs::from_derive_input(input)?;
        if attrs.source.is_empty() {
            return Err(darling::Error::custom("`source` must not be empty").with_span(&attrs.ident));
        }

        let fields = named_fields(input, "Schema")?
            .into_iter()
            .map(FieldDef::from_field)
            .collect::<darling::Result<Vec<_>>>()?;

        let marked: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.primary_key)
            .map(|(index, _)| index)
            .collect();
        let primary_key = match marked.as_slice() {
            [index] => *index,
            [] => fields
                .iter()
                .position(|field| field.ident == "id" && field.association.is_none())
                .ok_or_else(|| {
                    darling::Error::custom(
                        "Schema requires a primary key: mark a field with #[schema(primary_key)] or name it `id`"
                    )
                    .with_span(&attrs.ident)
                })?,
            [_, second, ..] => {
                return Err(
                    darling::Error::custom("only one field can be marked #[schema(primary_key)]")
                        .with_span(&fields[*second].ident)
                );
            }
        };

        Ok(Self {
            ident: attrs.ident,
            generics: attrs.generics,
            source: attrs.source,
            validate: attrs.validate,
            fields,
            primary_key
        })
    }

    /// Primary key field.
    pub fn primary_key(&self) -> &FieldDef {
        &self.fields[self.primary_key]
    }

    /// Persisted fields, associations excluded.
    pub fn stored_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|field| field.association.is_none())
    }

    /// Association fields with their definitions.
    pub fn associations(&self) -> impl Iterator<Item = (&FieldDef, &AssocDef)> {
        self.fields
            .iter()
            .filter_map(|field| field.association.as_ref().map(|assoc| (field, assoc)))
    }

    /// Foreign key on the child for `assoc`.
    ///
    /// Defaults to `<snake_case struct name>_id`.
    pub fn foreign_key(&self, assoc: &AssocDef) -> String {
        assoc
            .foreign_key
            .clone()
            .unwrap_or_else(|| format!("{}_id", self.ident.to_string().to_case(Case::Snake)))
    }
}
