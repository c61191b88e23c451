// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Shared utilities for both derives.

use syn::{DeriveInput, Field, GenericArgument, PathArguments, Type};

/// Child type of a `HasMany<Child>` field type.
///
/// Matches on the last path segment, so `HasMany<T>`,
/// `schema_crud::HasMany<T>` and `::schema_crud::HasMany<T>` all qualify.
pub fn has_many_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "HasMany" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None
    }
}

/// Named fields of a struct, or an error naming `derive`.
pub fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> darling::Result<Vec<&'a Field>> {
    match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(named) => Ok(named.named.iter().collect()),
            _ => Err(darling::Error::custom(format!("{derive} requires named fields"))
                .with_span(&input.ident))
        },
        _ => Err(
            darling::Error::custom(format!("{derive} can only be derived for structs"))
                .with_span(&input.ident)
        )
    }
}
