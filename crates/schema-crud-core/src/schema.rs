// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Record type metadata and associations.
//!
//! A [`Schema`] describes one record type: where it is stored, which fields
//! are persisted, its primary key and its one-to-many associations.
//! Implementations are normally produced by `#[derive(Schema)]`.
//!
//! # Associations
//!
//! ```text
//! User (source "users")            Post (source "posts")
//! ├── id ◄──────── owner_key       ├── id
//! ├── email                        ├── user_id ◄── foreign_key
//! └── posts: HasMany<Post> ──────► └── title
//! ```
//!
//! The parent holds a [`HasMany`] slot that stays [`HasMany::NotLoaded`]
//! until a repository preloads it through [`Schema::attach`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::{Row, changeset::Changeset};

/// Error raised by the schema layer.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The relation name is not declared on the schema.
    #[error("association `{relation}` is not declared on `{schema}`")]
    UnknownAssociation {
        /// Source of the parent schema.
        schema:   &'static str,
        /// Requested relation name.
        relation: String
    },

    /// The relation exists but points at another schema.
    #[error("association `{relation}` on `{schema}` targets `{expected}`, not `{found}`")]
    AssociationMismatch {
        /// Source of the parent schema.
        schema:   &'static str,
        /// Requested relation name.
        relation: &'static str,
        /// Source declared by the association.
        expected: &'static str,
        /// Source of the requested child type.
        found:    &'static str
    },

    /// A record could not be turned into a row.
    #[error("failed to encode `{schema}` record: {error}")]
    Encode {
        /// Source of the schema.
        schema: &'static str,
        /// Underlying serde error.
        #[source]
        error:  serde_json::Error
    },

    /// A row could not be turned into a record.
    #[error("failed to decode `{schema}` record: {error}")]
    Decode {
        /// Source of the schema.
        schema: &'static str,
        /// Underlying serde error.
        #[source]
        error:  serde_json::Error
    },

    /// A record did not serialize to a map of fields.
    #[error("`{schema}` records must serialize to a map of fields")]
    NotAMap {
        /// Source of the schema.
        schema: &'static str
    }
}

impl SchemaError {
    /// Build an [`SchemaError::UnknownAssociation`].
    pub fn unknown_association(schema: &'static str, relation: &str) -> Self {
        Self::UnknownAssociation {
            schema,
            relation: relation.to_owned()
        }
    }
}

/// Metadata of a one-to-many association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    /// Relation name, equal to the parent's field name.
    pub name:        &'static str,
    /// Source of the child schema.
    pub related:     &'static str,
    /// Field on the child holding the parent's key.
    pub foreign_key: &'static str,
    /// Field on the parent referenced by the foreign key.
    pub owner_key:   &'static str
}

impl Association {
    /// Create association metadata.
    pub const fn new(
        name: &'static str,
        related: &'static str,
        foreign_key: &'static str,
        owner_key: &'static str
    ) -> Self {
        Self {
            name,
            related,
            foreign_key,
            owner_key
        }
    }
}

/// Association slot holding the children of a one-to-many relation.
///
/// Serializes as `null` while not loaded and as a list once loaded, so a
/// missing or `null` value deserializes back to [`HasMany::NotLoaded`].
#[derive(Clone, PartialEq)]
pub enum HasMany<C> {
    /// Children were not fetched.
    NotLoaded,
    /// Children fetched by a preload, in repository order.
    Loaded(Vec<C>)
}

impl<C> HasMany<C> {
    /// Check whether the association was preloaded.
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Borrow the loaded children.
    pub fn loaded(&self) -> Option<&[C]> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(children) => Some(children)
        }
    }

    /// Take the children, empty when not loaded.
    pub fn into_vec(self) -> Vec<C> {
        match self {
            Self::NotLoaded => Vec::new(),
            Self::Loaded(children) => children
        }
    }
}

impl<C> Default for HasMany<C> {
    fn default() -> Self {
        Self::NotLoaded
    }
}

impl<C: fmt::Debug> fmt::Debug for HasMany<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLoaded => f.write_str("NotLoaded"),
            Self::Loaded(children) => f.debug_tuple("Loaded").field(children).finish()
        }
    }
}

impl<C: Serialize> Serialize for HasMany<C> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        match self {
            Self::NotLoaded => serializer.serialize_none(),
            Self::Loaded(children) => serializer.serialize_some(children)
        }
    }
}

impl<'de, C: Deserialize<'de>> Deserialize<'de> for HasMany<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Vec<C>>::deserialize(deserializer)? {
            None => Self::NotLoaded,
            Some(children) => Self::Loaded(children)
        })
    }
}

/// A persisted record type.
///
/// # Contract
///
/// - The record serializes to a map whose keys include every entry of
///   [`FIELDS`](Schema::FIELDS).
/// - `Default` yields the blank instance new inserts start from.
/// - Association slots are [`HasMany`] fields and are not part of `FIELDS`.
pub trait Schema:
    Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static
{
    /// Primary key type.
    type Id: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Storage name (table, collection).
    const SOURCE: &'static str;

    /// Name of the primary key field.
    const PRIMARY_KEY: &'static str;

    /// Persisted field names, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Declared one-to-many associations.
    const ASSOCIATIONS: &'static [Association] = &[];

    /// Borrow the primary key.
    fn primary_key(&self) -> &Self::Id;

    /// Build a changeset applying raw attributes to `data`.
    ///
    /// The default casts every persisted field. Override to add validations.
    fn changeset(data: Self, attrs: Value) -> Changeset<Self> {
        Changeset::cast(data, attrs, Self::FIELDS)
    }

    /// Store preloaded rows into the association slot named `relation`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownAssociation`] when `relation` is not declared,
    /// [`SchemaError::Decode`] when a row does not match the child type.
    fn attach(&mut self, relation: &str, rows: Vec<Row>) -> Result<(), SchemaError> {
        let _ = rows;
        Err(SchemaError::unknown_association(Self::SOURCE, relation))
    }

    /// Look up association metadata by relation name.
    fn association(name: &str) -> Option<&'static Association> {
        Self::ASSOCIATIONS.iter().find(|assoc| assoc.name == name)
    }

    /// Encode the record into its storage row, keeping only persisted fields.
    ///
    /// # Errors
    ///
    /// Fails when serialization fails or does not produce a map.
    fn to_row(&self) -> Result<Row, SchemaError> {
        let value = serde_json::to_value(self).map_err(|error| SchemaError::Encode {
            schema: Self::SOURCE,
            error
        })?;
        let Value::Object(mut map) = value else {
            return Err(SchemaError::NotAMap {
                schema: Self::SOURCE
            });
        };

        Ok(Self::FIELDS
            .iter()
            .map(|field| {
                let value = map.remove(*field).unwrap_or(Value::Null);
                ((*field).to_owned(), value)
            })
            .collect())
    }

    /// Decode a storage row into a record with unloaded associations.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Decode`] when the row does not match the record type.
    fn from_row(mut row: Row) -> Result<Self, SchemaError> {
        for assoc in Self::ASSOCIATIONS {
            row.entry(assoc.name).or_insert(Value::Null);
        }
        serde_json::from_value(Value::Object(row)).map_err(|error| SchemaError::Decode {
            schema: Self::SOURCE,
            error
        })
    }
}

/// Decode preloaded rows into child records, preserving order.
///
/// Used by generated [`Schema::attach`] implementations.
///
/// # Errors
///
/// Fails on the first row that does not decode.
pub fn decode_rows<C: Schema>(rows: Vec<Row>) -> Result<Vec<C>, SchemaError> {
    rows.into_iter().map(C::from_row).collect()
}

/// Build a child record pre-associated with `parent`.
///
/// Returns `C::default()` with the relation's foreign key set to the parent's
/// owner key value.
///
/// # Errors
///
/// - [`SchemaError::UnknownAssociation`] if `relation` is not declared on `P`
/// - [`SchemaError::AssociationMismatch`] if the relation targets another
///   schema than `C`
pub fn build_assoc<P: Schema, C: Schema>(parent: &P, relation: &str) -> Result<C, SchemaError> {
    let assoc =
        P::association(relation).ok_or_else(|| SchemaError::unknown_association(P::SOURCE, relation))?;
    if assoc.related != C::SOURCE {
        return Err(SchemaError::AssociationMismatch {
            schema:   P::SOURCE,
            relation: assoc.name,
            expected: assoc.related,
            found:    C::SOURCE
        });
    }

    let owner = parent
        .to_row()?
        .remove(assoc.owner_key)
        .unwrap_or(Value::Null);
    let mut row = C::default().to_row()?;
    row.insert(assoc.foreign_key.to_owned(), owner);
    C::from_row(row)
}
