// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Convenient re-exports for common usage.
//!
//! # Usage
//!
//! ```rust,ignore
//! use schema_crud_core::prelude::*;
//! ```

#[cfg(feature = "memory")]
pub use crate::memory::{MemoryError, MemoryRepo};
pub use crate::{
    Changeset, Crud, ErrorKind, Filter, HasMany, Persisted, QueryOptions, RepoError, Repository,
    Schema, SchemaError, Value, async_trait, ops
};
