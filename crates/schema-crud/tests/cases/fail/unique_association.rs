// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use schema_crud::{Crud, HasMany, Schema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
#[schema(source = "users")]
#[crud(repo = "schema_crud::MemoryRepo", unique(posts))]
pub struct User {
    pub id: i64,
    pub posts: HasMany<Post>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
#[schema(source = "posts")]
#[crud(repo = "schema_crud::MemoryRepo")]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
}

fn main() {}
