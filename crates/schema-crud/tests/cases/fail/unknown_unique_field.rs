// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use schema_crud::{Crud, Schema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
#[schema(source = "users")]
#[crud(repo = "schema_crud::MemoryRepo", unique(mail))]
pub struct User {
    pub id: i64,
    pub email: String,
}

fn main() {}
