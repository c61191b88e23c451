// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use schema_crud::Schema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema)]
#[schema(source = "tags")]
pub struct Tag {
    pub label: String,
}

fn main() {}
