// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! A record without relations.

use schema_crud::{Crud, MemoryRepo, QueryOptions, Schema};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
#[schema(source = "tags")]
#[crud(repo = "MemoryRepo", unique(label))]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

#[tokio::main]
async fn main() {
    assert_eq!(Tag::unique_fields(), &["label"]);
    assert_eq!(Tag::FIELDS, &["id", "label"]);

    let repo = MemoryRepo::new();
    let tag = Tag::insert_strict(&repo, json!({"label": "rust"})).await.unwrap();
    let tag = Tag::update_strict(&repo, tag, json!({"label": "rustlang"})).await.unwrap();
    assert_eq!(tag.label, "rustlang");
    assert_eq!(Tag::all(&repo, QueryOptions::new()).await.unwrap().len(), 1);
}
