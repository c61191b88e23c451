// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Derived Schema with a hand-written Crud impl, driven through `ops`.

use schema_crud::{Crud, MemoryRepo, Schema, ops};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema)]
#[schema(source = "sessions")]
pub struct Session {
    pub id: i64,
    pub token: String,
}

impl Crud for Session {
    type Repo = MemoryRepo;

    fn unique_fields() -> &'static [&'static str] {
        &["token"]
    }
}

#[tokio::main]
async fn main() {
    let repo = MemoryRepo::new();
    ops::insert_strict::<Session>(&repo, json!({"token": "abc"})).await.unwrap();
    let rejected = ops::insert::<Session>(&repo, json!({"token": "abc"}))
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(rejected.errors_on("token"), vec!["has already been taken"]);
}
