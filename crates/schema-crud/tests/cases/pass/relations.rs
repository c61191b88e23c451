// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Relation helpers with explicit primary and foreign keys.

use schema_crud::{Changeset, Crud, HasMany, MemoryRepo, Schema};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
#[schema(source = "shelves", validate = "checks::shelf")]
#[crud(repo = "MemoryRepo", unique(code), related(books, notes))]
pub struct Shelf {
    #[schema(primary_key)]
    pub number: i64,
    pub code: String,
    #[has_many(foreign_key = "shelf_number")]
    pub books: HasMany<Book>,
    #[has_many(foreign_key = "shelf_number")]
    pub notes: schema_crud::HasMany<Note>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
#[schema(source = "books")]
#[crud(repo = "MemoryRepo", unique(isbn))]
pub struct Book {
    pub id: i64,
    pub shelf_number: i64,
    pub isbn: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
#[schema(source = "notes")]
#[crud(repo = "MemoryRepo")]
pub struct Note {
    pub id: i64,
    pub shelf_number: i64,
    pub text: String,
}

mod checks {
    use super::*;

    pub fn shelf(changeset: Changeset<Shelf>) -> Changeset<Shelf> {
        changeset.validate_required(&["code"])
    }
}

#[tokio::main]
async fn main() {
    let repo = MemoryRepo::new();
    let shelf = Shelf::insert_strict(&repo, json!({"code": "A1"})).await.unwrap();
    assert_eq!(shelf.number, 1);

    let book = Shelf::insert_books_strict(&repo, &shelf, json!({"isbn": "978-0"})).await.unwrap();
    assert_eq!(book.shelf_number, shelf.number);
    Shelf::insert_notes_strict(&repo, &shelf, json!({"text": "dusty"})).await.unwrap();

    assert_eq!(Shelf::books(&repo, &shelf).await.unwrap().len(), 1);
    assert_eq!(Shelf::notes(&repo, &shelf).await.unwrap().len(), 1);
    assert_eq!(Shelf::related(), &["books", "notes"]);
}
