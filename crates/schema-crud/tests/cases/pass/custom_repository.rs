// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! A user-defined repository with its own error type.

use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering}
};

use schema_crud::{
    Changeset, Crud, Filter, MemoryError, MemoryRepo, Persisted, QueryOptions, Repository, Schema,
    SchemaError, async_trait
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug)]
pub struct AuditError(MemoryError);

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audited repository: {}", self.0)
    }
}

impl std::error::Error for AuditError {}

impl From<SchemaError> for AuditError {
    fn from(err: SchemaError) -> Self {
        Self(MemoryError::Schema(err))
    }
}

#[derive(Default)]
pub struct AuditedRepo {
    inner: MemoryRepo,
    writes: AtomicUsize,
}

#[async_trait]
impl Repository for AuditedRepo {
    type Error = AuditError;

    async fn insert<S: Schema>(&self, changeset: Changeset<S>) -> Result<Persisted<S>, AuditError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(changeset).await.map_err(AuditError)
    }

    async fn update<S: Schema>(&self, changeset: Changeset<S>) -> Result<Persisted<S>, AuditError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(changeset).await.map_err(AuditError)
    }

    async fn get<S: Schema>(&self, id: &S::Id, options: &QueryOptions) -> Result<Option<S>, AuditError> {
        self.inner.get::<S>(id, options).await.map_err(AuditError)
    }

    async fn get_by<S: Schema>(
        &self,
        filter: &Filter,
        options: &QueryOptions,
    ) -> Result<Option<S>, AuditError> {
        self.inner.get_by::<S>(filter, options).await.map_err(AuditError)
    }

    async fn all<S: Schema>(&self, options: &QueryOptions) -> Result<Vec<S>, AuditError> {
        self.inner.all::<S>(options).await.map_err(AuditError)
    }

    async fn preload<S: Schema>(&self, record: S, relation: &str) -> Result<S, AuditError> {
        self.inner.preload(record, relation).await.map_err(AuditError)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Schema, Crud)]
#[schema(source = "events")]
#[crud(repo = "AuditedRepo", unique(name))]
pub struct Event {
    pub id: i64,
    pub name: String,
}

#[tokio::main]
async fn main() {
    let repo = AuditedRepo::default();
    Event::insert_strict(&repo, json!({"name": "launch"})).await.unwrap();
    let outcome = Event::insert(&repo, json!({"name": "launch"})).await.unwrap();
    assert!(outcome.is_err());
    assert_eq!(repo.writes.load(Ordering::SeqCst), 2);
    assert!(Event::get(&repo, &1, QueryOptions::new()).await.unwrap().is_some());
}
