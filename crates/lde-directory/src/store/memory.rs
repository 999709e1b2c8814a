//! In-memory store for tests and dev mode.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{
    DirectoryStore, Document, EntityKind, ListField, OrderKey, StoreError, StoreResult, INITIAL_VERSION,
};

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityKind, HashMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut documents: Vec<Document>, order: OrderKey) -> Vec<Document> {
        match order {
            OrderKey::Name => documents.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))),
            OrderKey::Id => documents.sort_by(|a, b| a.id.cmp(&b.id)),
        }
        documents
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn get_by_id(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.tables.read().get(&kind).and_then(|t| t.get(id)).cloned())
    }

    async fn insert(&self, document: &Document) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let table = tables.entry(document.kind).or_default();
        if table.contains_key(&document.id) {
            return Err(StoreError::Duplicate {
                kind: document.kind,
                id: document.id.clone(),
            });
        }
        let mut stored = document.clone();
        stored.version = INITIAL_VERSION;
        table.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn save(&self, document: &Document, expected_version: i64) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let Some(existing) = tables.get_mut(&document.kind).and_then(|t| t.get_mut(&document.id)) else {
            return Ok(0);
        };
        if existing.version != expected_version {
            return Ok(0);
        }
        existing.name = document.name.clone();
        existing.body = document.body.clone();
        existing.version = expected_version + 1;
        Ok(1)
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> StoreResult<u64> {
        let removed = self.tables.write().get_mut(&kind).and_then(|t| t.remove(id));
        Ok(u64::from(removed.is_some()))
    }

    async fn find_all(&self, kind: EntityKind, order: OrderKey) -> StoreResult<Vec<Document>> {
        let documents = self
            .tables
            .read()
            .get(&kind)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default();
        Ok(Self::sorted(documents, order))
    }

    async fn find_where_list_contains(&self, field: ListField, value: &str) -> StoreResult<Vec<Document>> {
        let documents = self
            .tables
            .read()
            .get(&field.kind())
            .map(|t| {
                t.values()
                    .filter(|d| field.contained_in(&d.body, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self::sorted(documents, OrderKey::Name))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
