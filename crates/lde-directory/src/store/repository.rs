//! Typed repository over the document store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use super::{DirectoryStore, Document, EntityKind, ListField, OrderKey, StoreResult, INITIAL_VERSION};

/// A directory record that can be stored as a document.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn name(&self) -> &str;

    /// Entity invariants checked on create and update.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// An entity together with the store version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<E> {
    pub entity: E,
    pub version: i64,
}

pub struct Repository<E> {
    store: Arc<dyn DirectoryStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    fn to_document(entity: &E, version: i64) -> StoreResult<Document> {
        Ok(Document {
            kind: E::KIND,
            id: entity.id().to_string(),
            name: entity.name().to_string(),
            version,
            body: serde_json::to_value(entity)?,
        })
    }

    fn from_document(document: Document) -> StoreResult<Versioned<E>> {
        Ok(Versioned {
            entity: serde_json::from_value(document.body)?,
            version: document.version,
        })
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Versioned<E>>> {
        debug!(kind = %E::KIND, id = %id, "Loading entity");
        self.store
            .get_by_id(E::KIND, id)
            .await?
            .map(Self::from_document)
            .transpose()
    }

    pub async fn insert(&self, entity: &E) -> StoreResult<()> {
        let document = Self::to_document(entity, INITIAL_VERSION)?;
        self.store.insert(&document).await
    }

    /// Conditional write at `current.version`. Returns `false` when the record
    /// is gone or was modified since it was read.
    pub async fn save(&self, current: &Versioned<E>) -> StoreResult<bool> {
        let document = Self::to_document(&current.entity, current.version + 1)?;
        let rows = self.store.save(&document, current.version).await?;
        Ok(rows > 0)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let rows = self.store.delete(E::KIND, id).await?;
        Ok(rows > 0)
    }

    /// All entities ordered by name.
    pub async fn find_all(&self) -> StoreResult<Vec<E>> {
        self.collect(self.store.find_all(E::KIND, OrderKey::Name).await?)
    }

    /// Entities whose `field` list contains `value`.
    pub async fn find_where_list_contains(&self, field: ListField, value: &str) -> StoreResult<Vec<E>> {
        debug_assert_eq!(field.kind(), E::KIND);
        self.collect(self.store.find_where_list_contains(field, value).await?)
    }

    fn collect(&self, documents: Vec<Document>) -> StoreResult<Vec<E>> {
        documents
            .into_iter()
            .map(|d| Self::from_document(d).map(|v| v.entity))
            .collect()
    }
}
