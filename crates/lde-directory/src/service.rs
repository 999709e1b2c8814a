//! Entity Service
//!
//! Create, read, list, update and delete for users, groups and roles.
//! Relationship lists are written as given; the membership engine is the
//! place for incremental changes.

use std::sync::Arc;

use lde_config::MembershipConfig;
use tracing::{debug, info};

use crate::shared::error::{DirectoryError, Result, StorageContext};
use crate::shared::retry::{load_versioned, retry_stale, save_versioned};
use crate::store::{DirectoryStore, Entity, Repository, StoreError, Versioned};

pub struct EntityService {
    store: Arc<dyn DirectoryStore>,
    conflict_retries: u32,
}

impl EntityService {
    pub fn new(store: Arc<dyn DirectoryStore>, config: &MembershipConfig) -> Self {
        Self {
            store,
            conflict_retries: config.conflict_retries,
        }
    }

    fn repo<E: Entity>(&self) -> Repository<E> {
        Repository::new(self.store.clone())
    }

    fn check<E: Entity>(entity: &E) -> Result<()> {
        entity.validate().map_err(DirectoryError::validation)
    }

    /// Store a new entity. An empty id is replaced with a fresh UUID.
    pub async fn create<E: Entity>(&self, mut entity: E) -> Result<E> {
        if entity.id().trim().is_empty() {
            entity.set_id(uuid::Uuid::new_v4().to_string());
        }
        Self::check(&entity)?;

        match self.repo::<E>().insert(&entity).await {
            Ok(()) => {}
            Err(StoreError::Duplicate { kind, id }) => return Err(DirectoryError::duplicate(kind, id)),
            Err(e) => return Err(DirectoryError::storage(format!("failed to create {}", E::KIND), e)),
        }

        info!(kind = %E::KIND, id = %entity.id(), "Entity created");
        Ok(entity)
    }

    pub async fn get<E: Entity>(&self, id: &str) -> Result<E> {
        Ok(load_versioned(&self.repo::<E>(), id).await?.entity)
    }

    /// All entities of one kind, ordered by name.
    pub async fn list<E: Entity>(&self) -> Result<Vec<E>> {
        let entities = self
            .repo::<E>()
            .find_all()
            .await
            .storage_context(&format!("failed to query {}s", E::KIND))?;
        debug!(kind = %E::KIND, count = entities.len(), "Listed entities");
        Ok(entities)
    }

    /// Replace the stored entity. The path `id` wins over any id in `entity`.
    pub async fn update<E: Entity>(&self, id: &str, mut entity: E) -> Result<E> {
        entity.set_id(id.to_string());
        Self::check(&entity)?;

        let repo = self.repo::<E>();
        let context = format!("failed to update {}", E::KIND);
        let (repo, context, replacement) = (&repo, context.as_str(), &entity);

        retry_stale(self.conflict_retries, E::KIND, id, move || async move {
            let current = load_versioned(repo, id).await?;
            let next = Versioned {
                entity: replacement.clone(),
                version: current.version,
            };
            save_versioned(repo, &next, context, ()).await
        })
        .await?;

        info!(kind = %E::KIND, id = %id, "Entity updated");
        Ok(entity)
    }

    /// Physically remove the entity. References to it elsewhere are left in place.
    pub async fn delete<E: Entity>(&self, id: &str) -> Result<()> {
        let deleted = self
            .repo::<E>()
            .delete(id)
            .await
            .storage_context(&format!("failed to delete {}", E::KIND))?;

        if !deleted {
            return Err(DirectoryError::not_found(E::KIND, id));
        }

        info!(kind = %E::KIND, id = %id, "Entity deleted");
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await.storage_context("store ping failed")
    }
}
