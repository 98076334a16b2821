//! Generic CRUD service with the trash lifecycle.

use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::db::handlers::{FindOptions, Repository};
use crate::db::models::Entity;
use crate::db::query::TrashMode;
use crate::errors::{Error, Result};
use crate::pagination::{PageOptions, Paginated};
use crate::types::{EntityId, Operation, abbrev_uuid, abbrev_uuids};

/// Create and update, which each entity kind supplies for itself. Kinds that don't refuse with
/// `Forbidden`.
#[async_trait]
pub trait Crud: Send + Sync {
    type Entity: Entity;
    type CreateRequest: Send + 'static;
    type UpdateRequest: Send + 'static;

    async fn create(&self, _request: Self::CreateRequest) -> Result<Self::Entity> {
        Err(Error::Forbidden {
            operation: Operation::Create,
            resource: Self::Entity::SCHEMA.resource.to_string(),
            reason: "not supported".to_string(),
        })
    }

    async fn update(&self, _id: EntityId, _request: Self::UpdateRequest) -> Result<Self::Entity> {
        Err(Error::Forbidden {
            operation: Operation::Update,
            resource: Self::Entity::SCHEMA.resource.to_string(),
            reason: "not supported".to_string(),
        })
    }
}

/// Reads, deletes and restores for one entity kind over any [`Repository`].
///
/// Trash is off unless enabled with [`BaseService::with_trash`]. With trash off, every read is
/// forced to live rows only and deletes are always hard.
pub struct BaseService<E, R> {
    repository: R,
    enable_trash: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R> BaseService<E, R>
where
    E: Entity,
    R: Repository<E>,
{
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            enable_trash: false,
            _entity: PhantomData,
        }
    }

    /// Enable or disable trash. Kinds without a soft-delete column can't have it.
    pub fn with_trash(mut self, enable: bool) -> Self {
        if enable && !E::SCHEMA.supports_trash() {
            warn!(
                resource = E::SCHEMA.resource,
                "Trash requested for a kind without a deleted_at column, leaving it disabled"
            );
            self.enable_trash = false;
        } else {
            self.enable_trash = enable;
        }
        self
    }

    pub fn trash_enabled(&self) -> bool {
        self.enable_trash
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn visible(&self, mut options: FindOptions) -> FindOptions {
        if !self.enable_trash {
            options.trashed = TrashMode::None;
        }
        options
    }

    /// Every matching entity in listing shape (flattened trees for tree kinds).
    #[instrument(
        skip(self, options),
        fields(resource = E::SCHEMA.resource, trashed = %options.trashed),
        err
    )]
    pub async fn list(&self, options: FindOptions) -> Result<Vec<R::Item>> {
        self.repository.list(&self.visible(options)).await
    }

    #[instrument(
        skip(self, page, options),
        fields(resource = E::SCHEMA.resource, page = page.page(), limit = page.limit()),
        err
    )]
    pub async fn paginate(
        &self,
        page: &PageOptions,
        options: FindOptions,
    ) -> Result<Paginated<R::Item>> {
        self.repository.paginate(&self.visible(options), page).await
    }

    /// A live entity by id.
    ///
    /// # Errors
    /// - `NotFound` if no live entity has the id
    pub async fn detail(&self, id: EntityId) -> Result<E> {
        self.detail_with(id, TrashMode::None).await
    }

    #[instrument(
        skip(self, id),
        fields(resource = E::SCHEMA.resource, id = %abbrev_uuid(&id)),
        err
    )]
    pub async fn detail_with(&self, id: EntityId, trashed: TrashMode) -> Result<E> {
        let trashed = if self.enable_trash { trashed } else { TrashMode::None };
        self.repository
            .find_one(id, trashed)
            .await?
            .ok_or_else(|| Error::not_found(E::SCHEMA.resource, id))
    }

    /// Delete entities by id and return the ones affected.
    ///
    /// Tree kinds apply their children policy first. With trash enabled and `trash` set, live
    /// entities move to the trash and entities already there are removed for good; otherwise
    /// everything is removed. Unknown ids are skipped.
    #[instrument(
        skip(self, ids),
        fields(resource = E::SCHEMA.resource, ids = %abbrev_uuids(ids)),
        err
    )]
    pub async fn delete(&self, ids: &[EntityId], trash: bool) -> Result<Vec<E>> {
        let load = if self.enable_trash { TrashMode::All } else { TrashMode::None };
        let items = self.repository.find_by_ids(ids, load).await?;
        if items.is_empty() {
            return Ok(items);
        }

        self.repository.resolve_children(&items).await?;

        if !(self.enable_trash && trash) {
            let all: Vec<EntityId> = items.iter().map(|item| item.id()).collect();
            self.repository.remove(&all).await?;
            info!(removed = all.len(), "Removed {}", E::SCHEMA.resource);
            return Ok(items);
        }

        // Deleting something already in the trash removes it for good
        let (mut directs, mut softs): (Vec<E>, Vec<E>) =
            items.into_iter().partition(|item| item.is_trashed());
        if !directs.is_empty() {
            let ids: Vec<EntityId> = directs.iter().map(|item| item.id()).collect();
            self.repository.remove(&ids).await?;
        }
        if !softs.is_empty() {
            let ids: Vec<EntityId> = softs.iter().map(|item| item.id()).collect();
            let at = self.repository.soft_remove(&ids).await?;
            for item in &mut softs {
                item.set_deleted_at(Some(at));
            }
        }
        info!(
            removed = directs.len(),
            trashed = softs.len(),
            "Deleted {}",
            E::SCHEMA.resource
        );
        directs.append(&mut softs);
        Ok(directs)
    }

    /// Take entities out of the trash and return them in listing shape.
    ///
    /// Ids that aren't in the trash (live or unknown) are skipped.
    ///
    /// # Errors
    /// - `Forbidden` if trash is disabled for this kind
    #[instrument(
        skip(self, ids),
        fields(resource = E::SCHEMA.resource, ids = %abbrev_uuids(ids)),
        err
    )]
    pub async fn restore(&self, ids: &[EntityId]) -> Result<Vec<R::Item>> {
        if !self.enable_trash {
            return Err(Error::Forbidden {
                operation: Operation::Restore,
                resource: E::SCHEMA.resource.to_string(),
                reason: "trash is not enabled".to_string(),
            });
        }

        let trashed: Vec<EntityId> = self
            .repository
            .find_by_ids(ids, TrashMode::Only)
            .await?
            .iter()
            .map(|item| item.id())
            .collect();
        if trashed.is_empty() {
            return Ok(Vec::new());
        }

        self.repository.recover(&trashed).await?;
        info!(restored = trashed.len(), "Restored {}", E::SCHEMA.resource);
        self.repository.list_ids(&trashed).await
    }
}

#[async_trait]
impl<E, R> Crud for BaseService<E, R>
where
    E: Entity,
    R: Repository<E>,
{
    type Entity = E;
    type CreateRequest = serde_json::Value;
    type UpdateRequest = serde_json::Value;
}
