//! Base repository trait shared by tree and flat repositories.
//!
//! A repository is the data access layer for one entity kind. It owns a backend handle and the
//! kind's default ordering, and knows how to list, paginate and look up entities. The write
//! methods are thin passthroughs so the service never touches the backend itself.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::Entity;
use crate::db::order::{OrderBy, resolve_order};
use crate::db::query::{Condition, Query, TrashMode};
use crate::db::storage::Backend;
use crate::errors::Result;
use crate::pagination::{PageOptions, Paginated};
use crate::types::{EntityId, now};

/// What happens to the children of a tree node that is being deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildrenResolve {
    /// Leave the children to the backend's referential rule for the parent link
    #[default]
    Delete,
    /// Hand the children to the deleted node's parent
    Up,
    /// Turn the children into roots
    Root,
}

/// Per-call read options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub trashed: TrashMode,
    /// Overrides the repository's default ordering
    pub order_by: Option<OrderBy>,
    /// Extra predicates. On tree reads they select the roots (or the ancestor chain).
    pub conditions: Vec<Condition>,
    /// Deepest level of descendants to assemble below each root (0 = roots only)
    pub depth: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trashed(mut self, trashed: TrashMode) -> Self {
        self.trashed = trashed;
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }
}

/// Base repository trait.
///
/// `Item` is what listings return: the entity itself for flat kinds, a depth-annotated
/// [`FlatNode`](crate::db::models::FlatNode) for tree kinds. Everything else speaks in entities.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// The listing element type
    type Item: Clone + Debug + Send + Sync;

    type Backend: Backend<E>;

    fn backend(&self) -> &Self::Backend;

    /// Ordering used when a call doesn't ask for one
    fn default_order(&self) -> Option<&OrderBy>;

    /// Translate read options into a backend query.
    fn build_query(&self, options: &FindOptions) -> Result<Query> {
        let order = resolve_order(options.order_by.as_ref(), self.default_order(), &E::SCHEMA)?;
        Ok(Query::new()
            .filters(options.conditions.iter().cloned())
            .trashed(options.trashed)
            .order_by(order))
    }

    /// Every matching entity in listing shape.
    async fn list(&self, options: &FindOptions) -> Result<Vec<Self::Item>>;

    /// One page of [`Repository::list`].
    async fn paginate(
        &self,
        options: &FindOptions,
        page: &PageOptions,
    ) -> Result<Paginated<Self::Item>>;

    /// The given live entities in listing shape. Ids that don't resolve are skipped.
    async fn list_ids(&self, ids: &[EntityId]) -> Result<Vec<Self::Item>>;

    /// Apply the kind's children policy ahead of deleting `targets`. A no-op for flat kinds.
    async fn resolve_children(&self, targets: &[E]) -> Result<()>;

    async fn find_one(&self, id: EntityId, trashed: TrashMode) -> Result<Option<E>> {
        let query = Query::new().filter(Condition::eq(E::SCHEMA.id_column(), id)).trashed(trashed);
        Ok(self.backend().find(&query).await?.into_iter().next())
    }

    /// Entities with the given ids, in the repository's default order. Missing ids are skipped.
    async fn find_by_ids(&self, ids: &[EntityId], trashed: TrashMode) -> Result<Vec<E>> {
        let options = FindOptions::new()
            .trashed(trashed)
            .filter(Condition::is_in(E::SCHEMA.id_column(), ids.iter().copied()));
        let query = self.build_query(&options)?;
        Ok(self.backend().find(&query).await?)
    }

    async fn insert(&self, entity: &E) -> Result<E> {
        Ok(self.backend().insert(entity).await?)
    }

    async fn save(&self, entity: &E) -> Result<E> {
        Ok(self.backend().save(entity).await?)
    }

    async fn remove(&self, ids: &[EntityId]) -> Result<u64> {
        Ok(self.backend().remove(ids).await?)
    }

    /// Move live entities to the trash. Returns the deletion timestamp that was written.
    async fn soft_remove(&self, ids: &[EntityId]) -> Result<DateTime<Utc>> {
        let at = now();
        self.backend().soft_remove(ids, at).await?;
        Ok(at)
    }

    async fn recover(&self, ids: &[EntityId]) -> Result<u64> {
        Ok(self.backend().recover(ids).await?)
    }
}
