//! Repository for flat entity kinds.

use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::instrument;

use crate::db::handlers::repository::{FindOptions, Repository};
use crate::db::models::Entity;
use crate::db::order::OrderBy;
use crate::db::query::TrashMode;
use crate::db::storage::Backend;
use crate::errors::Result;
use crate::pagination::{self, PageOptions, Paginated};
use crate::types::EntityId;

pub struct FlatRepository<E, B> {
    backend: B,
    order_by: Option<OrderBy>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, B> Clone for FlatRepository<E, B>
where
    B: Clone,
{
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            order_by: self.order_by.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E, B> FlatRepository<E, B>
where
    E: Entity,
    B: Backend<E>,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            order_by: None,
            _entity: PhantomData,
        }
    }

    pub fn with_order(mut self, order_by: Option<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }
}

#[async_trait]
impl<E, B> Repository<E> for FlatRepository<E, B>
where
    E: Entity,
    B: Backend<E>,
{
    type Item = E;
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn default_order(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    #[instrument(
        skip(self, options),
        fields(resource = E::SCHEMA.resource, trashed = %options.trashed),
        err
    )]
    async fn list(&self, options: &FindOptions) -> Result<Vec<E>> {
        let query = self.build_query(options)?;
        Ok(self.backend.find(&query).await?)
    }

    #[instrument(
        skip(self, options, page),
        fields(resource = E::SCHEMA.resource, page = page.page(), limit = page.limit()),
        err
    )]
    async fn paginate(&self, options: &FindOptions, page: &PageOptions) -> Result<Paginated<E>> {
        let query = self.build_query(options)?;
        Ok(pagination::paginate(&self.backend, query, page).await?)
    }

    async fn list_ids(&self, ids: &[EntityId]) -> Result<Vec<E>> {
        self.find_by_ids(ids, TrashMode::None).await
    }

    async fn resolve_children(&self, _targets: &[E]) -> Result<()> {
        Ok(())
    }
}
