use std::ops::Deref;

use async_trait::async_trait;
use tracing::instrument;

use crate::db::handlers::{FindOptions, Repository, TreeRepository};
use crate::db::models::categories::{Category, CategoryCreateDBRequest, CategoryUpdateDBRequest};
use crate::db::models::{TreeEntity, TreeNode};
use crate::db::query::TrashMode;
use crate::db::storage::Backend;
use crate::errors::Result;
use crate::service::base::{BaseService, Crud};
use crate::types::{EntityId, abbrev_uuid};

/// Categories: a tree with trash, whose deleted nodes hand their children up by default.
pub struct CategoryService<B> {
    base: BaseService<Category, TreeRepository<Category, B>>,
}

impl<B: Backend<Category>> CategoryService<B> {
    pub fn new(repository: TreeRepository<Category, B>, enable_trash: bool) -> Self {
        Self {
            base: BaseService::new(repository).with_trash(enable_trash),
        }
    }

    /// Every category tree, nested.
    pub async fn find_trees(&self, trashed: TrashMode) -> Result<Vec<TreeNode<Category>>> {
        let trashed = if self.trash_enabled() { trashed } else { TrashMode::None };
        self.repository().find_trees(&FindOptions::new().trashed(trashed)).await
    }

    /// A requested parent must be a live category.
    async fn parent(&self, id: EntityId) -> Result<EntityId> {
        Ok(self.detail(id).await?.id)
    }
}

impl<B> Deref for CategoryService<B> {
    type Target = BaseService<Category, TreeRepository<Category, B>>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[async_trait]
impl<B: Backend<Category>> Crud for CategoryService<B> {
    type Entity = Category;
    type CreateRequest = CategoryCreateDBRequest;
    type UpdateRequest = CategoryUpdateDBRequest;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&self, request: CategoryCreateDBRequest) -> Result<Category> {
        let parent = match request.parent_id {
            Some(pid) => Some(self.parent(pid).await?),
            None => None,
        };
        let category = Category::new(request.name, parent).with_order(request.custom_order);
        let created = self.repository().insert(&category).await?;
        self.detail(created.id).await
    }

    #[instrument(skip(self, id, request), fields(id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: EntityId, request: CategoryUpdateDBRequest) -> Result<Category> {
        let mut category = self.detail(id).await?;

        if let Some(name) = request.name {
            category.name = name;
        }
        if let Some(custom_order) = request.custom_order {
            category.custom_order = custom_order;
        }
        if let Some(parent_id) = request.parent_id {
            // A category can't be its own parent; that request is ignored
            let parent = match parent_id {
                Some(pid) if pid == id => category.parent_id(),
                Some(pid) => Some(self.parent(pid).await?),
                None => None,
            };
            if parent != category.parent_id() {
                category.set_parent_id(parent);
            }
        }

        self.repository().save(&category).await
    }
}
