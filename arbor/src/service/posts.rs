use std::collections::BTreeSet;
use std::ops::Deref;

use async_trait::async_trait;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use tracing::{debug, instrument};

use crate::db::handlers::{FindOptions, FlatRepository, Repository, TreeRepository};
use crate::db::models::Entity;
use crate::db::models::categories::{Category, CategoryId};
use crate::db::models::post_categories::PostCategory;
use crate::db::models::posts::{
    Post, PostCreateDBRequest, PostId, PostOrderType, PostUpdateDBRequest,
};
use crate::db::query::{Condition, TrashMode};
use crate::db::storage::Backend;
use crate::errors::{Error, Result};
use crate::pagination::{PageOptions, Paginated};
use crate::service::base::{BaseService, Crud};
use crate::types::{EntityId, abbrev_uuid, now};

/// Post listing filters, as they arrive in a query string.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListOptions {
    /// Only published (`true`) or only draft (`false`) posts
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub is_published: Option<bool>,
    /// Unset keeps the repository's default ordering
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub order: Option<PostOrderType>,
    /// Only posts filed under this category or any category below it
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub trashed: TrashMode,
}

impl PostListOptions {
    /// Read options for everything except the category filter, which needs a tree lookup.
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::new().trashed(self.trashed);
        if let Some(order) = self.order {
            options = options.order_by(order.order_by());
        }
        match self.is_published {
            Some(true) => options = options.filter(Condition::not_null("published_at")),
            Some(false) => options = options.filter(Condition::is_null("published_at")),
            None => {}
        }
        options
    }
}

/// Posts: flat, with trash, filed under any number of categories.
pub struct PostService<B, C = B, L = B> {
    base: BaseService<Post, FlatRepository<Post, B>>,
    categories: TreeRepository<Category, C>,
    links: FlatRepository<PostCategory, L>,
}

impl<B, C, L> PostService<B, C, L>
where
    B: Backend<Post>,
    C: Backend<Category>,
    L: Backend<PostCategory>,
{
    pub fn new(
        repository: FlatRepository<Post, B>,
        categories: TreeRepository<Category, C>,
        links: FlatRepository<PostCategory, L>,
        enable_trash: bool,
    ) -> Self {
        Self {
            base: BaseService::new(repository).with_trash(enable_trash),
            categories,
            links,
        }
    }

    /// # Errors
    /// - `NotFound` if `options.category` isn't a live category
    pub async fn paginate_posts(
        &self,
        page: &PageOptions,
        options: &PostListOptions,
    ) -> Result<Paginated<Post>> {
        let mut find = options.find_options();
        if let Some(category) = options.category {
            let ids = self.posts_in_category(category).await?;
            find = find.filter(Condition::is_in(Post::SCHEMA.id_column(), ids));
        }
        self.paginate(page, find).await
    }

    /// Ids of the posts filed under `category` or any of its live descendants.
    #[instrument(skip(self, category), fields(category = %abbrev_uuid(&category)), err)]
    pub async fn posts_in_category(&self, category: CategoryId) -> Result<Vec<PostId>> {
        let root = self
            .categories
            .find_one(category, TrashMode::None)
            .await?
            .ok_or_else(|| Error::not_found(Category::SCHEMA.resource, category))?;
        let branch: Vec<CategoryId> = self
            .categories
            .find_descendants(&root, &FindOptions::new())
            .await?
            .iter()
            .map(|category| category.id)
            .collect();

        let options = FindOptions::new().filter(Condition::is_in("category_id", branch));
        let posts: BTreeSet<PostId> =
            self.links.list(&options).await?.into_iter().map(|link| link.post_id).collect();
        Ok(posts.into_iter().collect())
    }

    /// Live categories the post is filed under, in the category ordering.
    #[instrument(skip(self, id), fields(id = %abbrev_uuid(&id)), err)]
    pub async fn categories_of(&self, id: PostId) -> Result<Vec<Category>> {
        let ids: Vec<CategoryId> =
            self.links_of(id).await?.into_iter().map(|link| link.category_id).collect();
        self.categories.find_by_ids(&ids, TrashMode::None).await
    }

    async fn links_of(&self, id: PostId) -> Result<Vec<PostCategory>> {
        self.links.list(&FindOptions::new().filter(Condition::eq("post_id", id))).await
    }

    /// Make the post's links match `requested`, keeping links that stay and skipping ids that
    /// don't name a live category.
    async fn file_under(&self, id: PostId, requested: &[CategoryId]) -> Result<()> {
        let wanted: BTreeSet<CategoryId> = self
            .categories
            .find_by_ids(requested, TrashMode::None)
            .await?
            .iter()
            .map(|category| category.id)
            .collect();
        let current = self.links_of(id).await?;

        let stale: Vec<EntityId> = current
            .iter()
            .filter(|link| !wanted.contains(&link.category_id))
            .map(|link| link.id)
            .collect();
        if !stale.is_empty() {
            self.links.remove(&stale).await?;
        }

        let kept: BTreeSet<CategoryId> = current.iter().map(|link| link.category_id).collect();
        let mut added = 0;
        for category in wanted.difference(&kept) {
            self.links.insert(&PostCategory::new(id, *category)).await?;
            added += 1;
        }
        debug!(added, removed = stale.len(), "Filed post under categories");
        Ok(())
    }
}

impl<B, C, L> Deref for PostService<B, C, L> {
    type Target = BaseService<Post, FlatRepository<Post, B>>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[async_trait]
impl<B, C, L> Crud for PostService<B, C, L>
where
    B: Backend<Post>,
    C: Backend<Category>,
    L: Backend<PostCategory>,
{
    type Entity = Post;
    type CreateRequest = PostCreateDBRequest;
    type UpdateRequest = PostUpdateDBRequest;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&self, request: PostCreateDBRequest) -> Result<Post> {
        let mut post = Post::new(request.title, request.body);
        post.summary = request.summary;
        post.body_type = request.body_type;
        post.published_at = request.published_at;
        post.custom_order = request.custom_order;

        let created = self.repository().insert(&post).await?;
        if !request.categories.is_empty() {
            self.file_under(created.id, &request.categories).await?;
        }
        self.detail(created.id).await
    }

    #[instrument(skip(self, id, request), fields(id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: EntityId, request: PostUpdateDBRequest) -> Result<Post> {
        let mut post = self.detail(id).await?;

        if let Some(categories) = &request.categories {
            self.file_under(id, categories).await?;
        }
        if let Some(title) = request.title {
            post.title = title;
        }
        if let Some(body) = request.body {
            post.body = body;
        }
        if let Some(summary) = request.summary {
            post.summary = summary;
        }
        if let Some(body_type) = request.body_type {
            post.body_type = body_type;
        }
        if let Some(published_at) = request.published_at {
            post.published_at = published_at;
        }
        if let Some(custom_order) = request.custom_order {
            post.custom_order = custom_order;
        }
        post.updated_at = now();

        self.repository().save(&post).await?;
        self.detail(id).await
    }
}
