//! Business logic over repositories.
//!
//! [`BaseService`] carries everything that is the same for every entity kind: listing,
//! pagination, detail lookups, and the delete/restore lifecycle. The content services wrap it and
//! add create and update through [`Crud`], plus whatever reads are specific to their kind.

pub mod base;
pub mod categories;
pub mod comments;
pub mod posts;

use sqlx::PgPool;

use crate::config::ContentConfig;
use crate::db::handlers::{FlatRepository, TreeRepository};
use crate::db::storage::PostgresBackend;

pub use base::{BaseService, Crud};
pub use categories::CategoryService;
pub use comments::CommentService;
pub use posts::{PostListOptions, PostService};

/// The content services wired to one PostgreSQL pool.
pub struct Services {
    pub categories: CategoryService<PostgresBackend>,
    pub comments: CommentService<PostgresBackend>,
    pub posts: PostService<PostgresBackend>,
}

impl Services {
    pub fn new(pool: PgPool, config: &ContentConfig) -> Self {
        let backend = PostgresBackend::new(pool);
        let categories = TreeRepository::new(backend.clone())
            .with_order(config.categories.order_by.clone())
            .with_children_resolve(config.categories.children_resolve);
        let comments = TreeRepository::new(backend.clone())
            .with_order(config.comments.order_by.clone())
            .with_children_resolve(config.comments.children_resolve);
        let posts = FlatRepository::new(backend.clone()).with_order(config.posts.order_by.clone());
        let links = FlatRepository::new(backend);

        Self {
            posts: PostService::new(posts, categories.clone(), links, config.posts.trash),
            categories: CategoryService::new(categories, config.categories.trash),
            comments: CommentService::new(comments, config.comments.trash),
        }
    }
}
