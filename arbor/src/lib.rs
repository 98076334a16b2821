//! # arbor: hierarchical data access over PostgreSQL
//!
//! Generic repositories for tree-shaped and flat entity kinds, a soft-delete ("trash") lifecycle,
//! and page-based pagination, plus three content kinds built on them: categories, comments and
//! posts.
//!
//! ## Layers
//!
//! - [`service`]: per-kind services. [`service::BaseService`] lists, paginates, looks up, deletes
//!   and restores; the content services add create and update.
//! - [`db::handlers`]: [`TreeRepository`](db::handlers::TreeRepository) assembles trees from the
//!   stored parent links breadth-first and flattens them;
//!   [`FlatRepository`](db::handlers::FlatRepository) pages straight through the backend.
//! - [`db::storage`]: the [`Backend`](db::storage::Backend) trait with PostgreSQL and in-memory
//!   implementations.
//! - [`pagination`]: page options, page metadata, and the two ways a page is cut.
//!
//! ## Example
//!
//! ```no_run
//! use arbor::db::handlers::{ChildrenResolve, FindOptions, TreeRepository};
//! use arbor::db::models::categories::Category;
//! use arbor::db::order::OrderBy;
//! use arbor::db::storage::InMemoryBackend;
//! use arbor::service::BaseService;
//!
//! # async fn example() -> arbor::errors::Result<()> {
//! let repository = TreeRepository::new(InMemoryBackend::<Category>::new())
//!     .with_order(Some(OrderBy::asc("custom_order")))
//!     .with_children_resolve(ChildrenResolve::Up);
//! let categories = BaseService::new(repository).with_trash(true);
//!
//! for node in categories.list(FindOptions::new()).await? {
//!     println!("{}{}", "  ".repeat(node.depth), node.item.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod errors;
pub mod pagination;
pub mod service;
pub mod telemetry;
pub mod types;

pub use config::Config;
