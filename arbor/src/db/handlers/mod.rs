//! Repositories: the data access layer for each entity kind.
//!
//! [`TreeRepository`] and [`FlatRepository`] both implement [`Repository`]; services are generic
//! over it, so the tree-or-flat choice is made once, by type, when a service is built.

pub mod flat;
pub mod repository;
pub mod tree;

pub use flat::FlatRepository;
pub use repository::{ChildrenResolve, FindOptions, Repository};
pub use tree::{TreeRepository, to_flat_trees};
