//! Entity model: record shapes, their schemas, and the transient tree views built from them.
//!
//! Records are plain structs that implement [`Entity`]; tree-shaped ones also implement
//! [`TreeEntity`]. The only persisted tree topology is the parent column. `children` and `depth`
//! exist solely on the traversal results [`TreeNode`] and [`FlatNode`], which are rebuilt on
//! every read and never written back.

pub mod categories;
pub mod comments;
pub mod post_categories;
pub mod posts;

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::query::Value;
use crate::types::EntityId;

/// What the backend does to children when a parent row is hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Children are deleted with the parent
    Cascade,
    /// Deleting a parent that still has children is a foreign key violation
    NoAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLink {
    pub parent_column: &'static str,
    pub on_delete: OnDelete,
}

/// Static description of the table backing an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub table: &'static str,
    /// Human-readable name used in errors and logs
    pub resource: &'static str,
    /// Every column, in insert order. The first one is the primary key.
    pub columns: &'static [&'static str],
    /// Soft-delete marker column, if the kind supports trash
    pub deleted_at: Option<&'static str>,
    pub tree: Option<TreeLink>,
}

impl Schema {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    pub fn supports_trash(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn id_column(&self) -> &'static str {
        self.columns.first().copied().unwrap_or("id")
    }
}

/// A storable record.
pub trait Entity: Clone + Debug + Send + Sync + Unpin + 'static {
    const SCHEMA: Schema;

    fn id(&self) -> EntityId;

    /// Read a column by name; `None` when the schema has no such column.
    fn value(&self, column: &str) -> Option<Value>;

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn set_deleted_at(&mut self, _at: Option<DateTime<Utc>>) {}

    fn is_trashed(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// A record linked to a parent of the same kind.
pub trait TreeEntity: Entity {
    fn parent_id(&self) -> Option<EntityId>;

    fn set_parent_id(&mut self, parent: Option<EntityId>);

    fn parent_column() -> &'static str {
        Self::SCHEMA.tree.map(|link| link.parent_column).unwrap_or("parent_id")
    }
}

/// An entity with its descendants attached, as assembled by a tree query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<E> {
    #[serde(flatten)]
    pub item: E,
    pub children: Vec<TreeNode<E>>,
}

impl<E> TreeNode<E> {
    pub fn leaf(item: E) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including the node itself.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// One entry of a flattened tree.
///
/// `parent` is the entry's parent in the traversal that produced it, which is not necessarily the
/// stored parent reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatNode<E> {
    #[serde(flatten)]
    pub item: E,
    pub depth: usize,
    pub parent: Option<EntityId>,
}

impl<E: Entity> FlatNode<E> {
    pub fn id(&self) -> EntityId {
        self.item.id()
    }
}
