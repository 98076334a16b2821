//! In-memory storage implementation.
//!
//! Rows live in a `Vec` behind a shared lock, in insertion order, which is the "storage order" a
//! query without an ordering sees. It's suitable for testing and single-process use. Rows are
//! lost on restart.
//!
//! The backend reproduces the parts of PostgreSQL semantics the repositories rely on: NULL
//! handling in filters and sorts, unique ids, and the parent link's `ON DELETE` rule.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::{Entity, OnDelete};
use crate::db::order::OrderDirection;
use crate::db::query::Query;
use crate::db::storage::Backend;
use crate::types::{EntityId, abbrev_uuids};

/// In-memory implementation of the [`Backend`] trait.
///
/// Clones share the same rows.
///
/// # Example
/// ```ignore
/// let backend = InMemoryBackend::<Category>::new();
/// backend.insert(&Category::new("Rust", None)).await?;
/// ```
pub struct InMemoryBackend<E> {
    rows: Arc<RwLock<Vec<E>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> InMemoryBackend<E> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            _entity: PhantomData,
        }
    }

    /// Seed a backend with rows, bypassing every check.
    pub fn with_rows(rows: impl IntoIterator<Item = E>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows.into_iter().collect())),
            _entity: PhantomData,
        }
    }

    /// Number of stored rows, trashed ones included.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn matching(&self, query: &Query) -> Vec<E> {
        let rows = self.rows.read();
        rows.iter()
            .filter(|row| query.trashed.admits(row.is_trashed()))
            .filter(|row| query.conditions.iter().all(|c| c.matches(|column| row.value(column))))
            .cloned()
            .collect()
    }

    fn require_trash_column(&self) -> Result<()> {
        if E::SCHEMA.supports_trash() {
            Ok(())
        } else {
            Err(DbError::UnknownColumn {
                table: E::SCHEMA.table,
                column: "deleted_at".to_string(),
            })
        }
    }
}

impl<E: Entity> Default for InMemoryBackend<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for InMemoryBackend<E> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            _entity: PhantomData,
        }
    }
}

/// Parent of a row under the schema's tree link, if the kind has one.
fn parent_of<E: Entity>(row: &E) -> Option<EntityId> {
    let link = E::SCHEMA.tree?;
    row.value(link.parent_column)?.as_uuid()
}

#[async_trait]
impl<E: Entity> Backend<E> for InMemoryBackend<E> {
    async fn find(&self, query: &Query) -> Result<Vec<E>> {
        query.check_columns(&E::SCHEMA)?;
        let mut rows = self.matching(query);

        if !query.order.is_empty() {
            // Stable, so rows tied on every key keep storage order
            rows.sort_by(|a, b| {
                query
                    .order
                    .iter()
                    .map(|field| {
                        let (x, y) = (a.value(&field.column), b.value(&field.column));
                        let ordering = match (x, y) {
                            (Some(x), Some(y)) => x.compare(&y),
                            _ => Ordering::Equal,
                        };
                        match field.direction {
                            OrderDirection::Asc => ordering,
                            OrderDirection::Desc => ordering.reverse(),
                        }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let skip = query.skip.unwrap_or(0).max(0) as usize;
        let rows = rows.into_iter().skip(skip);
        Ok(match query.take {
            Some(take) => rows.take(take.max(0) as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn count(&self, query: &Query) -> Result<i64> {
        query.for_count().check_columns(&E::SCHEMA)?;
        Ok(self.matching(query).len() as i64)
    }

    async fn insert(&self, entity: &E) -> Result<E> {
        let mut rows = self.rows.write();
        if rows.iter().any(|row| row.id() == entity.id()) {
            return Err(DbError::UniqueViolation {
                constraint: Some(format!("{}_pkey", E::SCHEMA.table)),
                table: Some(E::SCHEMA.table.to_string()),
                message: format!(
                    "duplicate key value violates unique constraint on {}",
                    E::SCHEMA.table
                ),
            });
        }
        rows.push(entity.clone());
        Ok(entity.clone())
    }

    async fn save(&self, entity: &E) -> Result<E> {
        let mut rows = self.rows.write();
        let row = rows.iter_mut().find(|row| row.id() == entity.id()).ok_or(DbError::NotFound)?;
        *row = entity.clone();
        Ok(entity.clone())
    }

    #[instrument(skip(self, ids), fields(table = E::SCHEMA.table, ids = %abbrev_uuids(ids)), err)]
    async fn remove(&self, ids: &[EntityId]) -> Result<u64> {
        let mut rows = self.rows.write();
        let requested: HashSet<EntityId> = ids.iter().copied().collect();
        let mut doomed: HashSet<EntityId> = rows
            .iter()
            .map(|row| row.id())
            .filter(|id| requested.contains(id))
            .collect();
        let direct = doomed.len() as u64;

        match E::SCHEMA.tree.map(|link| link.on_delete) {
            Some(OnDelete::Cascade) => loop {
                let before = doomed.len();
                for row in rows.iter() {
                    if parent_of(row).is_some_and(|parent| doomed.contains(&parent)) {
                        doomed.insert(row.id());
                    }
                }
                if doomed.len() == before {
                    break;
                }
            },
            Some(OnDelete::NoAction) => {
                let dangling = rows.iter().find(|row| {
                    !doomed.contains(&row.id())
                        && parent_of(*row).is_some_and(|parent| doomed.contains(&parent))
                });
                if let Some(child) = dangling {
                    return Err(DbError::ForeignKeyViolation {
                        constraint: Some(format!("{}_parent_id_fkey", E::SCHEMA.table)),
                        table: Some(E::SCHEMA.table.to_string()),
                        message: format!(
                            "{} {} still references a deleted parent",
                            E::SCHEMA.resource,
                            child.id()
                        ),
                    });
                }
            }
            None => {}
        }

        rows.retain(|row| !doomed.contains(&row.id()));
        Ok(direct)
    }

    async fn soft_remove(&self, ids: &[EntityId], at: DateTime<Utc>) -> Result<u64> {
        self.require_trash_column()?;
        let mut rows = self.rows.write();
        let mut marked = 0;
        for row in rows.iter_mut().filter(|row| ids.contains(&row.id()) && !row.is_trashed()) {
            row.set_deleted_at(Some(at));
            marked += 1;
        }
        Ok(marked)
    }

    async fn recover(&self, ids: &[EntityId]) -> Result<u64> {
        self.require_trash_column()?;
        let mut rows = self.rows.write();
        let mut recovered = 0;
        for row in rows.iter_mut().filter(|row| ids.contains(&row.id()) && row.is_trashed()) {
            row.set_deleted_at(None);
            recovered += 1;
        }
        Ok(recovered)
    }
}
