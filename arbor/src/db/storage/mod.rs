//! Persistence backends.
//!
//! A [`Backend`] stores one entity kind and answers [`Query`]s about it. Repositories hold a
//! backend handle and never see SQL or locks; everything kind-specific (table, columns, trash
//! column, parent link and its delete rule) comes from the entity's
//! [`Schema`](crate::db::models::Schema).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::errors::Result;
use crate::db::models::Entity;
use crate::db::query::Query;
use crate::types::EntityId;

pub mod in_memory;
pub mod postgres;


pub use in_memory::InMemoryBackend;
pub use postgres::PostgresBackend;

/// Storage for one entity kind.
///
/// Handles are cheap to clone and share their underlying store (a connection pool, or an
/// `Arc`-shared table).
#[async_trait]
pub trait Backend<E: Entity>: Clone + Send + Sync + 'static {
    /// Rows matching the query's conditions and trash mode, sorted and windowed.
    ///
    /// # Errors
    /// - `UnknownColumn` if the query names a column the schema doesn't declare
    async fn find(&self, query: &Query) -> Result<Vec<E>>;

    /// Number of rows matching the query's conditions and trash mode. Ordering and window are
    /// ignored.
    async fn count(&self, query: &Query) -> Result<i64>;

    /// Insert a new row and return it as stored.
    ///
    /// # Errors
    /// - `UniqueViolation` if a row with the same id exists
    async fn insert(&self, entity: &E) -> Result<E>;

    /// Overwrite every column of an existing row and return it as stored.
    ///
    /// # Errors
    /// - `NotFound` if no row has the entity's id
    async fn save(&self, entity: &E) -> Result<E>;

    /// Hard-delete rows by id, applying the schema's `ON DELETE` rule to their children. Missing
    /// ids are ignored. Returns the number of rows deleted by the call itself.
    ///
    /// # Errors
    /// - `ForeignKeyViolation` if a `NO ACTION` link still references a deleted row; nothing is
    ///   deleted in that case
    async fn remove(&self, ids: &[EntityId]) -> Result<u64>;

    /// Mark live rows as deleted at `at`. Rows already in the trash are left alone. Returns the
    /// number of rows marked.
    ///
    /// # Errors
    /// - `UnknownColumn` if the kind has no soft-delete column
    async fn soft_remove(&self, ids: &[EntityId], at: DateTime<Utc>) -> Result<u64>;

    /// Clear the deletion mark on trashed rows. Returns the number of rows recovered.
    ///
    /// # Errors
    /// - `UnknownColumn` if the kind has no soft-delete column
    async fn recover(&self, ids: &[EntityId]) -> Result<u64>;
}
