//! PostgreSQL storage implementation.
//!
//! Statements are assembled at runtime with [`QueryBuilder`] from the entity's schema. Values are
//! always bound; identifiers are spliced in, which is safe because every column a query names is
//! checked against the schema first and table names are compile-time constants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::query_builder::QueryBuilder;
use sqlx::{FromRow, Postgres};
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::Entity;
use crate::db::query::{Condition, Query, TrashMode, Value};
use crate::db::storage::Backend;
use crate::types::{EntityId, abbrev_uuid, abbrev_uuids};

/// PostgreSQL storage backend.
///
/// One handle serves every entity kind; the kind is picked by the type parameter of the
/// [`Backend`] impl in use. Clones share the connection pool.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Create a new backend over the given connection pool.
    ///
    /// # Example
    /// ```ignore
    /// let pool = PgPool::connect("postgresql://localhost/arbor").await?;
    /// let backend = PostgresBackend::new(pool);
    /// ```
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value.clone() {
        Value::Uuid(v) => builder.push_bind(v),
        Value::Text(v) => builder.push_bind(v),
        Value::Int(v) => builder.push_bind(v),
        Value::Bool(v) => builder.push_bind(v),
        Value::Timestamp(v) => builder.push_bind(v),
    };
}

/// Append the trash clause and every condition to a statement ending in a `WHERE` clause.
fn push_filters<E: Entity>(builder: &mut QueryBuilder<'_, Postgres>, query: &Query) {
    match (E::SCHEMA.deleted_at, query.trashed) {
        (Some(column), TrashMode::None) => {
            builder.push(format!(" AND {column} IS NULL"));
        }
        (Some(column), TrashMode::Only) => {
            builder.push(format!(" AND {column} IS NOT NULL"));
        }
        // Nothing can be in the trash of a kind without one
        (None, TrashMode::Only) => {
            builder.push(" AND FALSE");
        }
        (_, TrashMode::All) | (None, TrashMode::None) => {}
    }

    for condition in &query.conditions {
        match condition {
            Condition::Eq(column, value) => {
                builder.push(format!(" AND {column} = "));
                push_value(builder, value);
            }
            Condition::In(_, values) if values.is_empty() => {
                builder.push(" AND FALSE");
            }
            Condition::In(column, values) => {
                builder.push(format!(" AND {column} IN ("));
                let mut separated = builder.separated(", ");
                for value in values {
                    match value.clone() {
                        Value::Uuid(v) => separated.push_bind(v),
                        Value::Text(v) => separated.push_bind(v),
                        Value::Int(v) => separated.push_bind(v),
                        Value::Bool(v) => separated.push_bind(v),
                        Value::Timestamp(v) => separated.push_bind(v),
                    };
                }
                builder.push(")");
            }
            Condition::IsNull(column) => {
                builder.push(format!(" AND {column} IS NULL"));
            }
            Condition::NotNull(column) => {
                builder.push(format!(" AND {column} IS NOT NULL"));
            }
        }
    }
}

fn trash_column<E: Entity>() -> Result<&'static str> {
    E::SCHEMA.deleted_at.ok_or_else(|| DbError::UnknownColumn {
        table: E::SCHEMA.table,
        column: "deleted_at".to_string(),
    })
}

#[async_trait]
impl<E> Backend<E> for PostgresBackend
where
    E: Entity + for<'r> FromRow<'r, PgRow>,
{
    #[instrument(skip(self, query), fields(table = E::SCHEMA.table, trashed = %query.trashed), err)]
    async fn find(&self, query: &Query) -> Result<Vec<E>> {
        query.check_columns(&E::SCHEMA)?;

        let mut builder = QueryBuilder::new(format!("SELECT * FROM {} WHERE 1=1", E::SCHEMA.table));
        push_filters::<E>(&mut builder, query);

        if !query.order.is_empty() {
            builder.push(" ORDER BY ");
            let mut separated = builder.separated(", ");
            for field in &query.order {
                separated.push(format!("{} {}", field.column, field.direction.as_sql()));
            }
        }
        if let Some(take) = query.take {
            builder.push(" LIMIT ");
            builder.push_bind(take);
        }
        if let Some(skip) = query.skip {
            builder.push(" OFFSET ");
            builder.push_bind(skip);
        }

        let rows = builder.build_query_as::<E>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    #[instrument(skip(self, query), fields(table = E::SCHEMA.table, trashed = %query.trashed), err)]
    async fn count(&self, query: &Query) -> Result<i64> {
        let query = query.for_count();
        query.check_columns(&E::SCHEMA)?;

        let sql = format!("SELECT COUNT(*) FROM {} WHERE 1=1", E::SCHEMA.table);
        let mut builder = QueryBuilder::new(sql);
        push_filters::<E>(&mut builder, &query);

        let count: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    #[instrument(
        skip(self, entity),
        fields(table = E::SCHEMA.table, id = %abbrev_uuid(&entity.id())),
        err
    )]
    async fn insert(&self, entity: &E) -> Result<E> {
        let columns = E::SCHEMA.columns;
        let sql = format!("INSERT INTO {} ({}) VALUES (", E::SCHEMA.table, columns.join(", "));
        let mut builder = QueryBuilder::new(sql);
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            let value = entity.value(column).ok_or_else(|| DbError::UnknownColumn {
                table: E::SCHEMA.table,
                column: column.to_string(),
            })?;
            push_value(&mut builder, &value);
        }
        builder.push(") RETURNING *");

        let row = builder.build_query_as::<E>().fetch_one(&self.pool).await?;
        Ok(row)
    }

    #[instrument(
        skip(self, entity),
        fields(table = E::SCHEMA.table, id = %abbrev_uuid(&entity.id())),
        err
    )]
    async fn save(&self, entity: &E) -> Result<E> {
        let id_column = E::SCHEMA.id_column();
        let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", E::SCHEMA.table));
        for (i, column) in E::SCHEMA.columns.iter().filter(|c| **c != id_column).enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            let value = entity.value(column).ok_or_else(|| DbError::UnknownColumn {
                table: E::SCHEMA.table,
                column: column.to_string(),
            })?;
            builder.push(format!("{column} = "));
            push_value(&mut builder, &value);
        }
        builder.push(format!(" WHERE {id_column} = "));
        builder.push_bind(entity.id());
        builder.push(" RETURNING *");

        let row = builder.build_query_as::<E>().fetch_optional(&self.pool).await?;
        row.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self, ids), fields(table = E::SCHEMA.table, ids = %abbrev_uuids(ids)), err)]
    async fn remove(&self, ids: &[EntityId]) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ANY(", E::SCHEMA.table, E::SCHEMA.id_column());
        let mut builder = QueryBuilder::new(sql);
        builder.push_bind(ids.to_vec());
        builder.push(")");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, ids), fields(table = E::SCHEMA.table, ids = %abbrev_uuids(ids)), err)]
    async fn soft_remove(&self, ids: &[EntityId], at: DateTime<Utc>) -> Result<u64> {
        let column = trash_column::<E>()?;
        let mut builder = QueryBuilder::new(format!("UPDATE {} SET {column} = ", E::SCHEMA.table));
        builder.push_bind(at);
        builder.push(format!(" WHERE {} = ANY(", E::SCHEMA.id_column()));
        builder.push_bind(ids.to_vec());
        builder.push(format!(") AND {column} IS NULL"));

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, ids), fields(table = E::SCHEMA.table, ids = %abbrev_uuids(ids)), err)]
    async fn recover(&self, ids: &[EntityId]) -> Result<u64> {
        let column = trash_column::<E>()?;
        let sql = format!(
            "UPDATE {} SET {column} = NULL WHERE {} = ANY(",
            E::SCHEMA.table,
            E::SCHEMA.id_column()
        );
        let mut builder = QueryBuilder::new(sql);
        builder.push_bind(ids.to_vec());
        builder.push(format!(") AND {column} IS NOT NULL"));

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
