//! Data access layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Services   │  (service - CRUD, trash lifecycle, pagination)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │ Repositories │  (db::handlers - tree and flat reads, children policies)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │   Backends   │  (db::storage - PostgreSQL or in-memory)
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`query`]: backend-neutral filters, trash visibility and windows
//! - [`order`]: ordering specifications
//! - [`models`]: entity traits, schemas and the content records
//! - [`storage`]: the [`Backend`](storage::Backend) trait and its implementations
//! - [`handlers`]: tree and flat repositories
//! - [`errors`]: backend error type

pub mod errors;
pub mod handlers;
pub mod models;
pub mod order;
pub mod query;
pub mod storage;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::PoolSettings;

/// Get the content-table migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open a connection pool with the given settings. Zero idle/lifetime timeouts mean "never".
pub async fn connect(url: &str, settings: &PoolSettings) -> errors::Result<PgPool> {
    let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
    let idle_timeout = seconds(settings.idle_timeout_secs);
    let max_lifetime = seconds(settings.max_lifetime_secs);

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(idle_timeout)
        .max_lifetime(max_lifetime)
        .connect(url)
        .await?;

    info!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        "Connected to database"
    );
    Ok(pool)
}
