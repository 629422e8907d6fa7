//! SQLite pool construction and schema migrations.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::AppResult;

/// Default pool size for file-backed databases.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Open a pool with the default size and apply all migrations.
pub async fn create_pool(database_url: &str) -> AppResult<SqlitePool> {
    create_pool_with(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Open a pool and apply all migrations.
///
/// In-memory databases exist per connection, so they are pinned to a single
/// connection that is never recycled.
pub async fn create_pool_with(database_url: &str, max_connections: u32) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::debug!("Database ready at {}", database_url);

    Ok(pool)
}
