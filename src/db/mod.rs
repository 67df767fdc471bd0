//! Database module for the relational remote store.
//!
//! User-data tables are optional: an unprovisioned database is a supported state that the
//! persistence layer degrades around.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::Collection;

/// Initialize the database connection pool, creating the user-data tables when `provision`
/// is set.
pub async fn init_database(db_path: &Path, provision: bool) -> Result<SqlitePool, AppError> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create database directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if provision {
        run_migrations(&pool).await?;
    } else {
        tracing::warn!("User-data tables not provisioned; saved data stays in the local mirror");
    }

    Ok(pool)
}

/// Create the user-data tables.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for collection in [Collection::Bundles, Collection::Workflows] {
        let table = collection.table();
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                cost TEXT NOT NULL DEFAULT '',
                tools TEXT NOT NULL DEFAULT 'null',
                metadata TEXT NOT NULL DEFAULT 'null',
                saved_at TEXT NOT NULL,
                PRIMARY KEY (user_id, id)
            );
            "#
        ))
        .execute(pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_saved_at ON {table}(user_id, saved_at);"
        ))
        .execute(pool)
        .await?;
    }

    // One draft per user
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflow_drafts (
            user_id TEXT PRIMARY KEY,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            workflow TEXT NOT NULL DEFAULT 'null',
            auto_saved INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
