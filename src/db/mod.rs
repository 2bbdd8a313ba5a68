pub mod accounts;
mod models;
mod seeders;

pub use models::*;
pub use seeders::{check_admin_password, seed_admin, seed_configured_admin, SeedOutcome};

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("farmerjoin.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());
    connect(&db_url, 5).await
}

/// Open a pool, apply pragmas and bring the schema up to date.
///
/// In-memory databases live per connection, so callers using
/// `sqlite::memory:` must pass `max_connections = 1`.
pub async fn connect(db_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(db_url)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Accounts
    execute_sql(pool, include_str!("../../migrations/001_users.sql")).await?;

    // Migration 002: Farmer and buyer profiles
    execute_sql(pool, include_str!("../../migrations/002_profiles.sql")).await?;

    // Migration 003: Cooperative profiles
    let has_cooperatives_table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='cooperatives'",
    )
    .fetch_optional(pool)
    .await?;
    if has_cooperatives_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/003_cooperatives.sql")).await?;
    }

    // Migration 004: Profile photo on users
    let has_photo: Option<(String,)> =
        sqlx::query_as("SELECT name FROM pragma_table_info('users') WHERE name = 'photo'")
            .fetch_optional(pool)
            .await?;
    if has_photo.is_none() {
        execute_sql(pool, include_str!("../../migrations/004_user_photo.sql")).await?;
    }

    info!("Migrations completed");
    Ok(())
}

/// True when the error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

/// Single-connection in-memory database for tests
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database")
}
