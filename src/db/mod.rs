mod models;

pub use models::*;

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
    let db_path = data_dir.join("smartpark.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Enable WAL mode for better concurrency
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

    // Migration 001: accounts, parking sessions, reports, login sessions
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    info!("Migrations completed");
    Ok(())
}

/// Whether a database error is a UNIQUE / PRIMARY KEY violation on `table.column`
pub(crate) fn is_unique_violation(err: &sqlx::Error, table: &str, column: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message();
            msg.contains("UNIQUE constraint failed") && msg.contains(&format!("{}.{}", table, column))
        }
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::temp_db;

    #[tokio::test]
    async fn test_init_creates_schema() {
        let (_dir, pool) = temp_db().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<String> = tables.into_iter().map(|(n,)| n).collect();

        assert_eq!(
            names,
            vec!["loginSessions", "parkingDetails", "parkingReports", "userDetails"]
        );
    }

    #[tokio::test]
    async fn test_migrations_are_rerunnable() {
        let dir = tempfile::tempdir().unwrap();
        let first = super::init(dir.path()).await.unwrap();
        first.close().await;

        assert!(super::init(dir.path()).await.is_ok());
    }
}
