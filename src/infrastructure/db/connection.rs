use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Row;

use crate::domain::error::{AppError, Result};

const SCHEMA: &str = include_str!("../../../resources/schema.sql");

const SCHEMA_VERSION: i32 = 1;

/// Open the SQLite pool, applying WAL mode and bounded connections.
pub async fn connect_pool(database_url: &str) -> Result<SqlitePool> {
    ensure_db_parent_dir(database_url)?;

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse connection string: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))
}

/// Apply the schema and stamp the version.
///
/// The schema is applied additively (CREATE IF NOT EXISTS + ensure_column),
/// and the database fails fast when its version is newer than this binary
/// supports.
pub async fn init_db(pool: &SqlitePool) -> Result<()> {
    let current_version = read_user_version(pool).await?;
    if current_version > SCHEMA_VERSION {
        return Err(AppError::DatabaseError(format!(
            "Database schema too new: db user_version={} > supported version={}",
            current_version, SCHEMA_VERSION
        )));
    }

    for statement in SCHEMA.split(';') {
        let sql = statement.trim();
        if sql.is_empty() || sql.lines().all(|l| l.trim().starts_with("--") || l.trim().is_empty()) {
            continue;
        }
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to apply schema: {}", e)))?;
    }

    // Additive upgrades for databases created before these columns existed.
    ensure_column(pool, "data_uploads", "checksum", "TEXT").await?;
    ensure_column(pool, "data_uploads", "error_message", "TEXT").await?;

    set_user_version(pool, SCHEMA_VERSION).await?;

    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;

    Ok(())
}

async fn ensure_column(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<()> {
    let pragma_query = format!("PRAGMA table_info({})", table);
    let rows = sqlx::query(&pragma_query)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to inspect {} schema: {}", table, e)))?;

    let exists = rows.iter().any(|row| {
        row.try_get::<String, _>("name")
            .map(|name| name == column)
            .unwrap_or(false)
    });

    if !exists {
        let alter_stmt = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition);
        sqlx::query(&alter_stmt).execute(pool).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to add {} column to {}: {}", column, table, e))
        })?;
    }

    Ok(())
}

async fn read_user_version(pool: &SqlitePool) -> Result<i32> {
    sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read PRAGMA user_version: {}", e)))
}

async fn set_user_version(pool: &SqlitePool, version: i32) -> Result<()> {
    let sql = format!("PRAGMA user_version = {}", version);
    sqlx::query(&sql)
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to set PRAGMA user_version: {}", e)))?;
    Ok(())
}

/// File-backed databases need their parent directory to exist before SQLite
/// can create the file.
fn ensure_db_parent_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .strip_prefix("sqlite://")
        .unwrap_or(database_url);
    if path.contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::IoError(format!("Failed to create db dir: {}", e)))?;
        }
    }
    Ok(())
}

/// Single-connection in-memory pool for tests. A pooled `:memory:` database
/// is per-connection, so the pool must stay at one connection.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").expect("memory url");
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("memory pool")
}
