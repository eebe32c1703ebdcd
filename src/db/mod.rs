/// Database layer for GroupWarden
///
/// Manages the SQLite connection pool and the moderation schema: groups,
/// users, warnings, mutes, bans, media/link rules, banned words, daily
/// stats, and the append-only audit log.
use crate::error::WardenResult;
use sqlx::sqlite::SqlitePool;
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> WardenResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = sqlx::pool::PoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(if options.enable_wal {
                    sqlx::sqlite::SqliteJournalMode::Wal
                } else {
                    sqlx::sqlite::SqliteJournalMode::Delete
                })
                .foreign_keys(true)
                .busy_timeout(std::time::Duration::from_secs(5)),
        )
        .await?;

    Ok(pool)
}

/// Create the moderation schema if it does not exist yet
///
/// Idempotent; runs at startup and in tests against in-memory pools.
pub async fn init_schema(pool: &SqlitePool) -> WardenResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS groups (
            group_id INTEGER PRIMARY KEY,
            title TEXT,
            settings TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            username TEXT,
            first_name TEXT,
            last_name TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS warnings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            group_id INTEGER NOT NULL,
            reason TEXT,
            admin_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutes (
            user_id INTEGER NOT NULL,
            group_id INTEGER NOT NULL,
            until INTEGER NOT NULL,
            PRIMARY KEY (user_id, group_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bans (
            user_id INTEGER NOT NULL,
            group_id INTEGER NOT NULL,
            until INTEGER NOT NULL,
            PRIMARY KEY (user_id, group_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_settings (
            group_id INTEGER NOT NULL,
            media_type TEXT NOT NULL,
            action TEXT NOT NULL,
            PRIMARY KEY (group_id, media_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS link_settings (
            group_id INTEGER NOT NULL,
            domain TEXT NOT NULL,
            action TEXT NOT NULL,
            PRIMARY KEY (group_id, domain)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS banned_words (
            group_id INTEGER NOT NULL,
            word TEXT NOT NULL,
            PRIMARY KEY (group_id, word)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stats (
            group_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            messages INTEGER DEFAULT 0,
            PRIMARY KEY (group_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            event_type TEXT NOT NULL,
            user_id INTEGER,
            admin_id INTEGER,
            details TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Verify the database responds to queries
pub async fn test_connection(pool: &SqlitePool) -> WardenResult<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

/// Open an in-memory database with the full schema, for tests
///
/// Pinned to a single connection: every pooled connection would otherwise
/// see its own empty in-memory database.
#[doc(hidden)]
pub async fn memory_pool() -> WardenResult<SqlitePool> {
    let pool = sqlx::pool::PoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(":memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}
