/// Sanction store: mutes, bans, warnings, user snapshots, daily stats,
/// and the append-only audit log
///
/// Mutes and bans are keyed by (user, group) with replace semantics: a new
/// record overwrites any prior one, never stacks. A ban with `until = 0`
/// is permanent.
use super::epoch_now;
use crate::error::WardenResult;
use sqlx::{Row, SqlitePool};

/// A stored warning
#[derive(Debug, Clone)]
pub struct WarningRecord {
    pub id: i64,
    pub user_id: i64,
    pub group_id: i64,
    pub reason: Option<String>,
    pub admin_id: i64,
    pub created_at: i64,
}

/// One audit log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub event_type: String,
    pub user_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub details: Option<String>,
    pub created_at: i64,
}

/// Manager for durable sanction state
#[derive(Clone)]
pub struct SanctionStore {
    db: SqlitePool,
}

impl SanctionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ---- Mutes ----

    /// Mute a user for `duration_secs`, replacing any prior mute
    pub async fn mute(&self, user_id: i64, group_id: i64, duration_secs: u64) -> WardenResult<()> {
        let until = epoch_now() + duration_secs as i64;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO mutes (user_id, group_id, until)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .bind(until)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn unmute(&self, user_id: i64, group_id: i64) -> WardenResult<()> {
        sqlx::query("DELETE FROM mutes WHERE user_id = ?1 AND group_id = ?2")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Whether the user has an active mute; expires exactly at `until`
    pub async fn is_muted(&self, user_id: i64, group_id: i64) -> WardenResult<bool> {
        let row = sqlx::query(
            "SELECT until FROM mutes WHERE user_id = ?1 AND group_id = ?2 AND until > ?3",
        )
        .bind(user_id)
        .bind(group_id)
        .bind(epoch_now())
        .fetch_optional(&self.db)
        .await?;
        Ok(row.is_some())
    }

    /// Expiry of the stored mute, if one exists (active or not)
    pub async fn mute_until(&self, user_id: i64, group_id: i64) -> WardenResult<Option<i64>> {
        let row = sqlx::query("SELECT until FROM mutes WHERE user_id = ?1 AND group_id = ?2")
            .bind(user_id)
            .bind(group_id)
            .fetch_optional(&self.db)
            .await?;
        row.map(|r| r.try_get("until").map_err(Into::into)).transpose()
    }

    /// Users with an active mute in a group
    pub async fn muted_users(&self, group_id: i64) -> WardenResult<Vec<i64>> {
        let rows = sqlx::query("SELECT user_id FROM mutes WHERE group_id = ?1 AND until > ?2")
            .bind(group_id)
            .bind(epoch_now())
            .fetch_all(&self.db)
            .await?;
        rows.into_iter()
            .map(|row| row.try_get::<i64, _>("user_id").map_err(Into::into))
            .collect()
    }

    // ---- Bans ----

    /// Ban a user, replacing any prior ban; `None` duration is permanent
    pub async fn ban(
        &self,
        user_id: i64,
        group_id: i64,
        duration_secs: Option<u64>,
    ) -> WardenResult<()> {
        let until = match duration_secs {
            Some(0) | None => 0,
            Some(d) => epoch_now() + d as i64,
        };
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO bans (user_id, group_id, until)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .bind(until)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn unban(&self, user_id: i64, group_id: i64) -> WardenResult<()> {
        sqlx::query("DELETE FROM bans WHERE user_id = ?1 AND group_id = ?2")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Whether the user has an active ban (`until = 0` means permanent)
    pub async fn is_banned(&self, user_id: i64, group_id: i64) -> WardenResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT until FROM bans
            WHERE user_id = ?1 AND group_id = ?2 AND (until = 0 OR until > ?3)
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .bind(epoch_now())
        .fetch_optional(&self.db)
        .await?;
        Ok(row.is_some())
    }

    /// Expiry of the stored ban, if one exists; 0 means permanent
    pub async fn ban_until(&self, user_id: i64, group_id: i64) -> WardenResult<Option<i64>> {
        let row = sqlx::query("SELECT until FROM bans WHERE user_id = ?1 AND group_id = ?2")
            .bind(user_id)
            .bind(group_id)
            .fetch_optional(&self.db)
            .await?;
        row.map(|r| r.try_get("until").map_err(Into::into)).transpose()
    }

    // ---- Warnings ----

    /// Append a warning; returns its id
    pub async fn add_warning(
        &self,
        user_id: i64,
        group_id: i64,
        reason: &str,
        admin_id: i64,
    ) -> WardenResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO warnings (user_id, group_id, reason, admin_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .bind(reason)
        .bind(admin_id)
        .bind(epoch_now())
        .execute(&self.db)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn warning_count(&self, user_id: i64, group_id: i64) -> WardenResult<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM warnings WHERE user_id = ?1 AND group_id = ?2")
                .bind(user_id)
                .bind(group_id)
                .fetch_one(&self.db)
                .await?;
        Ok(count as u32)
    }

    /// Bulk-delete all warnings for a (user, group) pair
    pub async fn reset_warnings(&self, user_id: i64, group_id: i64) -> WardenResult<()> {
        sqlx::query("DELETE FROM warnings WHERE user_id = ?1 AND group_id = ?2")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// All warnings issued in a group, newest first
    pub async fn warnings_for_group(&self, group_id: i64) -> WardenResult<Vec<WarningRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, group_id, reason, admin_id, created_at
            FROM warnings
            WHERE group_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.db)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(WarningRecord {
                id: row.try_get("id")?,
                user_id: row.try_get("user_id")?,
                group_id: row.try_get("group_id")?,
                reason: row.try_get("reason")?,
                admin_id: row.try_get("admin_id")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(records)
    }

    // ---- Users ----

    /// Store the latest profile snapshot for a user
    pub async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> WardenResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO users (user_id, username, first_name, last_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(epoch_now())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    // ---- Stats ----

    /// Count one delivered message toward today's total
    pub async fn record_message(&self, group_id: i64) -> WardenResult<()> {
        let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        sqlx::query(
            r#"
            INSERT INTO stats (group_id, date, messages)
            VALUES (?1, ?2, 1)
            ON CONFLICT(group_id, date) DO UPDATE SET messages = messages + 1
            "#,
        )
        .bind(group_id)
        .bind(date)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Message count for a group on a calendar date
    pub async fn message_count(&self, group_id: i64, date: &str) -> WardenResult<i64> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT messages FROM stats WHERE group_id = ?1 AND date = ?2")
                .bind(group_id)
                .bind(date)
                .fetch_optional(&self.db)
                .await?;
        Ok(count.unwrap_or(0))
    }

    // ---- Audit log ----

    /// Append an audit log entry
    pub async fn log(
        &self,
        group_id: i64,
        event_type: &str,
        user_id: Option<i64>,
        admin_id: Option<i64>,
        details: Option<&str>,
    ) -> WardenResult<()> {
        sqlx::query(
            r#"
            INSERT INTO logs (group_id, event_type, user_id, admin_id, details, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(group_id)
        .bind(event_type)
        .bind(user_id)
        .bind(admin_id)
        .bind(details)
        .bind(epoch_now())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Most recent log entries for a group
    pub async fn recent_logs(&self, group_id: i64, limit: u32) -> WardenResult<Vec<LogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT event_type, user_id, admin_id, details, created_at
            FROM logs
            WHERE group_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(group_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(LogEntry {
                event_type: row.try_get("event_type")?,
                user_id: row.try_get("user_id")?,
                admin_id: row.try_get("admin_id")?,
                details: row.try_get("details")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(entries)
    }

    // ---- Maintenance ----

    /// Delete expired mutes and expired non-permanent bans
    ///
    /// Returns the number of rows removed. Permanent bans (`until = 0`)
    /// are never touched.
    pub async fn purge_expired(&self) -> WardenResult<u64> {
        let now = epoch_now();
        let mutes = sqlx::query("DELETE FROM mutes WHERE until <= ?1")
            .bind(now)
            .execute(&self.db)
            .await?
            .rows_affected();
        let bans = sqlx::query("DELETE FROM bans WHERE until != 0 AND until <= ?1")
            .bind(now)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(mutes + bans)
    }
}
