/// Settings store: per-group configuration documents and rule tables
use super::epoch_now;
use crate::error::WardenResult;
use crate::event::MediaKind;
use crate::policy::{GroupSettings, RuleAction};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

/// Manager for group settings, media/link rules, and banned words
#[derive(Clone)]
pub struct SettingsStore {
    db: SqlitePool,
}

impl SettingsStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Fetch a group's settings document, materializing the default
    /// document on first read
    ///
    /// Concurrent first reads race on the insert; `ON CONFLICT DO NOTHING`
    /// plus the re-read keeps materialization idempotent.
    pub async fn get_settings(&self, group_id: i64) -> WardenResult<GroupSettings> {
        if let Some(settings) = self.read_settings(group_id).await? {
            return Ok(settings);
        }

        let defaults = GroupSettings::default();
        sqlx::query(
            r#"
            INSERT INTO groups (group_id, title, settings, created_at)
            VALUES (?1, '', ?2, ?3)
            ON CONFLICT(group_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(serde_json::to_string(&defaults)?)
        .bind(epoch_now())
        .execute(&self.db)
        .await?;

        // A concurrent writer may have won the insert; the stored row wins
        Ok(self
            .read_settings(group_id)
            .await?
            .unwrap_or(defaults))
    }

    async fn read_settings(&self, group_id: i64) -> WardenResult<Option<GroupSettings>> {
        let row = sqlx::query("SELECT settings FROM groups WHERE group_id = ?1")
            .bind(group_id)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("settings")?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    /// Replace a group's settings document wholesale
    pub async fn update_settings(
        &self,
        group_id: i64,
        settings: &GroupSettings,
    ) -> WardenResult<()> {
        sqlx::query(
            r#"
            INSERT INTO groups (group_id, title, settings, created_at)
            VALUES (?1, '', ?2, ?3)
            ON CONFLICT(group_id) DO UPDATE SET settings = excluded.settings
            "#,
        )
        .bind(group_id)
        .bind(serde_json::to_string(settings)?)
        .bind(epoch_now())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Register a group or refresh its title, keeping the stored settings
    pub async fn upsert_group(&self, group_id: i64, title: &str) -> WardenResult<()> {
        sqlx::query(
            r#"
            INSERT INTO groups (group_id, title, settings, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(group_id) DO UPDATE SET title = excluded.title
            "#,
        )
        .bind(group_id)
        .bind(title)
        .bind(serde_json::to_string(&GroupSettings::default())?)
        .bind(epoch_now())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    // ---- Media rules ----

    /// Set the stored action for a media kind
    pub async fn set_media_action(
        &self,
        group_id: i64,
        kind: MediaKind,
        action: RuleAction,
    ) -> WardenResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO media_settings (group_id, media_type, action)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(group_id)
        .bind(kind.as_str())
        .bind(action.as_str())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Stored action for a media kind; `Off` when no rule exists
    pub async fn media_action(&self, group_id: i64, kind: MediaKind) -> WardenResult<RuleAction> {
        let row = sqlx::query(
            "SELECT action FROM media_settings WHERE group_id = ?1 AND media_type = ?2",
        )
        .bind(group_id)
        .bind(kind.as_str())
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => RuleAction::parse(&row.try_get::<String, _>("action")?),
            None => Ok(RuleAction::Off),
        }
    }

    // ---- Link rules ----

    /// Set the action for a domain
    pub async fn set_link_rule(
        &self,
        group_id: i64,
        domain: &str,
        action: RuleAction,
    ) -> WardenResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO link_settings (group_id, domain, action)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(group_id)
        .bind(domain.to_lowercase())
        .bind(action.as_str())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn remove_link_rule(&self, group_id: i64, domain: &str) -> WardenResult<()> {
        sqlx::query("DELETE FROM link_settings WHERE group_id = ?1 AND domain = ?2")
            .bind(group_id)
            .bind(domain.to_lowercase())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Explicit rule for one domain, if any
    pub async fn link_action(
        &self,
        group_id: i64,
        domain: &str,
    ) -> WardenResult<Option<RuleAction>> {
        let row = sqlx::query("SELECT action FROM link_settings WHERE group_id = ?1 AND domain = ?2")
            .bind(group_id)
            .bind(domain.to_lowercase())
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => Ok(Some(RuleAction::parse(&row.try_get::<String, _>("action")?)?)),
            None => Ok(None),
        }
    }

    /// All explicit domain rules for a group
    pub async fn link_rules(&self, group_id: i64) -> WardenResult<HashMap<String, RuleAction>> {
        let rows = sqlx::query("SELECT domain, action FROM link_settings WHERE group_id = ?1")
            .bind(group_id)
            .fetch_all(&self.db)
            .await?;

        let mut rules = HashMap::with_capacity(rows.len());
        for row in rows {
            let domain: String = row.try_get("domain")?;
            let action = RuleAction::parse(&row.try_get::<String, _>("action")?)?;
            rules.insert(domain, action);
        }
        Ok(rules)
    }

    // ---- Banned words ----

    /// Add a word to the group's banned set (stored lowercase)
    pub async fn add_banned_word(&self, group_id: i64, word: &str) -> WardenResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO banned_words (group_id, word)
            VALUES (?1, ?2)
            "#,
        )
        .bind(group_id)
        .bind(word.to_lowercase())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn remove_banned_word(&self, group_id: i64, word: &str) -> WardenResult<()> {
        sqlx::query("DELETE FROM banned_words WHERE group_id = ?1 AND word = ?2")
            .bind(group_id)
            .bind(word.to_lowercase())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn banned_words(&self, group_id: i64) -> WardenResult<Vec<String>> {
        let rows = sqlx::query("SELECT word FROM banned_words WHERE group_id = ?1")
            .bind(group_id)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| row.try_get::<String, _>("word").map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store() -> SettingsStore {
        SettingsStore::new(db::memory_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_get_settings_materializes_defaults_once() {
        let store = store().await;

        let first = store.get_settings(42).await.unwrap();
        assert_eq!(first, GroupSettings::default());

        let second = store.get_settings(42).await.unwrap();
        assert_eq!(first, second);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups")
            .fetch_one(&store.db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_update_settings_round_trip() {
        let store = store().await;

        let mut settings = store.get_settings(1).await.unwrap();
        settings.flood_limit = 9;
        settings.warn_action = RuleAction::Kick;
        settings.media_settings.voice = RuleAction::Delete;
        store.update_settings(1, &settings).await.unwrap();

        let read = store.get_settings(1).await.unwrap();
        assert_eq!(read, settings);
    }

    #[tokio::test]
    async fn test_upsert_group_keeps_settings() {
        let store = store().await;

        let mut settings = store.get_settings(1).await.unwrap();
        settings.caps_limit = 3;
        store.update_settings(1, &settings).await.unwrap();

        store.upsert_group(1, "General").await.unwrap();

        let read = store.get_settings(1).await.unwrap();
        assert_eq!(read.caps_limit, 3);

        let title: String = sqlx::query_scalar("SELECT title FROM groups WHERE group_id = 1")
            .fetch_one(&store.db)
            .await
            .unwrap();
        assert_eq!(title, "General");
    }

    #[tokio::test]
    async fn test_media_rules_default_off() {
        let store = store().await;

        assert_eq!(
            store.media_action(1, MediaKind::Sticker).await.unwrap(),
            RuleAction::Off
        );

        store
            .set_media_action(1, MediaKind::Sticker, RuleAction::Delete)
            .await
            .unwrap();
        assert_eq!(
            store.media_action(1, MediaKind::Sticker).await.unwrap(),
            RuleAction::Delete
        );
        // Other kinds unaffected
        assert_eq!(
            store.media_action(1, MediaKind::Photo).await.unwrap(),
            RuleAction::Off
        );
    }

    #[tokio::test]
    async fn test_link_rules_lifecycle() {
        let store = store().await;

        assert_eq!(store.link_action(1, "spam.example").await.unwrap(), None);

        store
            .set_link_rule(1, "SPAM.example", RuleAction::Ban)
            .await
            .unwrap();
        assert_eq!(
            store.link_action(1, "spam.example").await.unwrap(),
            Some(RuleAction::Ban)
        );

        let rules = store.link_rules(1).await.unwrap();
        assert_eq!(rules.get("spam.example"), Some(&RuleAction::Ban));

        store.remove_link_rule(1, "spam.example").await.unwrap();
        assert_eq!(store.link_action(1, "spam.example").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_banned_words_normalized() {
        let store = store().await;

        store.add_banned_word(1, "SpAm").await.unwrap();
        store.add_banned_word(1, "spam").await.unwrap();

        let words = store.banned_words(1).await.unwrap();
        assert_eq!(words, vec!["spam".to_string()]);

        store.remove_banned_word(1, "SPAM").await.unwrap();
        assert!(store.banned_words(1).await.unwrap().is_empty());
    }
}
