/// Background task implementations
use crate::{context::AppContext, error::WardenResult};

/// Remove expired mutes and expired non-permanent bans
pub async fn purge_expired_sanctions(ctx: &AppContext) -> WardenResult<u64> {
    ctx.sanctions.purge_expired().await
}

/// Verify the database is reachable
pub async fn health_check(ctx: &AppContext) -> WardenResult<()> {
    crate::db::test_connection(&ctx.db).await
}
