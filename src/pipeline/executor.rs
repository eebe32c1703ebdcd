/// Action executor: turns a sanction into gateway calls and durable state
///
/// Every side effect is best-effort and independently swallowed: a rejected
/// gateway call never blocks the durable record, a failed store write never
/// blocks the live restriction, and a failed log append never blocks
/// either. One bad action must not stall the pipeline.
use crate::error::WardenResult;
use crate::event::ChatEvent;
use crate::gateway::ChatGateway;
use crate::policy::{GroupSettings, RuleKind, Sanction, SanctionKind};
use crate::store::SanctionStore;
use std::sync::Arc;
use tracing::warn;

/// Admin id recorded for sanctions issued by the engine itself
pub const ENGINE_ADMIN_ID: i64 = 0;

/// Applies policy decisions
pub struct ActionExecutor {
    sanctions: SanctionStore,
    gateway: Arc<dyn ChatGateway>,
}

impl ActionExecutor {
    pub fn new(sanctions: SanctionStore, gateway: Arc<dyn ChatGateway>) -> Self {
        Self { sanctions, gateway }
    }

    /// Apply a sanction to the offending event
    ///
    /// A warn that reaches the group's `warn_limit` cascades into the
    /// configured `warn_action` as a second sanction with its own log
    /// entry, after which the warning count is reset.
    pub async fn apply(
        &self,
        event: &ChatEvent,
        sanction: &Sanction,
        settings: &GroupSettings,
    ) {
        match sanction.kind {
            SanctionKind::Warn => self.apply_warning(event, sanction, settings).await,
            _ => self.execute(event, sanction, settings).await,
        }
    }

    /// Direct (non-cascading) sanction application
    async fn execute(&self, event: &ChatEvent, sanction: &Sanction, settings: &GroupSettings) {
        let group_id = event.group_id;
        let user_id = event.user_id;

        // The offending message is removed for every sanction kind
        self.swallow(
            "delete message",
            self.gateway.delete_message(group_id, event.message_id).await,
        );

        match sanction.kind {
            SanctionKind::Delete => {}
            SanctionKind::Mute => {
                let duration = sanction
                    .duration_secs
                    .unwrap_or(settings.flood_mute_duration);
                let until = crate::store::epoch_now() + duration as i64;
                self.swallow(
                    "restrict member",
                    self.gateway
                        .restrict_member(group_id, user_id, false, until)
                        .await,
                );
                self.swallow(
                    "persist mute",
                    self.sanctions.mute(user_id, group_id, duration).await,
                );
            }
            SanctionKind::Kick => {
                // Ban-then-unban removes the user without a durable record
                self.swallow("kick (ban)", self.gateway.ban_member(group_id, user_id).await);
                self.swallow(
                    "kick (unban)",
                    self.gateway.unban_member(group_id, user_id).await,
                );
            }
            SanctionKind::Ban => {
                self.swallow("ban member", self.gateway.ban_member(group_id, user_id).await);
                self.swallow(
                    "persist ban",
                    self.sanctions
                        .ban(user_id, group_id, sanction.duration_secs)
                        .await,
                );
            }
            SanctionKind::Warn => unreachable!("warns go through apply_warning"),
        }

        self.swallow(
            "append log",
            self.sanctions
                .log(
                    group_id,
                    &sanction.log_tag(),
                    Some(user_id),
                    Some(ENGINE_ADMIN_ID),
                    Some(&sanction.reason),
                )
                .await,
        );
    }

    /// Persist a warning, then escalate once the cumulative count reaches
    /// the group's limit
    async fn apply_warning(&self, event: &ChatEvent, sanction: &Sanction, settings: &GroupSettings) {
        let group_id = event.group_id;
        let user_id = event.user_id;

        self.swallow(
            "persist warning",
            self.sanctions
                .add_warning(user_id, group_id, &sanction.reason, ENGINE_ADMIN_ID)
                .await
                .map(|_| ()),
        );
        self.swallow(
            "append log",
            self.sanctions
                .log(
                    group_id,
                    "warned",
                    Some(user_id),
                    Some(ENGINE_ADMIN_ID),
                    Some(&sanction.reason),
                )
                .await,
        );

        let count = match self.sanctions.warning_count(user_id, group_id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(group_id, user_id, "Failed to read warning count: {}", e);
                return;
            }
        };
        if count < settings.warn_limit {
            return;
        }

        // Limit reached: fire the configured escalation and start a fresh
        // count for the next cycle
        let escalation = settings.sanction_for(
            RuleKind::Warn,
            settings.warn_action,
            format!("warning limit reached ({})", count),
        );
        match escalation {
            // A warn-on-warn escalation would loop; treat it as log-only
            Some(escalated) if escalated.kind != SanctionKind::Warn => {
                self.execute(event, &escalated, settings).await;
            }
            _ => {}
        }
        self.swallow(
            "reset warnings",
            self.sanctions.reset_warnings(user_id, group_id).await,
        );
    }

    /// Log-and-discard for best-effort side effects
    fn swallow(&self, op: &str, result: WardenResult<()>) {
        if let Err(e) = result {
            warn!("Sanction side effect failed ({}): {}", op, e);
        }
    }
}
