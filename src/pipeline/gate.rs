/// Access gate: sanction short-circuit and role resolution
///
/// Runs before any other stage. Banned and muted users have their message
/// discarded (best-effort delete) and the pipeline stops. Role resolution
/// failures default to no privileges: fail-closed for authorization, while
/// the message itself still flows.
use crate::error::WardenResult;
use crate::event::ChatEvent;
use crate::gateway::ChatGateway;
use crate::store::SanctionStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Role annotations carried for the rest of one event's processing;
/// never persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventContext {
    pub is_admin: bool,
    pub is_owner: bool,
}

/// Gate decision for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Event proceeds with its role annotations
    Proceed(EventContext),
    /// Event discarded: sender is banned or muted here
    Halt,
}

/// Sanction-state gate
pub struct AccessGate {
    sanctions: SanctionStore,
    gateway: Arc<dyn ChatGateway>,
}

impl AccessGate {
    pub fn new(sanctions: SanctionStore, gateway: Arc<dyn ChatGateway>) -> Self {
        Self { sanctions, gateway }
    }

    /// Check one event against durable sanction state
    ///
    /// Store read failures propagate: the gate must not fail open on a
    /// ban check it could not perform.
    pub async fn check(&self, event: &ChatEvent) -> WardenResult<GateDecision> {
        if !event.scope.is_group() {
            return Ok(GateDecision::Proceed(EventContext::default()));
        }

        if self.sanctions.is_banned(event.user_id, event.group_id).await? {
            self.discard(event, "banned").await;
            return Ok(GateDecision::Halt);
        }

        if self.sanctions.is_muted(event.user_id, event.group_id).await? {
            self.discard(event, "muted").await;
            return Ok(GateDecision::Halt);
        }

        let ctx = match self
            .gateway
            .member_role(event.group_id, event.user_id)
            .await
        {
            Ok(role) => EventContext {
                is_admin: role.is_admin(),
                is_owner: role.is_owner(),
            },
            Err(e) => {
                // Unresolvable member: no elevated privileges
                debug!(
                    group_id = event.group_id,
                    user_id = event.user_id,
                    "Role resolution failed, defaulting to member: {}",
                    e
                );
                EventContext::default()
            }
        };

        Ok(GateDecision::Proceed(ctx))
    }

    /// Best-effort delete of a sanctioned user's message
    async fn discard(&self, event: &ChatEvent, cause: &str) {
        if let Err(e) = self
            .gateway
            .delete_message(event.group_id, event.message_id)
            .await
        {
            warn!(
                group_id = event.group_id,
                message_id = event.message_id,
                "Failed to delete message from {} user: {}",
                cause,
                e
            );
        }
    }
}
