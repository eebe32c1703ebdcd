/// The moderation pipeline
///
/// Explicit ordered stages invoked directly per event: access gate, flood
/// tracker, policy engine, action executor. Ordering and short-circuiting
/// live here, not in any framework dispatch.
use crate::error::WardenResult;
use crate::event::ChatEvent;
use crate::flood::FloodTracker;
use crate::gateway::ChatGateway;
use crate::policy::{PolicyEngine, PolicyInputs, RuleAction, Sanction};
use crate::store::{SanctionStore, SettingsStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod executor;
pub mod gate;

pub use executor::{ActionExecutor, ENGINE_ADMIN_ID};
pub use gate::{AccessGate, EventContext, GateDecision};

/// What happened to one event
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Event passed every stage and counts as delivered; downstream
    /// handlers may run with the annotated roles
    Delivered(EventContext),
    /// Event discarded by the access gate (sender banned or muted)
    Discarded,
    /// A policy rule fired and its sanction was applied
    Sanctioned(Sanction),
}

/// Gate → flood → policy → executor, wired over shared stores
pub struct ModerationPipeline {
    settings: SettingsStore,
    sanctions: SanctionStore,
    flood: Arc<FloodTracker>,
    gate: AccessGate,
    executor: ActionExecutor,
    flood_window: Duration,
}

impl ModerationPipeline {
    pub fn new(
        settings: SettingsStore,
        sanctions: SanctionStore,
        flood: Arc<FloodTracker>,
        gateway: Arc<dyn ChatGateway>,
        flood_window: Duration,
    ) -> Self {
        let gate = AccessGate::new(sanctions.clone(), Arc::clone(&gateway));
        let executor = ActionExecutor::new(sanctions.clone(), gateway);
        Self {
            settings,
            sanctions,
            flood,
            gate,
            executor,
            flood_window,
        }
    }

    /// Run one event through every stage
    ///
    /// Store failures abort this event's moderation (the error is returned
    /// to the ingestion loop) but leave the pipeline usable for the next
    /// event.
    pub async fn process(&self, event: &ChatEvent) -> WardenResult<PipelineOutcome> {
        // Direct conversations carry no group state: nothing to moderate
        if !event.scope.is_group() {
            return Ok(PipelineOutcome::Delivered(EventContext::default()));
        }

        // Keep the latest profile and group snapshots current
        self.sanctions
            .upsert_user(
                event.user_id,
                event.sender.username.as_deref(),
                event.sender.first_name.as_deref(),
                event.sender.last_name.as_deref(),
            )
            .await?;
        if let Some(title) = &event.group_title {
            self.settings.upsert_group(event.group_id, title).await?;
        }

        let ctx = match self.gate.check(event).await? {
            GateDecision::Proceed(ctx) => ctx,
            GateDecision::Halt => return Ok(PipelineOutcome::Discarded),
        };

        let settings = self.settings.get_settings(event.group_id).await?;

        let verdict = self.flood.record_and_check(
            event.group_id,
            event.user_id,
            self.flood_window,
            settings.flood_limit as usize,
            Instant::now(),
        );

        // Stored per-kind rule wins; the settings document is the fallback
        let mut media_rule = self
            .settings
            .media_action(event.group_id, event.media)
            .await?;
        if media_rule == RuleAction::Off {
            media_rule = settings.media_settings.action_for(event.media);
        }

        let link_rules = self.settings.link_rules(event.group_id).await?;
        let banned_words = self.settings.banned_words(event.group_id).await?;

        let inputs = PolicyInputs {
            settings: &settings,
            flood_exceeded: verdict.exceeded(),
            media: event.media,
            media_rule,
            link_rules: &link_rules,
            banned_words: &banned_words,
            features: &event.features,
        };

        if let Some(sanction) = PolicyEngine::evaluate(&inputs) {
            self.executor.apply(event, &sanction, &settings).await;
            return Ok(PipelineOutcome::Sanctioned(sanction));
        }

        // Only delivered messages count toward the daily stat
        self.sanctions.record_message(event.group_id).await?;
        Ok(PipelineOutcome::Delivered(ctx))
    }
}
