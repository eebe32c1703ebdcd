/// GroupWarden - moderation engine for multi-group chat traffic
///
/// Detects message floods with a per-(group, user) sliding window, enforces
/// durable sanctions (mute/ban) on every inbound event, and escalates
/// repeated violations through warnings. The chat transport is abstracted
/// behind the [`gateway::ChatGateway`] trait; the embedding process feeds
/// events into [`pipeline::ModerationPipeline::process`].

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod event;
pub mod flood;
pub mod gateway;
pub mod jobs;
pub mod pipeline;
pub mod policy;
pub mod store;

pub use config::WardenConfig;
pub use context::AppContext;
pub use error::{WardenError, WardenResult};
pub use event::{ChatEvent, ChatScope, MediaKind, MessageFeatures};
pub use flood::{FloodTracker, FloodVerdict};
pub use pipeline::{ModerationPipeline, PipelineOutcome};
pub use policy::{GroupSettings, PolicyEngine, RuleAction, Sanction, SanctionKind};
