/// Durable state: per-group settings and sanction records
///
/// Both stores are thin managers over the shared SQLite pool; the pool is
/// the single source of truth and serializes conflicting writes.
pub mod sanctions;
pub mod settings;

pub use sanctions::{LogEntry, SanctionStore, WarningRecord};
pub use settings::SettingsStore;

/// Current unix time in seconds
pub(crate) fn epoch_now() -> i64 {
    chrono::Utc::now().timestamp()
}
