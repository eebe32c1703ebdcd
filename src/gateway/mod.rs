/// Chat gateway abstraction
///
/// The transport that delivers events also exposes the moderation
/// primitives. The engine only ever talks to this trait; the concrete
/// implementation (and its timeouts) lives outside the crate.
use crate::error::WardenResult;
use async_trait::async_trait;

pub mod mock;

pub use mock::MockGateway;

/// Membership role of a user within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// Group creator
    Owner,
    Administrator,
    Member,
    /// Present but restricted by the transport
    Restricted,
    /// No longer a member
    Left,
}

impl MemberRole {
    /// Administrators and the owner carry elevated privileges
    pub fn is_admin(self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Administrator)
    }

    pub fn is_owner(self) -> bool {
        matches!(self, MemberRole::Owner)
    }
}

/// Moderation primitives exposed by the chat transport
///
/// Every call may fail with a rejected request; callers in the gate and
/// executor treat those failures as non-fatal.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Delete a message from a chat
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> WardenResult<()>;

    /// Restrict or unrestrict a member's ability to send messages until
    /// the given epoch-seconds timestamp
    async fn restrict_member(
        &self,
        chat_id: i64,
        user_id: i64,
        can_send_messages: bool,
        until_epoch_secs: i64,
    ) -> WardenResult<()>;

    /// Ban a member from a chat
    async fn ban_member(&self, chat_id: i64, user_id: i64) -> WardenResult<()>;

    /// Lift a ban; combined with `ban_member` this is the kick idiom
    async fn unban_member(&self, chat_id: i64, user_id: i64) -> WardenResult<()>;

    /// Resolve a user's role in a chat; fails when the member is not
    /// resolvable or the request is rejected
    async fn member_role(&self, chat_id: i64, user_id: i64) -> WardenResult<MemberRole>;
}
