/// Mock chat gateway for tests
///
/// Records every call and can be told to reject specific primitives, so
/// tests can assert both the calls a sanction produces and that failures
/// are swallowed.
use super::{ChatGateway, MemberRole};
use crate::error::{WardenError, WardenResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A recorded gateway invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    DeleteMessage {
        chat_id: i64,
        message_id: i64,
    },
    RestrictMember {
        chat_id: i64,
        user_id: i64,
        can_send_messages: bool,
        until_epoch_secs: i64,
    },
    BanMember {
        chat_id: i64,
        user_id: i64,
    },
    UnbanMember {
        chat_id: i64,
        user_id: i64,
    },
}

/// Recording mock gateway
#[derive(Default)]
pub struct MockGateway {
    calls: Mutex<Vec<GatewayCall>>,
    roles: Mutex<HashMap<(i64, i64), MemberRole>>,
    fail_deletes: AtomicBool,
    fail_restricts: AtomicBool,
    fail_bans: AtomicBool,
    fail_unbans: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the role returned for a (chat, user) pair; unknown pairs fail
    /// like the real transport does for unresolvable members
    pub fn set_role(&self, chat_id: i64, user_id: i64, role: MemberRole) {
        self.roles.lock().unwrap().insert((chat_id, user_id), role);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_restricts(&self, fail: bool) {
        self.fail_restricts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_bans(&self, fail: bool) {
        self.fail_bans.store(fail, Ordering::SeqCst);
    }

    pub fn fail_unbans(&self, fail: bool) {
        self.fail_unbans.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all recorded calls
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> WardenResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(WardenError::Gateway("delete rejected".to_string()));
        }
        self.record(GatewayCall::DeleteMessage {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: i64,
        user_id: i64,
        can_send_messages: bool,
        until_epoch_secs: i64,
    ) -> WardenResult<()> {
        if self.fail_restricts.load(Ordering::SeqCst) {
            return Err(WardenError::Gateway("restrict rejected".to_string()));
        }
        self.record(GatewayCall::RestrictMember {
            chat_id,
            user_id,
            can_send_messages,
            until_epoch_secs,
        });
        Ok(())
    }

    async fn ban_member(&self, chat_id: i64, user_id: i64) -> WardenResult<()> {
        if self.fail_bans.load(Ordering::SeqCst) {
            return Err(WardenError::Gateway("ban rejected".to_string()));
        }
        self.record(GatewayCall::BanMember { chat_id, user_id });
        Ok(())
    }

    async fn unban_member(&self, chat_id: i64, user_id: i64) -> WardenResult<()> {
        if self.fail_unbans.load(Ordering::SeqCst) {
            return Err(WardenError::Gateway("unban rejected".to_string()));
        }
        self.record(GatewayCall::UnbanMember { chat_id, user_id });
        Ok(())
    }

    async fn member_role(&self, chat_id: i64, user_id: i64) -> WardenResult<MemberRole> {
        self.roles
            .lock()
            .unwrap()
            .get(&(chat_id, user_id))
            .copied()
            .ok_or_else(|| WardenError::Gateway("member not resolvable".to_string()))
    }
}
