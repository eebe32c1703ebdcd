/// Inbound chat event model
///
/// Events arrive from the transport with their numeric and set-membership
/// signals already extracted; the engine never inspects raw message payloads.
use serde::{Deserialize, Serialize};

/// Scope a message was sent in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatScope {
    /// One-on-one conversation; flood tracking and group rules do not apply
    Direct,
    Group,
    Supergroup,
}

impl ChatScope {
    /// Whether group-scoped moderation (flood, rules, sanctions) applies
    pub fn is_group(self) -> bool {
        matches!(self, ChatScope::Group | ChatScope::Supergroup)
    }
}

/// Media kind carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Text,
    Photo,
    Video,
    Gif,
    Sticker,
    Voice,
    Audio,
    File,
    Emoji,
    PremiumEmoji,
    Album,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Text => "text",
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Gif => "gif",
            MediaKind::Sticker => "sticker",
            MediaKind::Voice => "voice",
            MediaKind::Audio => "audio",
            MediaKind::File => "file",
            MediaKind::Emoji => "emoji",
            MediaKind::PremiumEmoji => "premium_emoji",
            MediaKind::Album => "album",
        }
    }

    /// All recognized kinds, in settings-document order
    pub fn all() -> &'static [MediaKind] {
        &[
            MediaKind::Text,
            MediaKind::Photo,
            MediaKind::Video,
            MediaKind::Gif,
            MediaKind::Sticker,
            MediaKind::Voice,
            MediaKind::Audio,
            MediaKind::File,
            MediaKind::Emoji,
            MediaKind::PremiumEmoji,
            MediaKind::Album,
        ]
    }
}

/// Per-message signals extracted by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageFeatures {
    /// Number of uppercase characters
    pub caps_count: u32,
    /// Number of emoji
    pub emoji_count: u32,
    /// Number of @-mentions
    pub mention_count: u32,
    /// Message length in characters
    pub length: u32,
    /// Domains of links found in the message
    pub link_domains: Vec<String>,
    /// Lowercased message text, used for banned-word matching
    pub text: String,
}

/// Latest profile snapshot of the sender
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// An inbound chat event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub group_id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub scope: ChatScope,
    pub media: MediaKind,
    pub features: MessageFeatures,
    /// Group title as reported by the transport, if any
    pub group_title: Option<String>,
    pub sender: UserProfile,
}

impl ChatEvent {
    /// Minimal text event, used heavily in tests
    pub fn text(group_id: i64, user_id: i64, message_id: i64) -> Self {
        Self {
            group_id,
            user_id,
            message_id,
            scope: ChatScope::Supergroup,
            media: MediaKind::Text,
            features: MessageFeatures {
                length: 1,
                ..MessageFeatures::default()
            },
            group_title: None,
            sender: UserProfile::default(),
        }
    }
}
