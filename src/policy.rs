/// Policy engine: per-group settings document and the sanction decision
///
/// `PolicyEngine::evaluate` is a pure function over the group's settings,
/// the flood tracker verdict, and the event's extracted signals. Rules are
/// evaluated in a fixed order and the first match wins, so two rules can
/// never sanction the same event twice.
use crate::error::{WardenError, WardenResult};
use crate::event::{MediaKind, MessageFeatures};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Action configured for a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Rule disabled
    Off,
    /// Explicitly permitted (link rules only)
    Allow,
    Delete,
    Warn,
    Mute,
    Kick,
    Ban,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Off => "off",
            RuleAction::Allow => "allow",
            RuleAction::Delete => "delete",
            RuleAction::Warn => "warn",
            RuleAction::Mute => "mute",
            RuleAction::Kick => "kick",
            RuleAction::Ban => "ban",
        }
    }

    pub fn parse(s: &str) -> WardenResult<Self> {
        match s.to_lowercase().as_str() {
            "off" => Ok(RuleAction::Off),
            "allow" => Ok(RuleAction::Allow),
            "delete" => Ok(RuleAction::Delete),
            "warn" => Ok(RuleAction::Warn),
            "mute" => Ok(RuleAction::Mute),
            "kick" => Ok(RuleAction::Kick),
            "ban" => Ok(RuleAction::Ban),
            _ => Err(WardenError::Validation(format!(
                "Invalid rule action: {}",
                s
            ))),
        }
    }
}

/// The rule that produced a sanction; tags audit log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Flood,
    Media,
    Link,
    Word,
    Caps,
    Emoji,
    Mention,
    Length,
    /// Cumulative warning escalation
    Warn,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Flood => "flood",
            RuleKind::Media => "media",
            RuleKind::Link => "link",
            RuleKind::Word => "word",
            RuleKind::Caps => "caps",
            RuleKind::Emoji => "emoji",
            RuleKind::Mention => "mention",
            RuleKind::Length => "length",
            RuleKind::Warn => "warn",
        }
    }
}

/// What a sanction does to the offender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanctionKind {
    Delete,
    Warn,
    Mute,
    Kick,
    Ban,
}

impl SanctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SanctionKind::Delete => "delete",
            SanctionKind::Warn => "warn",
            SanctionKind::Mute => "mute",
            SanctionKind::Kick => "kick",
            SanctionKind::Ban => "ban",
        }
    }
}

/// A moderation decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanction {
    pub rule: RuleKind,
    pub kind: SanctionKind,
    /// Seconds the sanction lasts; `None` means permanent for bans and
    /// "use the group default" for mutes
    pub duration_secs: Option<u64>,
    pub reason: String,
}

impl Sanction {
    /// Audit log tag, e.g. `flood_mute`
    pub fn log_tag(&self) -> String {
        format!("{}_{}", self.rule.as_str(), self.kind.as_str())
    }
}

/// Per-media-kind actions inside the settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSettings {
    #[serde(default = "off")]
    pub text: RuleAction,
    #[serde(default = "off")]
    pub photo: RuleAction,
    #[serde(default = "off")]
    pub video: RuleAction,
    #[serde(default = "off")]
    pub gif: RuleAction,
    #[serde(default = "off")]
    pub sticker: RuleAction,
    #[serde(default = "off")]
    pub voice: RuleAction,
    #[serde(default = "off")]
    pub audio: RuleAction,
    #[serde(default = "off")]
    pub file: RuleAction,
    #[serde(default = "off")]
    pub emoji: RuleAction,
    #[serde(default = "off")]
    pub premium_emoji: RuleAction,
    #[serde(default = "off")]
    pub album: RuleAction,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            text: RuleAction::Off,
            photo: RuleAction::Off,
            video: RuleAction::Off,
            gif: RuleAction::Off,
            sticker: RuleAction::Off,
            voice: RuleAction::Off,
            audio: RuleAction::Off,
            file: RuleAction::Off,
            emoji: RuleAction::Off,
            premium_emoji: RuleAction::Off,
            album: RuleAction::Off,
        }
    }
}

impl MediaSettings {
    /// Document-level action for a media kind
    pub fn action_for(&self, kind: MediaKind) -> RuleAction {
        match kind {
            MediaKind::Text => self.text,
            MediaKind::Photo => self.photo,
            MediaKind::Video => self.video,
            MediaKind::Gif => self.gif,
            MediaKind::Sticker => self.sticker,
            MediaKind::Voice => self.voice,
            MediaKind::Audio => self.audio,
            MediaKind::File => self.file,
            MediaKind::Emoji => self.emoji,
            MediaKind::PremiumEmoji => self.premium_emoji,
            MediaKind::Album => self.album,
        }
    }
}

fn off() -> RuleAction {
    RuleAction::Off
}

fn delete() -> RuleAction {
    RuleAction::Delete
}

fn mute() -> RuleAction {
    RuleAction::Mute
}

fn flood_limit_default() -> u32 {
    5
}

fn flood_mute_duration_default() -> u64 {
    3600
}

fn caps_limit_default() -> u32 {
    10
}

fn emoji_limit_default() -> u32 {
    15
}

fn mention_limit_default() -> u32 {
    5
}

fn warn_limit_default() -> u32 {
    3
}

fn warn_mute_duration_default() -> u64 {
    86400
}

fn min_message_length_default() -> u32 {
    1
}

fn max_message_length_default() -> u32 {
    4096
}

/// Per-group settings document
///
/// Persisted as an opaque JSON blob. Every field defaults when missing so
/// documents written by older configurations keep deserializing; unknown
/// keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSettings {
    #[serde(default = "flood_limit_default")]
    pub flood_limit: u32,
    #[serde(default = "mute")]
    pub flood_action: RuleAction,
    #[serde(default = "flood_mute_duration_default")]
    pub flood_mute_duration: u64,

    #[serde(default = "caps_limit_default")]
    pub caps_limit: u32,
    #[serde(default = "delete")]
    pub caps_action: RuleAction,

    #[serde(default = "emoji_limit_default")]
    pub emoji_limit: u32,
    #[serde(default = "delete")]
    pub emoji_action: RuleAction,

    #[serde(default = "mention_limit_default")]
    pub mention_limit: u32,
    #[serde(default = "delete")]
    pub mention_action: RuleAction,

    #[serde(default = "warn_limit_default")]
    pub warn_limit: u32,
    #[serde(default = "mute")]
    pub warn_action: RuleAction,
    #[serde(default = "warn_mute_duration_default")]
    pub warn_mute_duration: u64,

    #[serde(default)]
    pub link_block_enabled: bool,
    #[serde(default)]
    pub link_allowed_only: bool,

    #[serde(default)]
    pub media_settings: MediaSettings,

    #[serde(default = "min_message_length_default")]
    pub min_message_length: u32,
    #[serde(default = "max_message_length_default")]
    pub max_message_length: u32,
    #[serde(default = "delete")]
    pub length_action: RuleAction,
}

impl Default for GroupSettings {
    fn default() -> Self {
        // serde defaults and Default must agree; deserializing `{}` is the
        // canonical way to materialize the default document
        serde_json::from_str("{}").expect("default settings document")
    }
}

impl GroupSettings {
    /// Mute duration for a rule configured to mute
    fn mute_duration(&self, rule: RuleKind) -> u64 {
        match rule {
            RuleKind::Warn => self.warn_mute_duration,
            _ => self.flood_mute_duration,
        }
    }

    /// Turn a configured action into a sanction, or nothing when the rule
    /// is off
    pub fn sanction_for(
        &self,
        rule: RuleKind,
        action: RuleAction,
        reason: impl Into<String>,
    ) -> Option<Sanction> {
        let (kind, duration_secs) = match action {
            RuleAction::Off | RuleAction::Allow => return None,
            RuleAction::Delete => (SanctionKind::Delete, None),
            RuleAction::Warn => (SanctionKind::Warn, None),
            RuleAction::Mute => (SanctionKind::Mute, Some(self.mute_duration(rule))),
            RuleAction::Kick => (SanctionKind::Kick, None),
            // Bans configured through rule actions are permanent
            RuleAction::Ban => (SanctionKind::Ban, None),
        };
        Some(Sanction {
            rule,
            kind,
            duration_secs,
            reason: reason.into(),
        })
    }
}

/// Everything the policy engine looks at for one event
#[derive(Debug)]
pub struct PolicyInputs<'a> {
    pub settings: &'a GroupSettings,
    /// Sliding-window verdict from the flood tracker
    pub flood_exceeded: bool,
    pub media: MediaKind,
    /// Stored per-group media rule for this kind (defaults to off)
    pub media_rule: RuleAction,
    /// Explicit per-domain link rules for this group
    pub link_rules: &'a HashMap<String, RuleAction>,
    /// Normalized lowercase banned words for this group
    pub banned_words: &'a [String],
    pub features: &'a MessageFeatures,
}

/// Stateless decision function
pub struct PolicyEngine;

impl PolicyEngine {
    /// Decide the sanction for one event, if any
    ///
    /// Order: flood, media kind, link domains, banned words, caps, emoji,
    /// mentions, length bounds. All count thresholds are inclusive.
    pub fn evaluate(inputs: &PolicyInputs<'_>) -> Option<Sanction> {
        let s = inputs.settings;
        let f = inputs.features;

        if inputs.flood_exceeded {
            if let Some(sanction) =
                s.sanction_for(RuleKind::Flood, s.flood_action, "message flood")
            {
                return Some(sanction);
            }
        }

        if let Some(sanction) = s.sanction_for(
            RuleKind::Media,
            inputs.media_rule,
            format!("restricted media: {}", inputs.media.as_str()),
        ) {
            return Some(sanction);
        }

        if let Some(sanction) = Self::check_links(inputs) {
            return Some(sanction);
        }

        if let Some(sanction) = Self::check_words(inputs) {
            return Some(sanction);
        }

        if f.caps_count >= s.caps_limit {
            if let Some(sanction) = s.sanction_for(
                RuleKind::Caps,
                s.caps_action,
                format!("{} uppercase characters", f.caps_count),
            ) {
                return Some(sanction);
            }
        }

        if f.emoji_count >= s.emoji_limit {
            if let Some(sanction) = s.sanction_for(
                RuleKind::Emoji,
                s.emoji_action,
                format!("{} emoji", f.emoji_count),
            ) {
                return Some(sanction);
            }
        }

        if f.mention_count >= s.mention_limit {
            if let Some(sanction) = s.sanction_for(
                RuleKind::Mention,
                s.mention_action,
                format!("{} mentions", f.mention_count),
            ) {
                return Some(sanction);
            }
        }

        // Length bounds govern textual content; a captionless media message
        // reports length 0 and is the media rules' concern
        let has_text = inputs.media == MediaKind::Text || !f.text.is_empty();
        if has_text && (f.length < s.min_message_length || f.length > s.max_message_length) {
            if let Some(sanction) = s.sanction_for(
                RuleKind::Length,
                s.length_action,
                format!("message length {} out of bounds", f.length),
            ) {
                return Some(sanction);
            }
        }

        None
    }

    /// Per-domain link evaluation; a single matching domain triggers
    fn check_links(inputs: &PolicyInputs<'_>) -> Option<Sanction> {
        let s = inputs.settings;
        for domain in &inputs.features.link_domains {
            match inputs.link_rules.get(domain.as_str()) {
                // An explicit allow suppresses the group-wide link policy
                Some(RuleAction::Allow) | Some(RuleAction::Off) => continue,
                Some(action) => {
                    if let Some(sanction) = s.sanction_for(
                        RuleKind::Link,
                        *action,
                        format!("blocked domain: {}", domain),
                    ) {
                        return Some(sanction);
                    }
                }
                None => {
                    if s.link_allowed_only || s.link_block_enabled {
                        return s.sanction_for(
                            RuleKind::Link,
                            RuleAction::Delete,
                            format!("unlisted domain: {}", domain),
                        );
                    }
                }
            }
        }
        None
    }

    /// Case-insensitive substring match against the group's banned words
    fn check_words(inputs: &PolicyInputs<'_>) -> Option<Sanction> {
        let text = inputs.features.text.to_lowercase();
        if text.is_empty() {
            return None;
        }
        for word in inputs.banned_words {
            if text.contains(word.as_str()) {
                return inputs.settings.sanction_for(
                    RuleKind::Word,
                    RuleAction::Delete,
                    format!("banned word: {}", word),
                );
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(
        settings: &'a GroupSettings,
        features: &'a MessageFeatures,
        link_rules: &'a HashMap<String, RuleAction>,
        banned_words: &'a [String],
    ) -> PolicyInputs<'a> {
        PolicyInputs {
            settings,
            flood_exceeded: false,
            media: MediaKind::Text,
            media_rule: RuleAction::Off,
            link_rules,
            banned_words,
            features,
        }
    }

    fn ok_features() -> MessageFeatures {
        MessageFeatures {
            length: 10,
            text: "hello there".to_string(),
            ..MessageFeatures::default()
        }
    }

    #[test]
    fn test_default_document_values() {
        let s = GroupSettings::default();
        assert_eq!(s.flood_limit, 5);
        assert_eq!(s.flood_action, RuleAction::Mute);
        assert_eq!(s.flood_mute_duration, 3600);
        assert_eq!(s.caps_limit, 10);
        assert_eq!(s.caps_action, RuleAction::Delete);
        assert_eq!(s.emoji_limit, 15);
        assert_eq!(s.mention_limit, 5);
        assert_eq!(s.warn_limit, 3);
        assert_eq!(s.warn_action, RuleAction::Mute);
        assert_eq!(s.warn_mute_duration, 86400);
        assert!(!s.link_block_enabled);
        assert!(!s.link_allowed_only);
        assert_eq!(s.media_settings.sticker, RuleAction::Off);
        assert_eq!(s.min_message_length, 1);
        assert_eq!(s.max_message_length, 4096);
        assert_eq!(s.length_action, RuleAction::Delete);
    }

    #[test]
    fn test_old_documents_deserialize_with_defaults() {
        // A document written before most options existed
        let s: GroupSettings =
            serde_json::from_str(r#"{"flood_limit": 8, "some_future_key": true}"#).unwrap();
        assert_eq!(s.flood_limit, 8);
        assert_eq!(s.warn_limit, 3);
        assert_eq!(s.media_settings, MediaSettings::default());
    }

    #[test]
    fn test_clean_message_passes() {
        let s = GroupSettings::default();
        let f = ok_features();
        let links = HashMap::new();
        assert_eq!(PolicyEngine::evaluate(&inputs(&s, &f, &links, &[])), None);
    }

    #[test]
    fn test_flood_takes_precedence() {
        let s = GroupSettings::default();
        let f = MessageFeatures {
            caps_count: 100,
            length: 10,
            ..MessageFeatures::default()
        };
        let links = HashMap::new();
        let mut i = inputs(&s, &f, &links, &[]);
        i.flood_exceeded = true;

        let sanction = PolicyEngine::evaluate(&i).unwrap();
        assert_eq!(sanction.rule, RuleKind::Flood);
        assert_eq!(sanction.kind, SanctionKind::Mute);
        assert_eq!(sanction.duration_secs, Some(3600));
        assert_eq!(sanction.log_tag(), "flood_mute");
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let s = GroupSettings::default();
        let links = HashMap::new();

        let at_limit = MessageFeatures {
            caps_count: 10,
            length: 10,
            ..MessageFeatures::default()
        };
        let sanction = PolicyEngine::evaluate(&inputs(&s, &at_limit, &links, &[])).unwrap();
        assert_eq!(sanction.rule, RuleKind::Caps);
        assert_eq!(sanction.kind, SanctionKind::Delete);

        let below = MessageFeatures {
            caps_count: 9,
            length: 10,
            ..MessageFeatures::default()
        };
        assert_eq!(PolicyEngine::evaluate(&inputs(&s, &below, &links, &[])), None);
    }

    #[test]
    fn test_media_rule_fires() {
        let s = GroupSettings::default();
        let f = ok_features();
        let links = HashMap::new();
        let mut i = inputs(&s, &f, &links, &[]);
        i.media = MediaKind::Sticker;
        i.media_rule = RuleAction::Delete;

        let sanction = PolicyEngine::evaluate(&i).unwrap();
        assert_eq!(sanction.rule, RuleKind::Media);
        assert_eq!(sanction.reason, "restricted media: sticker");
    }

    #[test]
    fn test_link_explicit_rule_wins() {
        let mut s = GroupSettings::default();
        s.link_block_enabled = true;
        let f = MessageFeatures {
            length: 10,
            link_domains: vec!["good.example".to_string(), "bad.example".to_string()],
            ..MessageFeatures::default()
        };
        let mut links = HashMap::new();
        links.insert("good.example".to_string(), RuleAction::Allow);
        links.insert("bad.example".to_string(), RuleAction::Warn);

        let sanction = PolicyEngine::evaluate(&inputs(&s, &f, &links, &[])).unwrap();
        assert_eq!(sanction.rule, RuleKind::Link);
        assert_eq!(sanction.kind, SanctionKind::Warn);
    }

    #[test]
    fn test_link_allowed_only_deletes_unlisted() {
        let mut s = GroupSettings::default();
        s.link_allowed_only = true;
        let f = MessageFeatures {
            length: 10,
            link_domains: vec!["unknown.example".to_string()],
            ..MessageFeatures::default()
        };
        let links = HashMap::new();

        let sanction = PolicyEngine::evaluate(&inputs(&s, &f, &links, &[])).unwrap();
        assert_eq!(sanction.kind, SanctionKind::Delete);
        assert_eq!(sanction.rule, RuleKind::Link);
    }

    #[test]
    fn test_allowed_domain_passes_when_blocking_enabled() {
        let mut s = GroupSettings::default();
        s.link_block_enabled = true;
        let f = MessageFeatures {
            length: 10,
            link_domains: vec!["good.example".to_string()],
            ..MessageFeatures::default()
        };
        let mut links = HashMap::new();
        links.insert("good.example".to_string(), RuleAction::Allow);

        assert_eq!(PolicyEngine::evaluate(&inputs(&s, &f, &links, &[])), None);
    }

    #[test]
    fn test_banned_word_substring_match() {
        let s = GroupSettings::default();
        let f = MessageFeatures {
            length: 20,
            text: "Buy CHEAP widgets now".to_string(),
            ..MessageFeatures::default()
        };
        let links = HashMap::new();
        let words = vec!["cheap".to_string()];

        let sanction = PolicyEngine::evaluate(&inputs(&s, &f, &links, &words)).unwrap();
        assert_eq!(sanction.rule, RuleKind::Word);
        assert_eq!(sanction.kind, SanctionKind::Delete);
    }

    #[test]
    fn test_length_bounds() {
        let s = GroupSettings::default();
        let links = HashMap::new();

        let empty = MessageFeatures::default();
        let sanction = PolicyEngine::evaluate(&inputs(&s, &empty, &links, &[])).unwrap();
        assert_eq!(sanction.rule, RuleKind::Length);

        let long = MessageFeatures {
            length: 4097,
            ..MessageFeatures::default()
        };
        let sanction = PolicyEngine::evaluate(&inputs(&s, &long, &links, &[])).unwrap();
        assert_eq!(sanction.rule, RuleKind::Length);

        let max = MessageFeatures {
            length: 4096,
            ..MessageFeatures::default()
        };
        assert_eq!(PolicyEngine::evaluate(&inputs(&s, &max, &links, &[])), None);
    }

    #[test]
    fn test_captionless_media_skips_length_bounds() {
        let s = GroupSettings::default();
        let links = HashMap::new();

        // A sticker with no caption reports length 0; media rules (off by
        // default) govern it, not the minimum message length
        let empty = MessageFeatures::default();
        let mut sticker = inputs(&s, &empty, &links, &[]);
        sticker.media = MediaKind::Sticker;
        assert_eq!(PolicyEngine::evaluate(&sticker), None);

        // With a caption, the bounds apply again
        let long_caption = MessageFeatures {
            length: 4097,
            text: "x".repeat(4097),
            ..MessageFeatures::default()
        };
        let mut captioned = inputs(&s, &long_caption, &links, &[]);
        captioned.media = MediaKind::Photo;
        let sanction = PolicyEngine::evaluate(&captioned).unwrap();
        assert_eq!(sanction.rule, RuleKind::Length);
    }

    #[test]
    fn test_first_match_short_circuits() {
        // Caps and mentions both over limit: caps is checked first
        let s = GroupSettings::default();
        let f = MessageFeatures {
            caps_count: 50,
            mention_count: 50,
            length: 10,
            ..MessageFeatures::default()
        };
        let links = HashMap::new();

        let sanction = PolicyEngine::evaluate(&inputs(&s, &f, &links, &[])).unwrap();
        assert_eq!(sanction.rule, RuleKind::Caps);
    }

    #[test]
    fn test_round_trip_document() {
        let mut s = GroupSettings::default();
        s.flood_limit = 7;
        s.media_settings.gif = RuleAction::Warn;
        s.link_allowed_only = true;

        let json = serde_json::to_string(&s).unwrap();
        let back: GroupSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
