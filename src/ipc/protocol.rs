//! Typed JSON wire protocol between the platform bridge and rosterkeep.
//!
//! Both directions are newline-delimited JSON. Inbound events carry an `"event"` tag,
//! outbound notices a `"notice"` tag.

use serde::{Deserialize, Serialize};

use crate::roster::{Member, MemberId};

// ============================================================================
// Inbound events (bridge → rosterkeep)
// ============================================================================

/// Events the bridge forwards from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BotEvent {
    /// Connected (or reconnected) with a full member snapshot.
    Ready {
        #[serde(default)]
        guild_name: Option<String>,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        channels: Vec<ChannelInfo>,
    },

    /// A member's roles changed.
    MemberRoleChanged { before: Member, after: Member },

    /// A chat message was posted in a channel the bot can read.
    MessageReceived(InboundMessage),

    /// A member joined the community.
    MemberJoined { member: Member },
}

impl BotEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::MemberRoleChanged { .. } => "member_role_changed",
            Self::MessageReceived(_) => "message_received",
            Self::MemberJoined { .. } => "member_joined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InboundMessage {
    pub message_id: String,
    pub channel_id: String,
    pub author: Member,
    pub text: String,
}

// ============================================================================
// Outbound notices (rosterkeep → bridge)
// ============================================================================

/// Side effects the bridge should perform on the platform. Best effort only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// Post `text` in a channel.
    Send { channel_id: String, text: String },

    /// Send `text` privately to one member.
    DirectMessage { member_id: MemberId, text: String },

    /// Remove a message, e.g. one that exposed an address in a public channel.
    DeleteMessage {
        channel_id: String,
        message_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_event_parses_with_defaults() {
        let event: BotEvent = serde_json::from_str(r#"{"event":"ready"}"#).expect("parse");
        assert_eq!(
            event,
            BotEvent::Ready {
                guild_name: None,
                members: Vec::new(),
                channels: Vec::new(),
            }
        );
    }

    #[test]
    fn role_change_event_parses_members() {
        let raw = r#"{"event":"member_role_changed",
            "before":{"id":"1","name":"a","roles":["artist"]},
            "after":{"id":1,"name":"a","roles":["artist","whitelisted"]}}"#;
        let event: BotEvent = serde_json::from_str(raw).expect("parse");
        let BotEvent::MemberRoleChanged { before, after } = event else {
            panic!("wrong variant");
        };
        assert_eq!(before.id, after.id);
        assert!(after.roles.contains("whitelisted"));
    }

    #[test]
    fn message_event_flattens_payload() {
        let raw = r#"{"event":"message_received","message_id":"m1","channel_id":"c1",
            "author":{"id":"7","name":"g"},"text":"hi"}"#;
        let event: BotEvent = serde_json::from_str(raw).expect("parse");
        assert_eq!(event.kind(), "message_received");
        let BotEvent::MessageReceived(message) = event else {
            panic!("wrong variant");
        };
        assert_eq!(message.author.id, MemberId::new(7));
        assert_eq!(message.text, "hi");
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(serde_json::from_str::<BotEvent>(r#"{"event":"typing"}"#).is_err());
    }

    #[test]
    fn notices_serialize_with_tag() {
        let json = serde_json::to_string(&Notice::DirectMessage {
            member_id: MemberId::new(5),
            text: "hello".to_string(),
        })
        .expect("serialize");
        assert_eq!(
            json,
            r#"{"notice":"direct_message","member_id":"5","text":"hello"}"#
        );
        let json = serde_json::to_string(&Notice::DeleteMessage {
            channel_id: "c".to_string(),
            message_id: "m".to_string(),
        })
        .expect("serialize");
        assert_eq!(
            json,
            r#"{"notice":"delete_message","channel_id":"c","message_id":"m"}"#
        );
    }
}
