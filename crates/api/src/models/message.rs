//! Chat messages and conversation snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillx_core::{ConversationId, MessageId, UserId};

/// One chat message (`messages/{conversation_id}/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "senderID")]
    pub sender_id: UserId,
    #[serde(rename = "receiverID")]
    pub receiver_id: UserId,
    #[serde(rename = "messageContent")]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "isRead")]
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Summary of the newest message, embedded in a [`Conversation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastMessage {
    #[serde(rename = "senderID")]
    pub sender_id: UserId,
    #[serde(rename = "messageContent")]
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for LastMessage {
    fn from(message: &Message) -> Self {
        Self {
            sender_id: message.sender_id.clone(),
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }
}

/// Conversation snapshot (`conversations/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: Vec<UserId>,
    #[serde(rename = "lastMessage")]
    pub last_message: LastMessage,
    #[serde(rename = "lastMessageId", skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<MessageId>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    #[must_use]
    pub fn has_participant(&self, uid: &UserId) -> bool {
        self.participants.contains(uid)
    }
}
