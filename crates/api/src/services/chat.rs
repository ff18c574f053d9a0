//! Two-party chat.
//!
//! Messages live under `messages/{conversation}/{message}` and every send
//! rewrites the `conversations/{conversation}` snapshot so conversation lists
//! can show the newest message without reading the message subtree. The two
//! writes are not atomic.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use skillx_core::{
    Collection, ConversationId, ConversationIdError, MessageId, RecordPath, UserId,
    apply_nonblank, apply_present,
};

use crate::models::{Conversation, LastMessage, Message};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    InvalidPair(#[from] ConversationIdError),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Receiver not found")]
    ReceiverNotFound,

    #[error("Conversation not found")]
    ConversationNotFound,

    #[error("Message not found")]
    MessageNotFound,

    #[error("Only participants can access this conversation")]
    NotParticipant,

    #[error("Only the sender can change or delete this message")]
    NotSender,

    #[error("Only the receiver can mark this message as read")]
    NotReceiver,

    #[error("Chatroom already exists")]
    AlreadyExists(ConversationId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body of a send-message request. The sender is always the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutgoingMessage {
    #[serde(rename = "receiverID")]
    pub receiver_id: UserId,
    #[serde(rename = "messageContent")]
    pub content: String,
    pub title: Option<String>,
}

/// Partial message update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessagePatch {
    #[serde(rename = "messageContent")]
    pub content: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "isRead")]
    pub is_read: Option<bool>,
}

pub struct ChatService<'a> {
    store: &'a Store,
}

impl<'a> ChatService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Conversations `uid` takes part in, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Store` on store failure.
    pub async fn conversations_for(&self, uid: &UserId) -> Result<Vec<Conversation>, ChatError> {
        let rows: Vec<(String, Conversation)> = self
            .store
            .list(&RecordPath::collection(Collection::Conversations))
            .await?;

        let mut conversations: Vec<Conversation> = rows
            .into_iter()
            .filter(|(_, conversation)| conversation.has_participant(uid))
            .map(|(key, mut conversation)| {
                conversation.id = ConversationId::new(key);
                conversation
            })
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    /// Open an empty conversation between `me` and `other`.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` carrying the id when the pair already has one,
    /// `ReceiverNotFound` when `other` is not a user.
    #[instrument(skip(self), fields(me = %me, other = %other))]
    pub async fn create_chatroom(
        &self,
        me: &UserId,
        other: &UserId,
    ) -> Result<ConversationId, ChatError> {
        if other.is_blank() {
            return Err(ChatError::MissingField("participantID"));
        }
        let id = ConversationId::derive(me, other)?;
        let path = conversation_path(&id)?;
        if self.store.exists(&path).await? {
            return Err(ChatError::AlreadyExists(id));
        }
        self.ensure_user(other).await?;

        let conversation = Conversation {
            id: id.clone(),
            participants: vec![me.clone(), other.clone()],
            updated_at: Utc::now(),
            ..Conversation::default()
        };
        self.store.set(&path, &conversation).await?;
        debug!(conversation = %id, "Created chatroom");
        Ok(id)
    }

    /// Store a message from `sender` and refresh the conversation snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` for blank fields, an unknown receiver, or store failure.
    #[instrument(skip(self, outgoing), fields(sender = %sender))]
    pub async fn send_message(
        &self,
        sender: &UserId,
        outgoing: OutgoingMessage,
    ) -> Result<(ConversationId, Message), ChatError> {
        if outgoing.receiver_id.is_blank() {
            return Err(ChatError::MissingField("receiverID"));
        }
        if outgoing.content.trim().is_empty() {
            return Err(ChatError::MissingField("messageContent"));
        }
        let conversation_id = ConversationId::derive(sender, &outgoing.receiver_id)?;
        self.ensure_user(&outgoing.receiver_id).await?;

        let message = Message {
            id: MessageId::generate(),
            sender_id: sender.clone(),
            receiver_id: outgoing.receiver_id,
            content: outgoing.content,
            title: outgoing.title.filter(|t| !t.trim().is_empty()),
            is_read: false,
            timestamp: Utc::now(),
            updated_at: None,
        };
        self.store
            .set(&message_path(&conversation_id, &message.id)?, &message)
            .await?;

        let snapshot = Conversation {
            id: conversation_id.clone(),
            participants: vec![message.sender_id.clone(), message.receiver_id.clone()],
            last_message: LastMessage::from(&message),
            last_message_id: Some(message.id.clone()),
            updated_at: message.timestamp,
        };
        self.store
            .set(&conversation_path(&conversation_id)?, &snapshot)
            .await?;

        Ok((conversation_id, message))
    }

    /// Messages of a conversation in send order.
    ///
    /// # Errors
    ///
    /// `ConversationNotFound` or `NotParticipant`.
    pub async fn messages(
        &self,
        me: &UserId,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        self.participant_conversation(me, conversation_id).await?;
        self.ordered_messages(conversation_id).await
    }

    /// One message, visible to either participant.
    ///
    /// # Errors
    ///
    /// `ConversationNotFound`, `NotParticipant` or `MessageNotFound`.
    pub async fn message(
        &self,
        me: &UserId,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<Message, ChatError> {
        self.participant_conversation(me, conversation_id).await?;
        self.load_message(conversation_id, message_id).await
    }

    /// Edit a message.
    ///
    /// Content and title belong to the sender; the read flag to the receiver.
    ///
    /// # Errors
    ///
    /// `NotSender` / `NotReceiver` when the caller touches a field that is not theirs.
    #[instrument(skip(self, patch), fields(me = %me, conversation = %conversation_id))]
    pub async fn update_message(
        &self,
        me: &UserId,
        conversation_id: &ConversationId,
        message_id: &MessageId,
        patch: MessagePatch,
    ) -> Result<Message, ChatError> {
        let conversation = self.participant_conversation(me, conversation_id).await?;
        let mut message = self.load_message(conversation_id, message_id).await?;

        if (patch.content.is_some() || patch.title.is_some()) && message.sender_id != *me {
            return Err(ChatError::NotSender);
        }
        if patch.is_read.is_some() && message.receiver_id != *me {
            return Err(ChatError::NotReceiver);
        }

        let content_changed = apply_nonblank(&mut message.content, patch.content);
        apply_present(&mut message.title, patch.title.map(Some));
        if let Some(is_read) = patch.is_read {
            message.is_read = is_read;
        }
        message.updated_at = Some(Utc::now());

        self.store
            .set(&message_path(conversation_id, message_id)?, &message)
            .await?;

        if content_changed && conversation.last_message_id.as_ref() == Some(message_id) {
            let mut snapshot = conversation;
            snapshot.last_message = LastMessage::from(&message);
            self.store
                .set(&conversation_path(conversation_id)?, &snapshot)
                .await?;
        }
        Ok(message)
    }

    /// Delete a message. Only its sender may do this.
    ///
    /// Deleting the newest message moves the conversation snapshot back to the
    /// one before it, or empties it when none remain.
    ///
    /// # Errors
    ///
    /// `NotSender` for anyone else.
    #[instrument(skip(self), fields(me = %me, conversation = %conversation_id))]
    pub async fn delete_message(
        &self,
        me: &UserId,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<(), ChatError> {
        let conversation = self.participant_conversation(me, conversation_id).await?;
        let message = self.load_message(conversation_id, message_id).await?;
        if message.sender_id != *me {
            return Err(ChatError::NotSender);
        }
        self.store
            .delete(&message_path(conversation_id, message_id)?)
            .await?;

        if conversation.last_message_id.as_ref() == Some(message_id) {
            let remaining = self.ordered_messages(conversation_id).await?;
            let mut snapshot = conversation;
            match remaining.last() {
                Some(newest) => {
                    snapshot.last_message = LastMessage::from(newest);
                    snapshot.last_message_id = Some(newest.id.clone());
                }
                None => {
                    snapshot.last_message = LastMessage::default();
                    snapshot.last_message_id = None;
                }
            }
            snapshot.updated_at = Utc::now();
            self.store
                .set(&conversation_path(conversation_id)?, &snapshot)
                .await?;
        }
        Ok(())
    }

    async fn ordered_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        let path = RecordPath::record(Collection::Messages, conversation_id)
            .map_err(|_| ChatError::ConversationNotFound)?;
        let rows: Vec<(String, Message)> = self.store.list(&path).await?;
        let mut messages: Vec<Message> = rows
            .into_iter()
            .map(|(key, mut message)| {
                message.id = MessageId::new(key);
                message
            })
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(messages)
    }

    async fn participant_conversation(
        &self,
        me: &UserId,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, ChatError> {
        let path = conversation_path(conversation_id)?;
        let mut conversation: Conversation = self
            .store
            .get(&path)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        if !conversation.has_participant(me) {
            return Err(ChatError::NotParticipant);
        }
        conversation.id = conversation_id.clone();
        Ok(conversation)
    }

    async fn load_message(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<Message, ChatError> {
        let Ok(path) = message_path(conversation_id, message_id) else {
            return Err(ChatError::MessageNotFound);
        };
        let mut message: Message = self
            .store
            .get(&path)
            .await?
            .ok_or(ChatError::MessageNotFound)?;
        message.id = message_id.clone();
        Ok(message)
    }

    async fn ensure_user(&self, uid: &UserId) -> Result<(), ChatError> {
        let path =
            RecordPath::record(Collection::Users, uid).map_err(|_| ChatError::ReceiverNotFound)?;
        if self.store.exists(&path).await? {
            Ok(())
        } else {
            Err(ChatError::ReceiverNotFound)
        }
    }
}

fn conversation_path(id: &ConversationId) -> Result<RecordPath, ChatError> {
    RecordPath::record(Collection::Conversations, id).map_err(|_| ChatError::ConversationNotFound)
}

fn message_path(
    conversation_id: &ConversationId,
    message_id: &MessageId,
) -> Result<RecordPath, ChatError> {
    RecordPath::nested(Collection::Messages, conversation_id, message_id)
        .map_err(|_| ChatError::MessageNotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::store::MemoryStore;

    async fn store_with_users(uids: &[&str]) -> Store {
        let store = Store::new(MemoryStore::new());
        for uid in uids {
            store
                .set(
                    &RecordPath::record(Collection::Users, uid).unwrap(),
                    &User {
                        uid: UserId::new(*uid),
                        name: uid.to_string(),
                        ..User::default()
                    },
                )
                .await
                .unwrap();
        }
        store
    }

    fn hello(to: &str) -> OutgoingMessage {
        OutgoingMessage {
            receiver_id: to.into(),
            content: "halo".to_string(),
            title: None,
        }
    }

    #[tokio::test]
    async fn test_chatroom_conflict_from_either_side() {
        let store = store_with_users(&["alice", "bob"]).await;
        let chat = ChatService::new(&store);

        let id = chat
            .create_chatroom(&"alice".into(), &"bob".into())
            .await
            .unwrap();
        assert_eq!(id.as_str(), "alice_bob");

        match chat.create_chatroom(&"bob".into(), &"alice".into()).await {
            Err(ChatError::AlreadyExists(existing)) => assert_eq!(existing, id),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chatroom_with_self_is_rejected() {
        let store = store_with_users(&["alice"]).await;
        let err = ChatService::new(&store)
            .create_chatroom(&"alice".into(), &"alice".into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::InvalidPair(ConversationIdError::SameParticipant)
        ));
    }

    #[tokio::test]
    async fn test_send_updates_snapshot() {
        let store = store_with_users(&["alice", "bob"]).await;
        let chat = ChatService::new(&store);

        let (id, message) = chat.send_message(&"bob".into(), hello("alice")).await.unwrap();
        let list = chat.conversations_for(&"alice".into()).await.unwrap();

        assert_eq!(list.len(), 1);
        let conversation = list.first().unwrap();
        assert_eq!(conversation.id, id);
        assert_eq!(conversation.last_message.content, "halo");
        assert_eq!(conversation.last_message_id.as_ref(), Some(&message.id));
        assert!(chat.conversations_for(&"carol".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_to_unknown_user() {
        let store = store_with_users(&["alice"]).await;
        let err = ChatService::new(&store)
            .send_message(&"alice".into(), hello("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ReceiverNotFound));
    }

    #[tokio::test]
    async fn test_outsider_cannot_read() {
        let store = store_with_users(&["alice", "bob", "eve"]).await;
        let chat = ChatService::new(&store);
        let (id, _) = chat.send_message(&"alice".into(), hello("bob")).await.unwrap();

        assert_eq!(chat.messages(&"bob".into(), &id).await.unwrap().len(), 1);
        assert!(matches!(
            chat.messages(&"eve".into(), &id).await,
            Err(ChatError::NotParticipant)
        ));
    }

    #[tokio::test]
    async fn test_edit_rules() {
        let store = store_with_users(&["alice", "bob"]).await;
        let chat = ChatService::new(&store);
        let (id, message) = chat.send_message(&"alice".into(), hello("bob")).await.unwrap();

        let receiver_edit = chat
            .update_message(
                &"bob".into(),
                &id,
                &message.id,
                MessagePatch {
                    content: Some("changed".to_string()),
                    ..MessagePatch::default()
                },
            )
            .await;
        assert!(matches!(receiver_edit, Err(ChatError::NotSender)));

        let sender_read = chat
            .update_message(
                &"alice".into(),
                &id,
                &message.id,
                MessagePatch {
                    is_read: Some(true),
                    ..MessagePatch::default()
                },
            )
            .await;
        assert!(matches!(sender_read, Err(ChatError::NotReceiver)));

        let read = chat
            .update_message(
                &"bob".into(),
                &id,
                &message.id,
                MessagePatch {
                    is_read: Some(true),
                    ..MessagePatch::default()
                },
            )
            .await
            .unwrap();
        assert!(read.is_read);
        assert_eq!(read.content, "halo");

        let edited = chat
            .update_message(
                &"alice".into(),
                &id,
                &message.id,
                MessagePatch {
                    content: Some("halo, apa kabar?".to_string()),
                    ..MessagePatch::default()
                },
            )
            .await
            .unwrap();
        assert!(edited.is_read);
        let list = chat.conversations_for(&"bob".into()).await.unwrap();
        assert_eq!(list.first().unwrap().last_message.content, "halo, apa kabar?");
    }

    #[tokio::test]
    async fn test_only_sender_deletes() {
        let store = store_with_users(&["alice", "bob"]).await;
        let chat = ChatService::new(&store);
        let (id, message) = chat.send_message(&"alice".into(), hello("bob")).await.unwrap();

        assert!(matches!(
            chat.delete_message(&"bob".into(), &id, &message.id).await,
            Err(ChatError::NotSender)
        ));
        chat.delete_message(&"alice".into(), &id, &message.id)
            .await
            .unwrap();
        assert!(matches!(
            chat.message(&"alice".into(), &id, &message.id).await,
            Err(ChatError::MessageNotFound)
        ));
    }

    #[tokio::test]
    async fn test_deleting_newest_message_rolls_snapshot_back() {
        let store = store_with_users(&["alice", "bob"]).await;
        let chat = ChatService::new(&store);
        let (id, first) = chat.send_message(&"alice".into(), hello("bob")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let (_, second) = chat
            .send_message(
                &"alice".into(),
                OutgoingMessage {
                    content: "masih ada?".to_string(),
                    ..hello("bob")
                },
            )
            .await
            .unwrap();

        chat.delete_message(&"alice".into(), &id, &second.id)
            .await
            .unwrap();
        let list = chat.conversations_for(&"bob".into()).await.unwrap();
        let snapshot = list.first().unwrap();
        assert_eq!(snapshot.last_message_id.as_ref(), Some(&first.id));
        assert_eq!(snapshot.last_message.content, first.content);

        chat.delete_message(&"alice".into(), &id, &first.id)
            .await
            .unwrap();
        let list = chat.conversations_for(&"bob".into()).await.unwrap();
        let snapshot = list.first().unwrap();
        assert!(snapshot.last_message_id.is_none());
        assert!(snapshot.last_message.content.is_empty());
    }
}
