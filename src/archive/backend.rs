//! The chat-platform operations an archive run depends on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, MessageId, ReactionType};

use super::records::{AttachmentRecord, Metadata, Participant, StickerRecord};
use crate::error::MagiResult;

/// Number of messages (and reaction users) fetched per request.
pub const FETCH_LIMIT: u8 = 100;

/// A user as it appears in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUser {
    pub id: String,
    pub tag: String,
    pub avatar_url: String,
}

impl SourceUser {
    pub fn to_participant(&self) -> Participant {
        Participant {
            id: self.id.clone(),
            tag: self.tag.clone(),
            pfp: self.avatar_url.clone(),
            joined: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceReaction {
    pub emoji: ReactionType,
}

impl SourceReaction {
    /// The key used in the `reactions` object.
    pub fn name(&self) -> String {
        match &self.emoji {
            ReactionType::Custom { name, id, .. } => {
                name.clone().unwrap_or_else(|| id.to_string())
            }
            ReactionType::Unicode(name) => name.clone(),
            other => other.to_string(),
        }
    }
}

/// The parts of a fetched message an archive run looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMessage {
    pub id: MessageId,
    pub author: SourceUser,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub pinned: bool,
    /// Referenced message of an inline reply.
    pub reply_to: Option<MessageId>,
    /// Member-join system message.
    pub member_join: bool,
    /// Thread started from this message.
    pub thread: Option<ChannelId>,
    pub reactions: Vec<SourceReaction>,
    pub stickers: Vec<StickerRecord>,
    pub attachments: Vec<AttachmentRecord>,
}

/// Chat-platform access for the archive pipeline.
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    async fn metadata(&self, channel: ChannelId) -> MagiResult<Metadata>;

    /// Up to [`FETCH_LIMIT`] messages, newest first, older than `before` when given.
    async fn messages(
        &self,
        channel: ChannelId,
        before: Option<MessageId>,
    ) -> MagiResult<Vec<SourceMessage>>;

    /// Up to [`FETCH_LIMIT`] users who reacted with `reaction`.
    async fn reactors(
        &self,
        channel: ChannelId,
        message: MessageId,
        reaction: &SourceReaction,
    ) -> MagiResult<Vec<SourceUser>>;

    /// Uploads `data` to `channel` as an attachment named `filename`.
    async fn upload(&self, channel: ChannelId, filename: &str, data: Vec<u8>) -> MagiResult<()>;
}
