//! [`ArchiveBackend`] backed by serenity's HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use serenity::all::{
    Attachment, ChannelId, CreateAttachment, CreateMessage, GetMessages, Http, Message,
    MessageId, MessageType, StickerItem, Timestamp, User, UserId,
};
use tracing::{debug, instrument};

use super::backend::{ArchiveBackend, SourceMessage, SourceReaction, SourceUser, FETCH_LIMIT};
use super::records::{AttachmentRecord, Metadata, StickerRecord};
use crate::error::{MagiError, MagiResult};

pub struct DiscordBackend {
    http: Arc<Http>,
}

impl DiscordBackend {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn source_message(&self, message: Message) -> SourceMessage {
        let mut stickers = Vec::with_capacity(message.sticker_items.len());
        for item in &message.sticker_items {
            stickers.push(self.sticker(item).await);
        }

        let reply_to = match message.kind {
            MessageType::InlineReply => message
                .message_reference
                .as_ref()
                .and_then(|reference| reference.message_id),
            _ => None,
        };

        SourceMessage {
            id: message.id,
            author: source_user(&message.author),
            created_at: to_utc(message.timestamp),
            pinned: message.pinned,
            reply_to,
            member_join: message.kind == MessageType::MemberJoin,
            thread: message.thread.as_ref().map(|thread| thread.id),
            reactions: message
                .reactions
                .iter()
                .map(|reaction| SourceReaction {
                    emoji: reaction.reaction_type.clone(),
                })
                .collect(),
            stickers,
            attachments: message.attachments.iter().map(attachment_record).collect(),
            content: message.content,
        }
    }

    /// Message sticker items don't carry their creator; the full sticker does.
    async fn sticker(&self, item: &StickerItem) -> StickerRecord {
        let creator = match item.to_sticker(&*self.http).await {
            Ok(sticker) => sticker.user.map(|user| user.tag()),
            Err(e) => {
                debug!(sticker = %item.id, error = %e, "Could not resolve sticker");
                None
            }
        };

        StickerRecord {
            id: item.id.to_string(),
            name: item.name.clone(),
            url: item.image_url(),
            creator,
        }
    }
}

#[async_trait]
impl ArchiveBackend for DiscordBackend {
    #[instrument(skip(self))]
    async fn metadata(&self, channel: ChannelId) -> MagiResult<Metadata> {
        let channel = channel
            .to_channel(&*self.http)
            .await?
            .guild()
            .ok_or_else(|| MagiError::usage("Only server channels can be archived."))?;
        let guild = channel.guild_id.to_partial_guild(&*self.http).await?;

        Ok(Metadata {
            guild_id: guild.id.to_string(),
            guild_name: guild.name.clone(),
            guild_description: guild.description.clone(),
            guild_icon: guild.icon_url(),
            guild_creation_date: to_utc(guild.id.created_at()),
            guild_owner_id: guild.owner_id.to_string(),
            channel_id: channel.id.to_string(),
            channel_name: channel.name.clone(),
            channel_topic: channel.topic.clone(),
            channel_creation_date: to_utc(channel.id.created_at()),
            channel_nsfw: channel.nsfw,
        })
    }

    async fn messages(
        &self,
        channel: ChannelId,
        before: Option<MessageId>,
    ) -> MagiResult<Vec<SourceMessage>> {
        let mut query = GetMessages::new().limit(FETCH_LIMIT);
        if let Some(before) = before {
            query = query.before(before);
        }

        let fetched = channel.messages(&*self.http, query).await?;
        let mut messages = Vec::with_capacity(fetched.len());
        for message in fetched {
            messages.push(self.source_message(message).await);
        }
        Ok(messages)
    }

    async fn reactors(
        &self,
        channel: ChannelId,
        message: MessageId,
        reaction: &SourceReaction,
    ) -> MagiResult<Vec<SourceUser>> {
        let users = channel
            .reaction_users(
                &*self.http,
                message,
                reaction.emoji.clone(),
                Some(FETCH_LIMIT),
                None::<UserId>,
            )
            .await?;
        Ok(users.iter().map(source_user).collect())
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn upload(&self, channel: ChannelId, filename: &str, data: Vec<u8>) -> MagiResult<()> {
        let file = CreateAttachment::bytes(data, filename);
        channel
            .send_message(&*self.http, CreateMessage::new().add_file(file))
            .await?;
        Ok(())
    }
}

pub fn source_user(user: &User) -> SourceUser {
    SourceUser {
        id: user.id.to_string(),
        tag: user.tag(),
        avatar_url: user.face(),
    }
}

fn attachment_record(attachment: &Attachment) -> AttachmentRecord {
    AttachmentRecord {
        id: attachment.id.to_string(),
        spoiler: attachment.filename.starts_with("SPOILER_"),
        name: attachment.filename.clone(),
        url: attachment.url.clone(),
        size: u64::from(attachment.size),
    }
}

fn to_utc(timestamp: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), timestamp.nanosecond())
        .unwrap_or_default()
}
