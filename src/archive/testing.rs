//! In-memory [`ArchiveBackend`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, MessageId, ReactionType};

use super::backend::{ArchiveBackend, SourceMessage, SourceReaction, SourceUser, FETCH_LIMIT};
use super::records::Metadata;
use crate::error::MagiResult;

pub fn user(tag: &str) -> SourceUser {
    SourceUser {
        id: format!("{}", tag.len()),
        tag: tag.to_string(),
        avatar_url: format!("https://cdn.discordapp.com/avatars/{tag}.webp"),
    }
}

pub fn reaction(emoji: &str) -> SourceReaction {
    SourceReaction {
        emoji: ReactionType::Unicode(emoji.to_string()),
    }
}

/// A plain text message whose timestamp grows with its id.
pub fn message(id: u64, author: &str) -> SourceMessage {
    SourceMessage {
        id: MessageId::new(id),
        author: user(author),
        created_at: at(id),
        content: format!("message {id}"),
        pinned: false,
        reply_to: None,
        member_join: false,
        thread: None,
        reactions: Vec::new(),
        stickers: Vec::new(),
        attachments: Vec::new(),
    }
}

fn at(seconds: u64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_600_000_000 + seconds as i64, 0).unwrap_or_default()
}

/// Serves scripted histories and records what was asked of it.
#[derive(Default)]
pub struct MockBackend {
    histories: HashMap<ChannelId, Vec<SourceMessage>>,
    reactors: HashMap<(MessageId, String), Vec<SourceUser>>,
    fetches: Mutex<Vec<(ChannelId, Option<MessageId>)>>,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockBackend {
    /// `messages` must be newest first.
    pub fn with_history(mut self, channel: ChannelId, messages: Vec<SourceMessage>) -> Self {
        self.histories.insert(channel, messages);
        self
    }

    pub fn with_reactors(mut self, message: MessageId, emoji: &str, users: Vec<SourceUser>) -> Self {
        self.reactors.insert((message, emoji.to_string()), users);
        self
    }

    /// First page of `channel` without recording a fetch.
    pub fn page(&self, channel: ChannelId) -> Vec<SourceMessage> {
        self.slice(channel, None)
    }

    pub fn fetches(&self) -> Vec<(ChannelId, Option<MessageId>)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn uploaded(&self, name: &str) -> Option<Vec<u8>> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .find(|(uploaded, _)| uploaded == name)
            .map(|(_, data)| data.clone())
    }

    fn slice(&self, channel: ChannelId, before: Option<MessageId>) -> Vec<SourceMessage> {
        let Some(history) = self.histories.get(&channel) else {
            return Vec::new();
        };
        let start = match before {
            Some(before) => history
                .iter()
                .position(|message| message.id == before)
                .map_or(history.len(), |i| i + 1),
            None => 0,
        };
        history
            .iter()
            .skip(start)
            .take(usize::from(FETCH_LIMIT))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ArchiveBackend for MockBackend {
    async fn metadata(&self, channel: ChannelId) -> MagiResult<Metadata> {
        Ok(Metadata {
            guild_id: "1".into(),
            guild_name: "magi".into(),
            guild_description: None,
            guild_icon: None,
            guild_creation_date: at(0),
            guild_owner_id: "2".into(),
            channel_id: channel.to_string(),
            channel_name: "general".into(),
            channel_topic: Some("talk".into()),
            channel_creation_date: at(1),
            channel_nsfw: false,
        })
    }

    async fn messages(
        &self,
        channel: ChannelId,
        before: Option<MessageId>,
    ) -> MagiResult<Vec<SourceMessage>> {
        self.fetches.lock().unwrap().push((channel, before));
        Ok(self.slice(channel, before))
    }

    async fn reactors(
        &self,
        _channel: ChannelId,
        message: MessageId,
        reaction: &SourceReaction,
    ) -> MagiResult<Vec<SourceUser>> {
        Ok(self
            .reactors
            .get(&(message, reaction.name()))
            .cloned()
            .unwrap_or_default())
    }

    async fn upload(&self, _channel: ChannelId, filename: &str, data: Vec<u8>) -> MagiResult<()> {
        self.uploads.lock().unwrap().push((filename.to_string(), data));
        Ok(())
    }
}
