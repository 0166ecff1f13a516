//! The JSON documents an archive run writes.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub guild_id: String,
    pub guild_name: String,
    pub guild_description: Option<String>,
    pub guild_icon: Option<String>,
    pub guild_creation_date: DateTime<Utc>,
    pub guild_owner_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_topic: Option<String>,
    pub channel_creation_date: DateTime<Utc>,
    pub channel_nsfw: bool,
}

/// One element of a `messages_N.json` page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub author: String,
    pub time: DateTime<Utc>,
    pub text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replying_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub spawned_thread: bool,
    /// A single object mapping each emoji name to the tags of the users who
    /// reacted with it, wrapped in an array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<[BTreeMap<String, Vec<String>>; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stickers: Option<Vec<StickerRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StickerRecord {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub creator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentRecord {
    pub id: String,
    pub spoiler: bool,
    pub name: String,
    pub url: String,
    pub size: u64,
}

/// One element of `participants.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub id: String,
    pub tag: String,
    pub pfp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined: Option<DateTime<Utc>>,
}

/// Everyone seen in a channel, keyed by tag, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct ParticipantSet {
    order: Vec<Participant>,
    index: HashMap<String, usize>,
}

impl ParticipantSet {
    /// Adds `participant` unless its tag is already present.
    pub fn insert(&mut self, participant: Participant) {
        if self.index.contains_key(&participant.tag) {
            return;
        }
        self.index.insert(participant.tag.clone(), self.order.len());
        self.order.push(participant);
    }

    /// Records when `tag` joined. Members who left and rejoined keep their
    /// earliest join.
    pub fn mark_joined(&mut self, tag: &str, joined: DateTime<Utc>) {
        if let Some(&i) = self.index.get(tag) {
            let slot = &mut self.order[i].joined;
            *slot = Some(slot.map_or(joined, |known| known.min(joined)));
        }
    }

    #[cfg(test)]
    pub fn get(&self, tag: &str) -> Option<&Participant> {
        self.index.get(tag).map(|&i| &self.order[i])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.order.iter()
    }
}

impl Serialize for ParticipantSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.order.serialize(serializer)
    }
}
