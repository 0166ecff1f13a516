//! Walks a channel's history and shapes it into archive records.

use std::collections::HashSet;

use serenity::all::{ChannelId, MessageId};
use tracing::{debug, info, instrument};

use super::backend::{ArchiveBackend, SourceMessage, FETCH_LIMIT};
use super::pager::Pager;
use super::records::{MessageRecord, ParticipantSet};
use super::request::{ArchiveRequest, Capture};
use super::staging::{page_filename, Staging, METADATA_FILENAME, PARTICIPANTS_FILENAME};
use super::upload::Staged;
use crate::error::MagiResult;

/// Newest-first page cursor over one channel.
#[derive(Debug)]
struct History {
    channel: ChannelId,
    before: Option<MessageId>,
    done: bool,
}

impl History {
    fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            before: None,
            done: false,
        }
    }

    /// The next page, or `None` once a short page has been seen.
    async fn next(&mut self, backend: &dyn ArchiveBackend) -> MagiResult<Option<Vec<SourceMessage>>> {
        if self.done {
            return Ok(None);
        }

        let page = backend.messages(self.channel, self.before).await?;
        debug!(channel = %self.channel, before = ?self.before, fetched = page.len(), "Fetched history page");

        self.done = page.len() < usize::from(FETCH_LIMIT);
        self.before = page.last().map(|message| message.id);

        Ok((!page.is_empty()).then_some(page))
    }
}

/// Builds message records and the participant set as pages arrive.
pub struct Collector<'a> {
    backend: &'a dyn ArchiveBackend,
    capture: Capture,
    participants: ParticipantSet,
    seen: HashSet<MessageId>,
}

impl<'a> Collector<'a> {
    pub fn new(backend: &'a dyn ArchiveBackend, capture: Capture) -> Self {
        Self {
            backend,
            capture,
            participants: ParticipantSet::default(),
            seen: HashSet::new(),
        }
    }

    pub fn participants(&self) -> &ParticipantSet {
        &self.participants
    }

    /// Records for one page of `channel`. Thread messages directly follow the
    /// message that spawned the thread.
    pub async fn extract_page(
        &mut self,
        channel: ChannelId,
        page: Vec<SourceMessage>,
    ) -> MagiResult<Vec<MessageRecord>> {
        let mut records = Vec::with_capacity(page.len());

        for message in page {
            let thread = message.thread.filter(|_| self.capture.threads);
            records.extend(self.extract(channel, message, None).await?);
            if let Some(thread) = thread {
                records.extend(self.thread(thread).await?);
            }
        }

        Ok(records)
    }

    async fn thread(&mut self, thread: ChannelId) -> MagiResult<Vec<MessageRecord>> {
        let mut history = History::new(thread);
        let mut records = Vec::new();

        while let Some(page) = history.next(self.backend).await? {
            for message in page {
                records.extend(self.extract(thread, message, Some(thread)).await?);
            }
        }

        debug!(%thread, messages = records.len(), "Collected thread");
        Ok(records)
    }

    /// `None` when the message was already archived.
    async fn extract(
        &mut self,
        channel: ChannelId,
        message: SourceMessage,
        in_thread: Option<ChannelId>,
    ) -> MagiResult<Option<MessageRecord>> {
        if !self.seen.insert(message.id) {
            return Ok(None);
        }

        let tag = message.author.tag.clone();
        self.participants.insert(message.author.to_participant());
        if message.member_join {
            self.participants.mark_joined(&tag, message.created_at);
        }

        let reactions = if self.capture.reactions {
            let mut by_emoji = std::collections::BTreeMap::new();
            for reaction in &message.reactions {
                let users = self.backend.reactors(channel, message.id, reaction).await?;
                let tags = users.iter().map(|user| user.tag.clone()).collect();
                for user in &users {
                    self.participants.insert(user.to_participant());
                }
                by_emoji.insert(reaction.name(), tags);
            }
            Some([by_emoji])
        } else {
            None
        };

        let spawned = message.thread.filter(|_| self.capture.threads);

        Ok(Some(MessageRecord {
            id: message.id.to_string(),
            author: tag,
            time: message.created_at,
            text: message.content,
            pinned: message.pinned,
            replying_to: message.reply_to.map(|id| id.to_string()),
            thread_id: spawned.or(in_thread).map(|id| id.to_string()),
            spawned_thread: spawned.is_some(),
            reactions,
            stickers: self.capture.stickers.then_some(message.stickers),
            attachments: self.capture.attachments.then_some(message.attachments),
        }))
    }
}

/// Generates every file `request` asks for inside `staging`. Message pages
/// hold at most `page_limit` bytes each.
#[instrument(skip(backend, staging))]
pub async fn stage(
    backend: &dyn ArchiveBackend,
    staging: &Staging,
    channel: ChannelId,
    request: &ArchiveRequest,
    page_limit: usize,
) -> MagiResult<Staged> {
    let mut staged = Staged::default();

    if request.metadata {
        let metadata = backend.metadata(channel).await?;
        staging
            .write(METADATA_FILENAME, &serde_json::to_vec(&metadata)?)
            .await?;
        staged.metadata = true;
    }

    if !request.walks_history() {
        return Ok(staged);
    }

    let mut collector = Collector::new(backend, request.capture);
    let mut history = History::new(channel);
    let mut pager = Pager::new(page_limit);
    let mut messages = 0;

    while let Some(page) = history.next(backend).await? {
        let records = collector.extract_page(channel, page).await?;
        messages += records.len();
        if !request.messages {
            continue;
        }
        for record in &records {
            if let Some(full) = pager.push(record)? {
                staging.write(&page_filename(staged.pages), &full).await?;
                staged.pages += 1;
            }
        }
    }

    if let Some(last) = pager.finish() {
        staging.write(&page_filename(staged.pages), &last).await?;
        staged.pages += 1;
    }

    if request.participants {
        staging
            .write(
                PARTICIPANTS_FILENAME,
                &serde_json::to_vec(collector.participants())?,
            )
            .await?;
        staged.participants = true;
    }

    info!(
        %channel,
        messages,
        participants = collector.participants().len(),
        pages = staged.pages,
        "Staged archive"
    );

    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::pager::FILE_UPLOAD_SIZE_LIMIT;
    use crate::archive::testing::{message, user, MockBackend};
    use serde_json::Value;
    use tempfile::TempDir;

    fn channel() -> ChannelId {
        ChannelId::new(10)
    }

    /// `count` messages with ids `count..=1`, newest first.
    fn history(count: u64) -> Vec<SourceMessage> {
        (1..=count).rev().map(|id| message(id, "ana")).collect()
    }

    fn read_json(staging: &Staging, file: &str) -> Value {
        serde_json::from_slice(&std::fs::read(staging.path(file)).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn history_stops_after_a_short_page() {
        let backend = MockBackend::default().with_history(channel(), history(250));
        let mut walk = History::new(channel());
        let mut sizes = Vec::new();
        while let Some(page) = walk.next(&backend).await.unwrap() {
            sizes.push(page.len());
        }

        assert_eq!(sizes, [100, 100, 50]);
        let ids = |n: u64| Some(MessageId::new(n));
        assert_eq!(
            backend.fetches(),
            [(channel(), None), (channel(), ids(151)), (channel(), ids(51))]
        );
    }

    #[tokio::test]
    async fn exact_multiple_needs_one_empty_page() {
        let backend = MockBackend::default().with_history(channel(), history(100));
        let mut walk = History::new(channel());
        let mut pages = 0;
        while walk.next(&backend).await.unwrap().is_some() {
            pages += 1;
        }
        assert_eq!(pages, 1);
        assert_eq!(backend.fetches().len(), 2);
    }

    #[tokio::test]
    async fn reactions_name_reactors_and_add_participants() {
        let mut liked = message(2, "ana");
        liked.reactions.push(crate::archive::testing::reaction("👍"));
        let backend = MockBackend::default()
            .with_history(channel(), vec![liked, message(1, "bo")])
            .with_reactors(MessageId::new(2), "👍", vec![user("cy"), user("ana")]);

        let mut collector = Collector::new(
            &backend,
            Capture {
                reactions: true,
                ..Capture::default()
            },
        );
        let page = backend.page(channel());
        let records = collector.extract_page(channel(), page).await.unwrap();

        let [reactions] = records[0].reactions.as_ref().unwrap();
        assert_eq!(reactions["👍"], ["cy", "ana"]);
        let [none] = records[1].reactions.as_ref().unwrap();
        assert!(none.is_empty());

        let tags: Vec<_> = collector.participants().iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags, ["ana", "cy", "bo"]);
    }

    #[tokio::test]
    async fn threads_follow_their_parent() {
        let thread = ChannelId::new(3);
        let mut parent = message(3, "ana");
        parent.thread = Some(thread);
        let backend = MockBackend::default()
            .with_history(channel(), vec![message(4, "ana"), parent, message(1, "bo")])
            .with_history(thread, vec![message(6, "cy"), message(5, "ana")]);

        let mut collector = Collector::new(&backend, Capture::ALL);
        let page = backend.page(channel());
        let records = collector.extract_page(channel(), page).await.unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["4", "3", "6", "5", "1"]);
        assert!(records[1].spawned_thread);
        assert_eq!(records[1].thread_id.as_deref(), Some("3"));
        assert!(!records[2].spawned_thread);
        assert_eq!(records[2].thread_id.as_deref(), Some("3"));
        assert_eq!(records[4].thread_id, None);
        assert!(collector.participants().get("cy").is_some());
    }

    #[tokio::test]
    async fn threads_are_skipped_unless_captured() {
        let mut parent = message(3, "ana");
        parent.thread = Some(ChannelId::new(3));
        let backend = MockBackend::default().with_history(channel(), vec![parent]);

        let mut collector = Collector::new(&backend, Capture::default());
        let page = backend.page(channel());
        let records = collector.extract_page(channel(), page).await.unwrap();

        assert_eq!(records.len(), 1);
        assert!(!records[0].spawned_thread);
        assert_eq!(records[0].thread_id, None);
        assert_eq!(backend.fetches().len(), 0);
    }

    #[tokio::test]
    async fn member_join_patches_participant() {
        let mut joined = message(1, "ana");
        joined.member_join = true;
        let backend = MockBackend::default().with_history(channel(), vec![message(2, "ana"), joined.clone()]);

        let mut collector = Collector::new(&backend, Capture::default());
        let page = backend.page(channel());
        collector.extract_page(channel(), page).await.unwrap();

        assert_eq!(
            collector.participants().get("ana").unwrap().joined,
            Some(joined.created_at)
        );
    }

    #[tokio::test]
    async fn stage_complete_writes_every_document() {
        let root = TempDir::new().unwrap();
        let staging = Staging::acquire(root.path(), channel()).await.unwrap();
        let backend = MockBackend::default().with_history(channel(), history(3));
        let request = ArchiveRequest::parse(&["complete"]).unwrap();

        let staged = stage(&backend, &staging, channel(), &request, FILE_UPLOAD_SIZE_LIMIT).await.unwrap();
        assert_eq!(
            staged,
            Staged {
                metadata: true,
                participants: true,
                pages: 1
            }
        );

        let messages = read_json(&staging, "messages_0.json");
        assert_eq!(messages.as_array().unwrap().len(), 3);
        assert_eq!(messages[0]["id"], "3");
        assert_eq!(messages[0]["attachments"], serde_json::json!([]));
        assert_eq!(read_json(&staging, "participants.json")[0]["tag"], "ana");
        assert_eq!(read_json(&staging, "metadata.json")["channelId"], "10");
    }

    #[tokio::test]
    async fn participants_request_writes_no_pages() {
        let root = TempDir::new().unwrap();
        let staging = Staging::acquire(root.path(), channel()).await.unwrap();
        let backend = MockBackend::default().with_history(channel(), history(2));
        let request = ArchiveRequest::parse(&["participants"]).unwrap();

        let staged = stage(&backend, &staging, channel(), &request, FILE_UPLOAD_SIZE_LIMIT).await.unwrap();
        assert_eq!(
            staged,
            Staged {
                metadata: false,
                participants: true,
                pages: 0
            }
        );
        assert!(!staging.path("messages_0.json").exists());
    }

    #[tokio::test]
    async fn metadata_request_never_fetches_history() {
        let root = TempDir::new().unwrap();
        let staging = Staging::acquire(root.path(), channel()).await.unwrap();
        let backend = MockBackend::default().with_history(channel(), history(2));
        let request = ArchiveRequest::parse(&["metadata"]).unwrap();

        let staged = stage(&backend, &staging, channel(), &request, FILE_UPLOAD_SIZE_LIMIT).await.unwrap();
        assert!(staged.metadata && !staged.participants && staged.pages == 0);
        assert!(backend.fetches().is_empty());
    }

    #[tokio::test]
    async fn empty_channel_stages_no_pages() {
        let root = TempDir::new().unwrap();
        let staging = Staging::acquire(root.path(), channel()).await.unwrap();
        let backend = MockBackend::default();
        let request = ArchiveRequest::parse(&["text", "messages-only"]).unwrap();

        let staged = stage(&backend, &staging, channel(), &request, FILE_UPLOAD_SIZE_LIMIT).await.unwrap();
        assert_eq!(staged, Staged::default());
    }

    #[tokio::test]
    async fn repeated_message_ids_are_archived_once() {
        let backend = MockBackend::default();
        let mut collector = Collector::new(&backend, Capture::default());

        let records = collector
            .extract_page(channel(), vec![message(2, "ana"), message(2, "ana"), message(1, "bo")])
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);

        // A later page that overlaps the previous one adds nothing new.
        let records = collector
            .extract_page(channel(), vec![message(1, "bo")])
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn thread_repeating_its_parent_is_archived_once() {
        let thread = ChannelId::new(3);
        let mut parent = message(3, "ana");
        parent.thread = Some(thread);
        let backend = MockBackend::default()
            .with_history(channel(), vec![parent.clone(), message(1, "bo")])
            .with_history(thread, vec![message(5, "cy"), parent]);

        let mut collector = Collector::new(&backend, Capture::ALL);
        let page = backend.page(channel());
        let records = collector.extract_page(channel(), page).await.unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["3", "5", "1"]);
        assert!(records[0].spawned_thread);
    }

    #[tokio::test]
    async fn stage_splits_messages_across_numbered_pages() {
        let root = TempDir::new().unwrap();
        let staging = Staging::acquire(root.path(), channel()).await.unwrap();
        let backend = MockBackend::default().with_history(channel(), history(150));
        let request = ArchiveRequest::parse(&["text", "messages-only"]).unwrap();

        let one = serde_json::to_vec(&collected(&backend, 150).await).unwrap().len();
        let staged = stage(&backend, &staging, channel(), &request, 2 + 40 * one).await.unwrap();

        assert_eq!(staged.pages, 4);
        let mut ids = Vec::new();
        for n in 0..staged.pages {
            let path = staging.path(&page_filename(n));
            assert!(std::fs::metadata(&path).unwrap().len() as usize <= 2 + 40 * one);
            let page = read_json(&staging, &page_filename(n));
            assert!(!page.as_array().unwrap().is_empty());
            ids.extend(
                page.as_array()
                    .unwrap()
                    .iter()
                    .map(|record| record["id"].as_str().unwrap().parse::<u64>().unwrap()),
            );
        }
        assert!(!staging.path(&page_filename(staged.pages)).exists());
        assert_eq!(ids, (1..=150).rev().collect::<Vec<_>>());
    }

    /// The record the collector builds for message `id`, for sizing pages.
    async fn collected(backend: &MockBackend, id: u64) -> MessageRecord {
        let mut collector = Collector::new(backend, Capture::default());
        collector
            .extract_page(channel(), vec![message(id, "ana")])
            .await
            .unwrap()
            .remove(0)
    }
}
