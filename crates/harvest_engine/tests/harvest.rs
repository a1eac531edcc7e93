use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use harvest_engine::{
    CacheError, ChannelIdentity, ChannelStats, CommentOrder, CommentPage, CommentRecord,
    CommentSource, HarvestConfig, HarvestStore, Harvester, MetadataSource, OutputFormat, Page,
    ProviderChannelInfo, SourceError, TranscriptSource, UploadsPage, VideoMetadata, VideoRecord,
    VideoStub,
};
use pretty_assertions::assert_eq;

fn stub(video_id: &str, position: u32) -> VideoStub {
    VideoStub {
        video_id: video_id.to_string(),
        title: format!("video {video_id}"),
        position,
    }
}

fn metadata_for(video_id: &str) -> VideoMetadata {
    VideoMetadata {
        channel_id: "UC123".to_string(),
        title: format!("video {video_id}"),
        description: "desc".to_string(),
        published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        duration: "PT5M".to_string(),
        view_count: 100,
        like_count: 10,
        comment_count: 4,
    }
}

fn comment(id: &str) -> CommentRecord {
    CommentRecord {
        comment_id: id.to_string(),
        text: format!("comment {id}"),
        author: "@viewer".to_string(),
        author_channel: "UCv".to_string(),
        votes: 1,
        replies: 0,
        published: "2024-01-02T00:00:00Z".to_string(),
        avatar_url: String::new(),
    }
}

fn test_config(channels: Vec<ChannelIdentity>) -> HarvestConfig {
    HarvestConfig {
        channels,
        max_videos_per_channel: 100,
        max_comments_per_video: 5,
        output_format: OutputFormat::Both,
        video_delay: Duration::ZERO,
        comment_delay: Duration::ZERO,
        comment_order: CommentOrder::Relevance,
        checkpoint_interval: 2,
        ..HarvestConfig::default()
    }
}

/// Scripted metadata provider counting every call.
#[derive(Default)]
struct FakeMetadata {
    stubs: Vec<VideoStub>,
    failing_videos: HashSet<String>,
    failing_handles: HashSet<String>,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl MetadataSource for FakeMetadata {
    async fn resolve(
        &self,
        channel: &ChannelIdentity,
    ) -> Result<ProviderChannelInfo, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_handles.contains(&channel.handle) {
            return Err(SourceError::NotFound);
        }
        Ok(ProviderChannelInfo {
            channel_id: "UC123".to_string(),
            uploads_playlist: "UU123".to_string(),
        })
    }

    async fn channel_stats(&self, _channel_id: &str) -> Result<ChannelStats, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChannelStats {
            title: "Fake Channel".to_string(),
            subscriber_count: 1000,
            video_count: self.stubs.len() as u64,
            view_count: 5000,
        })
    }

    async fn uploads_page(
        &self,
        _uploads_ref: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<UploadsPage, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + page_size as usize).min(self.stubs.len());
        Ok(Page {
            items: self.stubs[start..end].to_vec(),
            next_page_token: (end < self.stubs.len()).then(|| end.to_string()),
        })
    }

    async fn video_details(&self, video_id: &str) -> Result<VideoMetadata, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_videos.contains(video_id) {
            return Err(SourceError::Transient("provider hiccup".into()));
        }
        Ok(metadata_for(video_id))
    }
}

/// Transcript provider scripted as always-available or always-absent.
struct FakeTranscripts {
    available: bool,
    calls: AtomicUsize,
}

impl FakeTranscripts {
    fn available() -> Self {
        Self {
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    fn unavailable() -> Self {
        Self {
            available: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn transcript(&self, video_id: &str) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available {
            Ok(format!("transcript of {video_id}"))
        } else {
            Err(SourceError::Unavailable)
        }
    }
}

/// Comment provider serving `total` comments in pages of `page_len`,
/// counting page fetches to prove lazy, early-terminated pulls.
struct FakeComments {
    total: usize,
    page_len: usize,
    page_calls: AtomicUsize,
}

impl FakeComments {
    fn new(total: usize, page_len: usize) -> Self {
        Self {
            total,
            page_len,
            page_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl CommentSource for FakeComments {
    async fn comment_page(
        &self,
        video_id: &str,
        _order: CommentOrder,
        page_token: Option<&str>,
    ) -> Result<CommentPage, SourceError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_len).min(self.total);
        let items = (start..end)
            .map(|index| comment(&format!("{video_id}-c{index}")))
            .collect();
        Ok(Page {
            items,
            next_page_token: (end < self.total).then(|| end.to_string()),
        })
    }
}

/// In-memory store counting checkpoint writes.
#[derive(Default)]
struct MemoryStore {
    discovery: Mutex<HashMap<String, Vec<VideoStub>>>,
    processed: Mutex<HashMap<String, Vec<VideoRecord>>>,
    checkpoint_writes: AtomicUsize,
}

impl HarvestStore for MemoryStore {
    fn load_discovery(&self, handle: &str) -> Option<Vec<VideoStub>> {
        self.discovery.lock().unwrap().get(handle).cloned()
    }

    fn save_discovery(&self, handle: &str, stubs: &[VideoStub]) -> Result<(), CacheError> {
        self.discovery
            .lock()
            .unwrap()
            .insert(handle.to_string(), stubs.to_vec());
        Ok(())
    }

    fn load_processed(&self, handle: &str) -> Option<Vec<VideoRecord>> {
        self.processed.lock().unwrap().get(handle).cloned()
    }

    fn checkpoint_processed(
        &self,
        handle: &str,
        records: &[VideoRecord],
    ) -> Result<(), CacheError> {
        self.checkpoint_writes.fetch_add(1, Ordering::SeqCst);
        self.processed
            .lock()
            .unwrap()
            .insert(handle.to_string(), records.to_vec());
        Ok(())
    }
}

struct Fixture {
    metadata: Arc<FakeMetadata>,
    transcripts: Arc<FakeTranscripts>,
    comments: Arc<FakeComments>,
    store: Arc<MemoryStore>,
    harvester: Harvester,
}

fn fixture(
    metadata: FakeMetadata,
    transcripts: FakeTranscripts,
    comments: FakeComments,
    store: MemoryStore,
    config: HarvestConfig,
) -> Fixture {
    let metadata = Arc::new(metadata);
    let transcripts = Arc::new(transcripts);
    let comments = Arc::new(comments);
    let store = Arc::new(store);
    let harvester = Harvester::new(
        metadata.clone(),
        transcripts.clone(),
        comments.clone(),
        store.clone(),
        config,
    );
    Fixture {
        metadata,
        transcripts,
        comments,
        store,
        harvester,
    }
}

#[tokio::test]
async fn processed_cache_hit_short_circuits_with_zero_provider_calls() {
    let channel = ChannelIdentity::by_handle("@pol");
    let store = MemoryStore::default();

    // Seed a complete processed entry by running once.
    let seed = fixture(
        FakeMetadata {
            stubs: vec![stub("v1", 0), stub("v2", 1)],
            ..FakeMetadata::default()
        },
        FakeTranscripts::available(),
        FakeComments::new(3, 2),
        store,
        test_config(vec![channel.clone()]),
    );
    let first_run = seed.harvester.harvest_channel(&channel).await;
    assert_eq!(first_run.len(), 2);

    // Re-run against the same store with fresh counters.
    let store = MemoryStore {
        processed: Mutex::new(seed.store.processed.lock().unwrap().clone()),
        ..MemoryStore::default()
    };
    let rerun = fixture(
        FakeMetadata::default(),
        FakeTranscripts::available(),
        FakeComments::new(3, 2),
        store,
        test_config(vec![channel.clone()]),
    );
    let second_run = rerun.harvester.harvest_channel(&channel).await;

    assert_eq!(second_run, first_run);
    assert_eq!(rerun.metadata.calls.load(Ordering::SeqCst), 0);
    assert_eq!(rerun.transcripts.calls.load(Ordering::SeqCst), 0);
    assert_eq!(rerun.comments.page_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn metadata_gap_keeps_remaining_videos_in_order() {
    let channel = ChannelIdentity::by_handle("@pol");
    let f = fixture(
        FakeMetadata {
            stubs: vec![stub("v1", 0), stub("v2", 1), stub("v3", 2)],
            failing_videos: HashSet::from(["v2".to_string()]),
            ..FakeMetadata::default()
        },
        FakeTranscripts::available(),
        FakeComments::new(2, 2),
        MemoryStore::default(),
        test_config(vec![channel.clone()]),
    );

    let records = f.harvester.harvest_channel(&channel).await;

    let ids: Vec<&str> = records.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v3"]);
}

#[tokio::test]
async fn checkpoints_every_batch_and_after_the_last_video() {
    let channel = ChannelIdentity::by_handle("@pol");
    let stubs: Vec<VideoStub> = (0..5).map(|i| stub(&format!("v{i}"), i)).collect();
    let f = fixture(
        FakeMetadata {
            stubs,
            ..FakeMetadata::default()
        },
        FakeTranscripts::available(),
        FakeComments::new(1, 1),
        MemoryStore::default(),
        test_config(vec![channel.clone()]),
    );

    let records = f.harvester.harvest_channel(&channel).await;

    assert_eq!(records.len(), 5);
    // Interval 2 over 5 videos: after videos 2, 4 and 5.
    assert_eq!(f.store.checkpoint_writes.load(Ordering::SeqCst), 3);
    assert_eq!(f.store.load_processed("@pol"), Some(records));
}

#[tokio::test]
async fn comment_cap_is_enforced_without_draining_the_provider() {
    let channel = ChannelIdentity::by_handle("@pol");
    // 20 comments on offer in pages of 2; cap is 5.
    let f = fixture(
        FakeMetadata {
            stubs: vec![stub("v1", 0)],
            ..FakeMetadata::default()
        },
        FakeTranscripts::available(),
        FakeComments::new(20, 2),
        MemoryStore::default(),
        test_config(vec![channel.clone()]),
    );

    let records = f.harvester.harvest_channel(&channel).await;

    assert_eq!(records[0].comments.len(), 5);
    // Three pages buffer six comments; the remaining seven pages are
    // never requested.
    assert_eq!(f.comments.page_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn missing_transcript_yields_explicit_null_field() {
    let channel = ChannelIdentity::by_handle("@pol");
    let f = fixture(
        FakeMetadata {
            stubs: vec![stub("v1", 0)],
            ..FakeMetadata::default()
        },
        FakeTranscripts::unavailable(),
        FakeComments::new(1, 1),
        MemoryStore::default(),
        test_config(vec![channel.clone()]),
    );

    let records = f.harvester.harvest_channel(&channel).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].transcript, None);

    let value = serde_json::to_value(&records[0]).unwrap();
    let object = value.as_object().unwrap();
    assert!(object.contains_key("transcript"));
    assert!(object["transcript"].is_null());
}

#[tokio::test]
async fn unresolvable_channel_is_skipped_not_fatal() {
    let ok = ChannelIdentity::by_handle("@works");
    let broken = ChannelIdentity::by_handle("@gone");
    let f = fixture(
        FakeMetadata {
            stubs: vec![stub("v1", 0)],
            failing_handles: HashSet::from(["@gone".to_string()]),
            ..FakeMetadata::default()
        },
        FakeTranscripts::available(),
        FakeComments::new(1, 1),
        MemoryStore::default(),
        test_config(vec![broken, ok]),
    );

    let records = f.harvester.harvest_all().await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].channel_handle, "@works");
}

#[tokio::test]
async fn discovery_cache_skips_the_listing_walk() {
    let channel = ChannelIdentity::by_handle("@pol");
    let store = MemoryStore::default();
    store
        .save_discovery("@pol", &[stub("cached", 0)])
        .unwrap();

    let f = fixture(
        // Listing-side stubs differ from the cached ones on purpose.
        FakeMetadata {
            stubs: vec![stub("fresh", 0)],
            ..FakeMetadata::default()
        },
        FakeTranscripts::available(),
        FakeComments::new(1, 1),
        store,
        test_config(vec![channel.clone()]),
    );

    let records = f.harvester.harvest_channel(&channel).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].video_id, "cached");
}
