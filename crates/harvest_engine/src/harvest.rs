use std::sync::Arc;

use chrono::Utc;
use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};

use crate::cache::HarvestStore;
use crate::config::HarvestConfig;
use crate::paginate::collect_pages;
use crate::sources::{CommentSource, CommentStream, MetadataSource, TranscriptSource};
use crate::types::{
    ChannelIdentity, CommentRecord, ProviderChannelInfo, SourceError, VideoRecord, VideoStub,
};

/// Per-channel harvest orchestrator.
///
/// Channels are processed one at a time, videos within a channel one at a
/// time. No error below the run level is fatal: a channel that cannot be
/// resolved is skipped, a video whose metadata fetch fails becomes a gap,
/// and partial results are always checkpointed and returned.
pub struct Harvester {
    metadata: Arc<dyn MetadataSource>,
    transcripts: Arc<dyn TranscriptSource>,
    comments: Arc<dyn CommentSource>,
    store: Arc<dyn HarvestStore>,
    config: HarvestConfig,
}

impl Harvester {
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        transcripts: Arc<dyn TranscriptSource>,
        comments: Arc<dyn CommentSource>,
        store: Arc<dyn HarvestStore>,
        config: HarvestConfig,
    ) -> Self {
        Self {
            metadata,
            transcripts,
            comments,
            store,
            config,
        }
    }

    /// Harvests every configured channel in order and concatenates the
    /// results.
    pub async fn harvest_all(&self) -> Vec<VideoRecord> {
        let total = self.config.channels.len();
        let mut all_records = Vec::new();

        for (index, channel) in self.config.channels.iter().enumerate() {
            harvest_info!(
                "Processing channel {}/{total}: {}",
                index + 1,
                channel.handle
            );
            all_records.extend(self.harvest_channel(channel).await);
        }

        all_records
    }

    /// Runs the per-channel state machine: processed-cache short-circuit,
    /// identity resolution, discovery, enrichment, periodic checkpoints.
    pub async fn harvest_channel(&self, channel: &ChannelIdentity) -> Vec<VideoRecord> {
        // A whole-channel processed entry means this channel is done and
        // costs zero provider calls.
        if let Some(records) = self.store.load_processed(&channel.handle) {
            harvest_info!(
                "Loaded {} processed records from cache for {}",
                records.len(),
                channel.handle
            );
            return records;
        }

        let info = match self.metadata.resolve(channel).await {
            Ok(info) => info,
            Err(err) => {
                harvest_error!(
                    "Could not resolve uploads listing for {}: {err}",
                    channel.handle
                );
                return Vec::new();
            }
        };

        match self.metadata.channel_stats(&info.channel_id).await {
            Ok(stats) => harvest_info!(
                "Channel {} ({}): {} videos, {} subscribers",
                channel.handle,
                stats.title,
                stats.video_count,
                stats.subscriber_count
            ),
            Err(err) => harvest_debug!("No channel stats for {}: {err}", channel.handle),
        }

        let stubs = self.discover(channel, &info).await;
        let stub_count = stubs.len();
        // Interval 0 would checkpoint never and divide by zero; clamp.
        let checkpoint_interval = self.config.checkpoint_interval.max(1);
        let mut records = Vec::new();

        for (index, stub) in stubs.iter().enumerate() {
            harvest_info!(
                "Processing video {}/{stub_count}: {}",
                index + 1,
                stub.video_id
            );
            if let Some(record) = self.enrich(channel, &info, stub).await {
                records.push(record);
            }

            let processed = index + 1;
            if processed % checkpoint_interval == 0 || processed == stub_count {
                self.checkpoint(channel, &records);
            }

            if processed < stub_count && !self.config.video_delay.is_zero() {
                tokio::time::sleep(self.config.video_delay).await;
            }
        }

        records
    }

    /// Obtains the stub list, preferring the discovery cache over a fresh
    /// pagination walk.
    async fn discover(
        &self,
        channel: &ChannelIdentity,
        info: &ProviderChannelInfo,
    ) -> Vec<VideoStub> {
        if let Some(stubs) = self.store.load_discovery(&channel.handle) {
            harvest_info!(
                "Loaded {} video stubs from cache for {}",
                stubs.len(),
                channel.handle
            );
            return stubs;
        }

        harvest_info!("Fetching upload listing from provider for {}", channel.handle);
        let metadata = Arc::clone(&self.metadata);
        let uploads_ref = info.uploads_playlist.clone();
        let stubs = collect_pages(
            move |token, page_size| {
                let metadata = Arc::clone(&metadata);
                let uploads_ref = uploads_ref.clone();
                async move {
                    metadata
                        .uploads_page(&uploads_ref, token.as_deref(), page_size)
                        .await
                }
            },
            self.config.max_videos_per_channel,
        )
        .await;

        if let Err(err) = self.store.save_discovery(&channel.handle, &stubs) {
            harvest_warn!("Failed to cache upload listing for {}: {err}", channel.handle);
        }
        stubs
    }

    /// Assembles one [`VideoRecord`] from the three sources. Returns `None`
    /// when the metadata fetch fails; the video is then a gap, not a run
    /// failure. A missing transcript is a valid absent value.
    async fn enrich(
        &self,
        channel: &ChannelIdentity,
        info: &ProviderChannelInfo,
        stub: &VideoStub,
    ) -> Option<VideoRecord> {
        let details = match self.metadata.video_details(&stub.video_id).await {
            Ok(details) => details,
            Err(err) => {
                harvest_warn!(
                    "Skipping video {} for {}: {err}",
                    stub.video_id,
                    channel.handle
                );
                return None;
            }
        };

        let transcript = match self.transcripts.transcript(&stub.video_id).await {
            Ok(text) => Some(text),
            Err(SourceError::Unavailable) => {
                harvest_debug!("No transcript for {}", stub.video_id);
                None
            }
            Err(err) => {
                harvest_warn!("Could not get transcript for {}: {err}", stub.video_id);
                None
            }
        };

        let comments = self.collect_comments(&stub.video_id).await;
        harvest_info!("Collected {} comments for {}", comments.len(), stub.video_id);

        // The listing occasionally omits the owner on unlisted re-uploads;
        // fall back to the resolved channel id.
        let channel_id = if details.channel_id.is_empty() {
            info.channel_id.clone()
        } else {
            details.channel_id
        };

        Some(VideoRecord {
            video_id: stub.video_id.clone(),
            channel_handle: channel.handle.clone(),
            channel_id,
            title: details.title,
            description: details.description,
            published_at: details.published_at,
            duration: details.duration,
            view_count: details.view_count,
            like_count: details.like_count,
            comment_count: details.comment_count,
            transcript,
            comments,
            processed_at: Utc::now(),
        })
    }

    /// Pulls the lazy comment stream up to the configured cap, then stops
    /// without draining the provider. A stream error keeps the comments
    /// collected so far.
    async fn collect_comments(&self, video_id: &str) -> Vec<CommentRecord> {
        let mut stream =
            CommentStream::new(self.comments.as_ref(), video_id, self.config.comment_order);
        let mut collected = Vec::new();

        while collected.len() < self.config.max_comments_per_video {
            match stream.next().await {
                Some(Ok(comment)) => {
                    collected.push(comment);
                    if !self.config.comment_delay.is_zero() {
                        tokio::time::sleep(self.config.comment_delay).await;
                    }
                }
                Some(Err(SourceError::Unavailable)) => {
                    harvest_debug!("Comments unavailable for {video_id}");
                    break;
                }
                Some(Err(err)) => {
                    harvest_warn!("Comment stream for {video_id} stopped early: {err}");
                    break;
                }
                None => break,
            }
        }

        collected
    }

    fn checkpoint(&self, channel: &ChannelIdentity, records: &[VideoRecord]) {
        match self.store.checkpoint_processed(&channel.handle, records) {
            Ok(()) => harvest_info!(
                "Checkpointed {} records for {}",
                records.len(),
                channel.handle
            ),
            Err(err) => harvest_warn!(
                "Failed to checkpoint {} records for {}: {err}",
                records.len(),
                channel.handle
            ),
        }
    }
}
