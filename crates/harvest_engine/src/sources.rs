use std::collections::VecDeque;

use crate::config::CommentOrder;
use crate::paginate::Page;
use crate::types::{
    ChannelIdentity, ChannelStats, CommentRecord, ProviderChannelInfo, SourceError, VideoMetadata,
    VideoStub,
};

pub type UploadsPage = Page<VideoStub>;
pub type CommentPage = Page<CommentRecord>;

/// Channel and video metadata provider. Network only; no local persistence.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Resolve a configured channel to its provider identity, by handle or
    /// by explicit id when one is configured.
    async fn resolve(&self, channel: &ChannelIdentity)
        -> Result<ProviderChannelInfo, SourceError>;

    /// Aggregate statistics for a resolved channel.
    async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, SourceError>;

    /// One page of the channel's uploads listing.
    async fn uploads_page(
        &self,
        uploads_ref: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<UploadsPage, SourceError>;

    /// Detailed metadata for a single video.
    async fn video_details(&self, video_id: &str) -> Result<VideoMetadata, SourceError>;
}

/// Transcript provider. `Err(SourceError::Unavailable)` is the normal
/// outcome for a video without a transcript.
#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn transcript(&self, video_id: &str) -> Result<String, SourceError>;
}

/// Paged comment provider backing [`CommentStream`].
#[async_trait::async_trait]
pub trait CommentSource: Send + Sync {
    async fn comment_page(
        &self,
        video_id: &str,
        order: CommentOrder,
        page_token: Option<&str>,
    ) -> Result<CommentPage, SourceError>;
}

/// Lazy pull over a video's comments.
///
/// Pages are fetched only when the buffered comments run out, so a consumer
/// that stops pulling at its cap never touches the remaining pages, and
/// dropping the stream releases the source without draining it.
pub struct CommentStream<'a> {
    source: &'a dyn CommentSource,
    video_id: &'a str,
    order: CommentOrder,
    buffered: VecDeque<CommentRecord>,
    next_page_token: Option<String>,
    exhausted: bool,
}

impl<'a> CommentStream<'a> {
    pub fn new(source: &'a dyn CommentSource, video_id: &'a str, order: CommentOrder) -> Self {
        Self {
            source,
            video_id,
            order,
            buffered: VecDeque::new(),
            next_page_token: None,
            exhausted: false,
        }
    }

    /// Next comment in provider order, or `None` once the provider is
    /// exhausted. A provider error ends the stream after being yielded.
    pub async fn next(&mut self) -> Option<Result<CommentRecord, SourceError>> {
        loop {
            if let Some(comment) = self.buffered.pop_front() {
                return Some(Ok(comment));
            }
            if self.exhausted {
                return None;
            }

            let token = self.next_page_token.take();
            match self
                .source
                .comment_page(self.video_id, self.order, token.as_deref())
                .await
            {
                Ok(page) => {
                    self.buffered.extend(page.items);
                    match page.next_page_token {
                        Some(next) => self.next_page_token = Some(next),
                        None => self.exhausted = true,
                    }
                }
                Err(err) => {
                    self.exhausted = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
