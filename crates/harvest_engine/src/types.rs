use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed outcome of any provider call. Adapters convert every provider
/// failure into one of these; they never surface raw transport errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The entity does not exist at the provider.
    #[error("not found at provider")]
    NotFound,
    /// The feature is disabled for this entity (e.g. no transcript,
    /// comments turned off). A valid absent value, not a failure.
    #[error("unavailable for this entity")]
    Unavailable,
    /// Network or provider hiccup. Bounded-effort callers keep whatever
    /// they collected so far.
    #[error("transient provider error: {0}")]
    Transient(String),
}

/// A channel as declared in configuration: a human-readable handle and
/// optionally the provider-assigned immutable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelIdentity {
    pub handle: String,
    pub channel_id: Option<String>,
}

impl ChannelIdentity {
    pub fn by_handle(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            channel_id: None,
        }
    }

    pub fn with_id(handle: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            channel_id: Some(channel_id.into()),
        }
    }
}

/// Resolved provider-side identity of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderChannelInfo {
    pub channel_id: String,
    /// Reference to the channel's uploads listing.
    pub uploads_playlist: String,
}

/// Aggregate channel statistics, logged for context before a harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    pub title: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
}

/// Lightweight reference produced during discovery; superseded once the
/// video is fully enriched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStub {
    pub video_id: String,
    pub title: String,
    pub position: u32,
}

/// Detailed per-video metadata from the listing provider. `duration` keeps
/// the provider's ISO-8601 form; missing counters default to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub duration: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

/// One harvested comment, in provider-returned order. Identifier
/// uniqueness is provider-guaranteed; duplicates across runs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: String,
    pub text: String,
    pub author: String,
    pub author_channel: String,
    pub votes: u64,
    pub replies: u64,
    pub published: String,
    pub avatar_url: String,
}

/// The canonical unit of harvested data. Either fully present in the
/// processed cache or fully absent; `transcript: null` is a valid terminal
/// state and serializes explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub channel_handle: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub duration: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub transcript: Option<String>,
    pub comments: Vec<CommentRecord>,
    pub processed_at: DateTime<Utc>,
}
