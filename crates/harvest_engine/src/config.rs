use std::path::PathBuf;
use std::time::Duration;

use crate::types::ChannelIdentity;

/// Which snapshot formats a run exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One nested JSON snapshot.
    Structured,
    /// Video-level and comment-level CSV snapshots.
    Tabular,
    Both,
}

impl OutputFormat {
    pub fn wants_structured(self) -> bool {
        matches!(self, OutputFormat::Structured | OutputFormat::Both)
    }

    pub fn wants_tabular(self) -> bool {
        matches!(self, OutputFormat::Tabular | OutputFormat::Both)
    }
}

/// Provider-side ordering of the comment stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOrder {
    Relevance,
    Recent,
}

impl CommentOrder {
    /// Query parameter value understood by the comment provider.
    pub fn as_param(self) -> &'static str {
        match self {
            CommentOrder::Relevance => "relevance",
            CommentOrder::Recent => "time",
        }
    }
}

/// Run configuration, passed explicitly into the orchestrator.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Channels to harvest, in run order.
    pub channels: Vec<ChannelIdentity>,
    pub max_videos_per_channel: usize,
    pub max_comments_per_video: usize,
    pub output_format: OutputFormat,
    /// Pacing between videos; a scheduling policy, not a correctness
    /// mechanism.
    pub video_delay: Duration,
    /// Pacing between individual comment pulls.
    pub comment_delay: Duration,
    pub comment_order: CommentOrder,
    /// Records per checkpoint write to the processed cache.
    pub checkpoint_interval: usize,
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            max_videos_per_channel: 4000,
            max_comments_per_video: 200,
            output_format: OutputFormat::Both,
            video_delay: Duration::from_millis(500),
            comment_delay: Duration::ZERO,
            comment_order: CommentOrder::Relevance,
            checkpoint_interval: 50,
            output_dir: PathBuf::from("data"),
            cache_dir: PathBuf::from("cache"),
            log_file: PathBuf::from("harvest.log"),
        }
    }
}
