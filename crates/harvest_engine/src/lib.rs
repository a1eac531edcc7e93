//! Harvest engine: source adapters, pagination, durable caching, and export.
mod cache;
mod config;
mod export;
mod harvest;
mod paginate;
mod persist;
mod sources;
mod transcript;
mod types;
mod youtube;

pub use cache::{CacheError, HarvestCache, HarvestStore};
pub use config::{CommentOrder, HarvestConfig, OutputFormat};
pub use export::{export_dataset, ExportError, ExportSummary};
pub use harvest::Harvester;
pub use paginate::{collect_pages, Page, MAX_PAGE_SIZE};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use sources::{
    CommentPage, CommentSource, CommentStream, MetadataSource, TranscriptSource, UploadsPage,
};
pub use transcript::YtTranscriptFetcher;
pub use types::{
    ChannelIdentity, ChannelStats, CommentRecord, ProviderChannelInfo, SourceError, VideoMetadata,
    VideoRecord, VideoStub,
};
pub use youtube::{ApiSettings, YouTubeDataApi};
