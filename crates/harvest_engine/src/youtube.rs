use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::CommentOrder;
use crate::paginate::Page;
use crate::sources::{CommentPage, CommentSource, MetadataSource, UploadsPage};
use crate::types::{
    ChannelIdentity, ChannelStats, CommentRecord, ProviderChannelInfo, SourceError, VideoMetadata,
    VideoStub,
};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Point the adapter at a different endpoint, used by tests to run
    /// against a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Data API adapter covering channel resolution, upload listings, video
/// details, and the comment stream.
#[derive(Debug, Clone)]
pub struct YouTubeDataApi {
    client: reqwest::Client,
    settings: ApiSettings,
}

impl YouTubeDataApi {
    pub fn new(settings: ApiSettings) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SourceError::Transient(err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!(
            "{}/{resource}",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let response = self
            .client
            .get(self.endpoint(resource))
            .query(&[("key", self.settings.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound);
        }
        // The provider answers 403 when a feature is disabled for the
        // entity (e.g. comments turned off).
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::Unavailable);
        }
        if !status.is_success() {
            return Err(SourceError::Transient(format!("http status {status}")));
        }

        response.json::<T>().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        return SourceError::Transient("timeout".to_string());
    }
    SourceError::Transient(err.to_string())
}

/// The provider serializes counters as JSON strings; absent counters
/// (e.g. hidden like counts) read as zero.
fn count_or_zero(raw: Option<String>) -> u64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(0)
}

#[async_trait::async_trait]
impl MetadataSource for YouTubeDataApi {
    async fn resolve(
        &self,
        channel: &ChannelIdentity,
    ) -> Result<ProviderChannelInfo, SourceError> {
        let query: [(&str, &str); 2] = match channel.channel_id.as_deref() {
            Some(id) => [("part", "contentDetails"), ("id", id)],
            None => [("part", "contentDetails"), ("forHandle", &channel.handle)],
        };
        let response: ChannelListResponse = self.get_json("channels", &query).await?;

        let item = response.items.into_iter().next().ok_or(SourceError::NotFound)?;
        let uploads = item
            .content_details
            .and_then(|details| details.related_playlists)
            .map(|playlists| playlists.uploads)
            .ok_or(SourceError::NotFound)?;

        Ok(ProviderChannelInfo {
            channel_id: item.id,
            uploads_playlist: uploads,
        })
    }

    async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, SourceError> {
        let response: ChannelListResponse = self
            .get_json("channels", &[("part", "statistics,snippet"), ("id", channel_id)])
            .await?;

        let item = response.items.into_iter().next().ok_or(SourceError::NotFound)?;
        let snippet = item.snippet.unwrap_or_default();
        let statistics = item.statistics.unwrap_or_default();

        Ok(ChannelStats {
            title: snippet.title,
            subscriber_count: count_or_zero(statistics.subscriber_count),
            video_count: count_or_zero(statistics.video_count),
            view_count: count_or_zero(statistics.view_count),
        })
    }

    async fn uploads_page(
        &self,
        uploads_ref: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<UploadsPage, SourceError> {
        let max_results = page_size.to_string();
        let mut query = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", uploads_ref),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let response: PlaylistItemsResponse = self.get_json("playlistItems", &query).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| VideoStub {
                video_id: item.content_details.video_id,
                title: item.snippet.title,
                position: item.snippet.position,
            })
            .collect();

        Ok(Page {
            items,
            next_page_token: response.next_page_token,
        })
    }

    async fn video_details(&self, video_id: &str) -> Result<VideoMetadata, SourceError> {
        let response: VideoListResponse = self
            .get_json(
                "videos",
                &[("part", "snippet,statistics,contentDetails"), ("id", video_id)],
            )
            .await?;

        let item = response.items.into_iter().next().ok_or(SourceError::NotFound)?;

        Ok(VideoMetadata {
            channel_id: item.snippet.channel_id,
            title: item.snippet.title,
            description: item.snippet.description,
            published_at: item.snippet.published_at,
            duration: item.content_details.duration,
            view_count: count_or_zero(item.statistics.view_count),
            like_count: count_or_zero(item.statistics.like_count),
            comment_count: count_or_zero(item.statistics.comment_count),
        })
    }
}

#[async_trait::async_trait]
impl CommentSource for YouTubeDataApi {
    async fn comment_page(
        &self,
        video_id: &str,
        order: CommentOrder,
        page_token: Option<&str>,
    ) -> Result<CommentPage, SourceError> {
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("order", order.as_param()),
            ("textFormat", "plainText"),
            ("maxResults", "50"),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let response: CommentThreadsResponse = self.get_json("commentThreads", &query).await?;

        let items = response
            .items
            .into_iter()
            .map(|thread| {
                let comment = thread.snippet.top_level_comment;
                let snippet = comment.snippet;
                CommentRecord {
                    comment_id: comment.id,
                    text: snippet.text_display,
                    author: snippet.author_display_name,
                    author_channel: snippet
                        .author_channel_id
                        .map(|id| id.value)
                        .unwrap_or_default(),
                    votes: snippet.like_count,
                    replies: thread.snippet.total_reply_count,
                    published: snippet.published_at,
                    avatar_url: snippet.author_profile_image_url,
                }
            })
            .collect();

        Ok(Page {
            items,
            next_page_token: response.next_page_token,
        })
    }
}

// Wire shapes, private to this adapter.

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    #[serde(rename = "contentDetails")]
    content_details: Option<ChannelContentDetails>,
    snippet: Option<ChannelSnippet>,
    statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists")]
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    position: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: VideoSnippet,
    content_details: VideoContentDetails,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    channel_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
    #[serde(default)]
    total_reply_count: u64,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    id: String,
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    author_display_name: String,
    author_channel_id: Option<AuthorChannelId>,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    author_profile_image_url: String,
}

#[derive(Debug, Deserialize)]
struct AuthorChannelId {
    value: String,
}
