use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::sources::TranscriptSource;
use crate::types::SourceError;

/// Transcript adapter over `yt-transcript-rs`. Joins the timed fragments
/// into one text blob; any fetch failure (no captions, disabled, region
/// blocked) reads as `Unavailable`.
pub struct YtTranscriptFetcher {
    languages: Vec<String>,
}

impl YtTranscriptFetcher {
    pub fn new(languages: Vec<String>) -> Self {
        Self { languages }
    }
}

impl Default for YtTranscriptFetcher {
    fn default() -> Self {
        Self::new(vec!["en".to_string()])
    }
}

#[async_trait::async_trait]
impl TranscriptSource for YtTranscriptFetcher {
    async fn transcript(&self, video_id: &str) -> Result<String, SourceError> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|err| SourceError::Transient(err.to_string()))?;
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        match api.fetch_transcript(video_id, &languages, false).await {
            Ok(transcript) => {
                let mut parts = Vec::new();
                for entry in transcript {
                    parts.push(entry.text);
                }
                Ok(parts.join(" "))
            }
            Err(_) => Err(SourceError::Unavailable),
        }
    }
}
