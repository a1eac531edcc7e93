use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use harvest_logging::harvest_info;
use thiserror::Error;

use crate::config::OutputFormat;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::types::VideoRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Paths and counts of the snapshots one run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub structured_path: Option<PathBuf>,
    pub videos_path: Option<PathBuf>,
    pub comments_path: Option<PathBuf>,
    pub video_count: usize,
    pub comment_count: usize,
}

/// Flattens the harvested record set into timestamp-named snapshot files.
///
/// Pure function of `records` apart from the filenames: exporting the same
/// record set twice yields byte-identical row content. Earlier snapshots
/// are never overwritten because each run stamps its own filenames.
pub fn export_dataset(
    records: &[VideoRecord],
    output_dir: &Path,
    format: OutputFormat,
    timestamp: DateTime<Utc>,
) -> Result<ExportSummary, ExportError> {
    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());

    let mut summary = ExportSummary {
        structured_path: None,
        videos_path: None,
        comments_path: None,
        video_count: records.len(),
        comment_count: records.iter().map(|record| record.comments.len()).sum(),
    };

    if format.wants_structured() {
        let content = serde_json::to_string_pretty(records)?;
        let path = writer.write(&format!("youtube_data_{stamp}.json"), &content)?;
        harvest_info!("Saved structured snapshot to {path:?}");
        summary.structured_path = Some(path);
    }

    if format.wants_tabular() {
        let path = writer.write(&format!("youtube_data_{stamp}.csv"), &video_rows(records))?;
        harvest_info!("Saved video snapshot to {path:?}");
        summary.videos_path = Some(path);

        let path = writer.write(
            &format!("youtube_comments_{stamp}.csv"),
            &comment_rows(records),
        )?;
        harvest_info!("Saved comment snapshot to {path:?}");
        summary.comments_path = Some(path);
    }

    Ok(summary)
}

/// One row per video; comments collapse to a count, transcript inlines.
fn video_rows(records: &[VideoRecord]) -> String {
    let mut buffer = String::new();
    push_row(
        &mut buffer,
        &[
            "channel_handle",
            "channel_id",
            "video_id",
            "title",
            "description",
            "published_at",
            "duration",
            "view_count",
            "like_count",
            "comment_count",
            "transcript",
            "comments_collected",
            "processed_at",
        ],
    );
    for record in records {
        push_row(
            &mut buffer,
            &[
                &record.channel_handle,
                &record.channel_id,
                &record.video_id,
                &record.title,
                &record.description,
                &record.published_at.to_rfc3339(),
                &record.duration,
                &record.view_count.to_string(),
                &record.like_count.to_string(),
                &record.comment_count.to_string(),
                record.transcript.as_deref().unwrap_or(""),
                &record.comments.len().to_string(),
                &record.processed_at.to_rfc3339(),
            ],
        );
    }
    buffer
}

/// One row per comment, exploded across all videos.
fn comment_rows(records: &[VideoRecord]) -> String {
    let mut buffer = String::new();
    push_row(
        &mut buffer,
        &[
            "video_id",
            "channel_handle",
            "comment_id",
            "comment_text",
            "comment_published",
            "comment_author",
            "comment_author_channel",
            "comment_votes",
            "comment_replies",
        ],
    );
    for record in records {
        for comment in &record.comments {
            push_row(
                &mut buffer,
                &[
                    &record.video_id,
                    &record.channel_handle,
                    &comment.comment_id,
                    &comment.text,
                    &comment.published,
                    &comment.author,
                    &comment.author_channel,
                    &comment.votes.to_string(),
                    &comment.replies.to_string(),
                ],
            );
        }
    }
    buffer
}

fn push_row(buffer: &mut String, fields: &[&str]) {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            buffer.push(',');
        }
        push_field(buffer, field);
    }
    buffer.push('\n');
}

/// RFC 4180 quoting: only fields containing a delimiter, quote, or line
/// break are wrapped, with embedded quotes doubled.
fn push_field(buffer: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        buffer.push('"');
        for c in field.chars() {
            if c == '"' {
                buffer.push('"');
            }
            buffer.push(c);
        }
        buffer.push('"');
    } else {
        buffer.push_str(field);
    }
}
