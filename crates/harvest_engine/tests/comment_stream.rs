use std::sync::atomic::{AtomicUsize, Ordering};

use harvest_engine::{
    CommentOrder, CommentPage, CommentRecord, CommentSource, CommentStream, Page, SourceError,
};
use pretty_assertions::assert_eq;

fn comment(id: &str) -> CommentRecord {
    CommentRecord {
        comment_id: id.to_string(),
        text: format!("comment {id}"),
        author: "@viewer".to_string(),
        author_channel: "UCv".to_string(),
        votes: 0,
        replies: 0,
        published: "2024-01-02T00:00:00Z".to_string(),
        avatar_url: String::new(),
    }
}

/// One good page, then a transient failure on the continuation.
struct FlakySource {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl CommentSource for FlakySource {
    async fn comment_page(
        &self,
        _video_id: &str,
        _order: CommentOrder,
        page_token: Option<&str>,
    ) -> Result<CommentPage, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match page_token {
            None => Ok(Page {
                items: vec![comment("c1"), comment("c2")],
                next_page_token: Some("next".to_string()),
            }),
            Some(_) => Err(SourceError::Transient("connection reset".into())),
        }
    }
}

#[tokio::test]
async fn stream_yields_buffered_comments_then_surfaces_the_error_once() {
    let source = FlakySource {
        calls: AtomicUsize::new(0),
    };
    let mut stream = CommentStream::new(&source, "v1", CommentOrder::Relevance);

    assert_eq!(
        stream.next().await.unwrap().unwrap().comment_id,
        "c1"
    );
    assert_eq!(
        stream.next().await.unwrap().unwrap().comment_id,
        "c2"
    );
    assert_eq!(
        stream.next().await.unwrap().unwrap_err(),
        SourceError::Transient("connection reset".into())
    );
    // The failed stream is terminal; no further provider calls.
    assert!(stream.next().await.is_none());
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

/// An empty intermediate page must not end the stream early.
struct GappySource;

#[async_trait::async_trait]
impl CommentSource for GappySource {
    async fn comment_page(
        &self,
        _video_id: &str,
        _order: CommentOrder,
        page_token: Option<&str>,
    ) -> Result<CommentPage, SourceError> {
        match page_token {
            None => Ok(Page {
                items: Vec::new(),
                next_page_token: Some("more".to_string()),
            }),
            Some(_) => Ok(Page {
                items: vec![comment("c1")],
                next_page_token: None,
            }),
        }
    }
}

#[tokio::test]
async fn empty_page_with_continuation_keeps_pulling() {
    let mut stream = CommentStream::new(&GappySource, "v1", CommentOrder::Recent);

    assert_eq!(
        stream.next().await.unwrap().unwrap().comment_id,
        "c1"
    );
    assert!(stream.next().await.is_none());
}
