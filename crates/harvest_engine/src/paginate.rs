use std::future::Future;

use harvest_logging::harvest_warn;

use crate::types::SourceError;

/// Largest page the listing provider serves per request.
pub const MAX_PAGE_SIZE: u32 = 50;

/// One page of a provider listing plus its continuation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Walks a paged listing until `target_count` items are collected or the
/// provider reports no further pages.
///
/// `fetch_page` is called with the continuation token of the previous page
/// (`None` for the first) and a page size capped at [`MAX_PAGE_SIZE`]. A
/// failed page fetch ends the walk with the items collected so far rather
/// than retrying; callers that need more must re-invoke. Items keep
/// provider emission order and are not deduplicated.
pub async fn collect_pages<T, F, Fut>(mut fetch_page: F, target_count: usize) -> Vec<T>
where
    F: FnMut(Option<String>, u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, SourceError>>,
{
    let mut items: Vec<T> = Vec::new();
    let mut page_token: Option<String> = None;

    while items.len() < target_count {
        let remaining = target_count - items.len();
        let page_size = remaining.min(MAX_PAGE_SIZE as usize) as u32;

        let page = match fetch_page(page_token.take(), page_size).await {
            Ok(page) => page,
            Err(err) => {
                harvest_warn!(
                    "Page fetch failed after {} items, keeping partial listing: {err}",
                    items.len()
                );
                break;
            }
        };

        items.extend(page.items);
        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    // A provider may hand back more than asked for on the final page.
    items.truncate(target_count);
    items
}
