// src/api/pagination.rs
//! Cursor pagination without BoxFuture.

use super::responses::PaginatedResponse;
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;

/// Fetches every page of a listing, strictly one request at a time.
///
/// `fetch_page` receives the cursor (absent on the first call) and the page
/// size to request, which is the server maximum or whatever is left under
/// `cap`, if smaller. The loop ends when the server reports no more results
/// or `cap` results have been gathered. Any error aborts the whole listing
/// and drops the rows gathered so far.
pub async fn fetch_all_pages<T, F, Fut>(
    mut fetch_page: F,
    cap: Option<usize>,
) -> Result<Vec<T>, AppError>
where
    F: FnMut(Option<String>, usize) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let remaining = cap.map(|cap| cap.saturating_sub(items.len()));
        if remaining == Some(0) {
            log::debug!("Reached result cap after {} pages", pages_fetched);
            break;
        }
        let page_size = remaining.map_or(NOTION_API_PAGE_SIZE, |r| r.min(NOTION_API_PAGE_SIZE));

        let response = fetch_page(cursor.take(), page_size).await?;
        pages_fetched += 1;
        log::debug!(
            "Page {}: {} results, has_more={}",
            pages_fetched,
            response.results.len(),
            response.has_more
        );

        items.extend(response.results);

        if !response.has_more {
            break;
        }
        match response.next_cursor {
            Some(next) => cursor = Some(next),
            None => {
                log::warn!("Server reported has_more without a next_cursor; stopping");
                break;
            }
        }
    }

    if let Some(cap) = cap {
        items.truncate(cap);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NotionApiError, NotionErrorCode};
    use std::cell::RefCell;

    fn page(results: Vec<u32>, next: Option<&str>) -> PaginatedResponse<u32> {
        PaginatedResponse {
            object: "list".into(),
            results,
            next_cursor: next.map(str::to_string),
            has_more: next.is_some(),
        }
    }

    #[tokio::test]
    async fn follows_cursors_until_exhausted() {
        let calls = RefCell::new(Vec::new());
        let items = fetch_all_pages(
            |cursor, size| {
                calls.borrow_mut().push((cursor.clone(), size));
                let response = match cursor.as_deref() {
                    None => page(vec![1, 2], Some("c1")),
                    Some("c1") => page(vec![3], Some("c2")),
                    _ => page(vec![4], None),
                };
                async move { Ok(response) }
            },
            None,
        )
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(
            calls.into_inner(),
            vec![
                (None, 100),
                (Some("c1".to_string()), 100),
                (Some("c2".to_string()), 100)
            ]
        );
    }

    #[tokio::test]
    async fn cap_shrinks_last_page_and_truncates() {
        let sizes = RefCell::new(Vec::new());
        let items = fetch_all_pages(
            |_cursor, size| {
                sizes.borrow_mut().push(size);
                let response = page((0..size as u32).collect(), Some("more"));
                async move { Ok(response) }
            },
            Some(150),
        )
        .await
        .unwrap();

        assert_eq!(items.len(), 150);
        assert_eq!(sizes.into_inner(), vec![100, 50]);
    }

    #[tokio::test]
    async fn error_discards_partial_results() {
        let result: Result<Vec<u32>, _> = fetch_all_pages(
            |cursor, _| {
                let outcome = match cursor {
                    None => Ok(page(vec![1, 2, 3], Some("c1"))),
                    Some(_) => Err(AppError::from(NotionApiError {
                        status: 503,
                        code: NotionErrorCode::ServiceUnavailable,
                        message: "try later".into(),
                        request_id: None,
                    })),
                };
                async move { outcome }
            },
            None,
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.as_api_error().is_some_and(|e| e.is_retryable()));
    }
}
