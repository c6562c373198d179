use super::cursor::{MaxRows, NextPageRequest, PageCursor};
use crate::common::{GraphError, GraphResult};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Walks `cursor` to the end (or to `max_rows`), returning every item in
/// page order.
///
/// Pages are fetched one at a time. Once the cap is reached no further page
/// is requested, and the page in hand is truncated at the boundary item.
/// A failed fetch aborts the walk and the items gathered so far are dropped.
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::paging::{InMemoryPages, MaxRows, collect_pages};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> nimbus_graph::common::GraphResult<()> {
/// let cursor = InMemoryPages::new(vec![vec!['a', 'b', 'c'], vec!['d', 'e']]);
/// let items = collect_pages(cursor, MaxRows::AtMost(4), &CancellationToken::new()).await?;
/// assert_eq!(items, vec!['a', 'b', 'c', 'd']);
/// # Ok(())
/// # }
/// ```
pub async fn collect_pages<C>(
    cursor: C,
    max_rows: MaxRows,
    cancel: &CancellationToken,
) -> GraphResult<Vec<C::Item>>
where
    C: PageCursor,
{
    collect_matching(cursor, max_rows, cancel, Some).await
}

/// Walks `cursor`, keeping only the items `select` maps to `Some`.
///
/// `max_rows` counts kept items, not items seen.
pub async fn collect_matching<C, U, F>(
    mut cursor: C,
    max_rows: MaxRows,
    cancel: &CancellationToken,
    mut select: F,
) -> GraphResult<Vec<U>>
where
    C: PageCursor,
    U: Send,
    F: FnMut(C::Item) -> Option<U> + Send,
{
    let mut collected = Vec::new();

    if max_rows.is_reached(collected.len()) {
        return Ok(collected);
    }
    if cancel.is_cancelled() {
        return Err(GraphError::Cancelled);
    }

    let mut pages = 1usize;

    loop {
        let next = cursor.next_page_request().cloned();

        for item in cursor.into_current_page() {
            if let Some(kept) = select(item) {
                collected.push(kept);
                if max_rows.is_reached(collected.len()) {
                    log::debug!(
                        "Stopped after {} page(s): reached max rows {}",
                        pages,
                        max_rows
                    );
                    return Ok(collected);
                }
            }
        }

        let Some(request) = next else {
            break;
        };

        pages += 1;
        log::debug!(
            "Fetching page {} ({} items collected so far)",
            pages,
            collected.len()
        );
        cursor = fetch_cancellable(request, cancel).await?;
    }

    log::debug!(
        "Collection exhausted after {} page(s), {} items collected",
        pages,
        collected.len()
    );
    Ok(collected)
}

async fn fetch_cancellable<R>(request: R, cancel: &CancellationToken) -> GraphResult<R::Cursor>
where
    R: NextPageRequest,
{
    until_cancelled(request.fetch(), cancel).await
}

/// Runs `fetch` unless `cancel` fires first.
///
/// A token that is already cancelled wins without `fetch` being polled, so
/// no request goes out.
pub(crate) async fn until_cancelled<T, F>(fetch: F, cancel: &CancellationToken) -> GraphResult<T>
where
    F: Future<Output = GraphResult<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(GraphError::Cancelled),
        result = fetch => result,
    }
}
