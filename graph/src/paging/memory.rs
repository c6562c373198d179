use super::cursor::{NextPageRequest, PageCursor};
use crate::common::{GraphError, GraphResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Page cursor over pages that are already in memory.
///
/// Useful for re-paging cached results and for exercising code written
/// against [`PageCursor`] without a network. Every next-page fetch is
/// counted, and a page can be configured to fail.
#[derive(Debug)]
pub struct InMemoryPages<T> {
    items: Vec<T>,
    next: Option<InMemoryNextPage<T>>,
    source: Arc<PageSource<T>>,
}

#[derive(Debug)]
pub struct InMemoryNextPage<T> {
    source: Arc<PageSource<T>>,
    index: usize,
}

#[derive(Debug)]
struct PageSource<T> {
    pages: Vec<Vec<T>>,
    fetches: Arc<AtomicUsize>,
    fail_at: Option<usize>,
}

impl<T> Clone for InMemoryNextPage<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            index: self.index,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> InMemoryPages<T> {
    /// Cursor positioned on the first of `pages`.
    pub fn new(pages: Vec<Vec<T>>) -> Self {
        Self::build(pages, None)
    }

    /// Like [`InMemoryPages::new`], but fetching the page at `page_index`
    /// fails with a 503 service error.
    pub fn failing_at(pages: Vec<Vec<T>>, page_index: usize) -> Self {
        Self::build(pages, Some(page_index))
    }

    fn build(pages: Vec<Vec<T>>, fail_at: Option<usize>) -> Self {
        let source = Arc::new(PageSource {
            pages,
            fetches: Arc::new(AtomicUsize::new(0)),
            fail_at,
        });
        Self::at(source, 0)
    }

    fn at(source: Arc<PageSource<T>>, index: usize) -> Self {
        let items = source.pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < source.pages.len()).then(|| InMemoryNextPage {
            source: source.clone(),
            index: index + 1,
        });
        Self {
            items,
            next,
            source,
        }
    }

    /// Shared counter of next-page fetches issued through this cursor chain.
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        self.source.fetches.clone()
    }
}

impl<T: Clone + Send + Sync + 'static> PageCursor for InMemoryPages<T> {
    type Item = T;
    type NextPage = InMemoryNextPage<T>;

    fn current_page(&self) -> &[T] {
        &self.items
    }

    fn next_page_request(&self) -> Option<&InMemoryNextPage<T>> {
        self.next.as_ref()
    }

    fn into_current_page(self) -> Vec<T> {
        self.items
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> NextPageRequest for InMemoryNextPage<T> {
    type Cursor = InMemoryPages<T>;

    async fn fetch(self) -> GraphResult<InMemoryPages<T>> {
        self.source.fetches.fetch_add(1, Ordering::SeqCst);

        if self.source.fail_at == Some(self.index) {
            return Err(GraphError::service(
                StatusCode::SERVICE_UNAVAILABLE,
                "serviceNotAvailable",
                format!("Page {} is unavailable", self.index),
                HeaderMap::new(),
            ));
        }

        Ok(InMemoryPages::at(self.source, self.index))
    }
}
