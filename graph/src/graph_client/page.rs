use super::GraphClient;
use crate::common::GraphResult;
use crate::model::ODataCollection;
use crate::paging::{NextPageRequest, PageCursor};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// One page of an OData collection response.
pub struct GraphPage<T> {
    items: Vec<T>,
    next: Option<GraphNextPage<T>>,
}

/// `@odata.nextLink` of a [`GraphPage`], bound to the client that follows it.
pub struct GraphNextPage<T> {
    client: GraphClient,
    url: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> GraphPage<T> {
    pub(crate) fn from_collection(client: &GraphClient, collection: ODataCollection<T>) -> Self {
        let next = collection.next_link.map(|url| GraphNextPage {
            client: client.clone(),
            url,
            _item: PhantomData,
        });
        Self {
            items: collection.value,
            next,
        }
    }

    pub fn next_link(&self) -> Option<&str> {
        self.next.as_ref().map(|next| next.url.as_str())
    }
}

impl<T> GraphNextPage<T> {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<T> Clone for GraphNextPage<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            url: self.url.clone(),
            _item: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for GraphPage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphPage")
            .field("items", &self.items.len())
            .field("next_link", &self.next_link())
            .finish()
    }
}

impl<T> PageCursor for GraphPage<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Item = T;
    type NextPage = GraphNextPage<T>;

    fn current_page(&self) -> &[T] {
        &self.items
    }

    fn next_page_request(&self) -> Option<&GraphNextPage<T>> {
        self.next.as_ref()
    }

    fn into_current_page(self) -> Vec<T> {
        self.items
    }
}

#[async_trait]
impl<T> NextPageRequest for GraphNextPage<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Cursor = GraphPage<T>;

    async fn fetch(self) -> GraphResult<GraphPage<T>> {
        self.client.get_collection(&self.url).await
    }
}
