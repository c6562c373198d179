use crate::common::GraphResult;
use async_trait::async_trait;
use serde::Deserialize;

/// One page of a server-paginated collection plus the means to fetch the
/// next page.
///
/// The cursor owns the items of its page. Advancing never mutates the
/// current cursor; it produces a new one from the [`NextPageRequest`].
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::paging::{InMemoryPages, PageCursor};
///
/// # async fn example() -> nimbus_graph::common::GraphResult<()> {
/// let cursor = InMemoryPages::new(vec![vec![1, 2], vec![3]]);
/// assert_eq!(cursor.current_page(), &[1, 2]);
/// assert!(cursor.has_next_page());
///
/// let next = cursor.fetch_next_page().await?.expect("second page");
/// assert_eq!(next.current_page(), &[3]);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait PageCursor: Sized + Send + Sync {
    type Item: Send;
    type NextPage: NextPageRequest<Cursor = Self>;

    /// Items of the page this cursor points at, in server order.
    fn current_page(&self) -> &[Self::Item];

    /// Continuation for the following page, `None` once exhausted.
    fn next_page_request(&self) -> Option<&Self::NextPage>;

    /// Consumes the cursor, yielding the items of its page.
    fn into_current_page(self) -> Vec<Self::Item>;

    fn has_next_page(&self) -> bool {
        self.next_page_request().is_some()
    }

    /// Fetches the following page, or returns `None` when exhausted.
    async fn fetch_next_page(&self) -> GraphResult<Option<Self>> {
        match self.next_page_request() {
            Some(request) => request.clone().fetch().await.map(Some),
            None => Ok(None),
        }
    }
}

/// Continuation handle produced by a [`PageCursor`] (an OData next link,
/// for instance).
#[async_trait]
pub trait NextPageRequest: Clone + Send + Sync {
    type Cursor: PageCursor<NextPage = Self>;

    async fn fetch(self) -> GraphResult<Self::Cursor>;
}

/// Cap on the number of items accumulated across all pages.
///
/// Deserializes from an integer where any negative value (conventionally
/// `-1`) means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "i64")]
pub enum MaxRows {
    #[default]
    Unbounded,
    AtMost(usize),
}

impl MaxRows {
    /// Legacy sentinel for "no limit".
    pub const UNBOUNDED_SENTINEL: i64 = -1;

    /// Whether `collected` items already satisfy the cap.
    pub fn is_reached(&self, collected: usize) -> bool {
        match self {
            MaxRows::Unbounded => false,
            MaxRows::AtMost(max) => collected >= *max,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            MaxRows::Unbounded => None,
            MaxRows::AtMost(max) => Some(*max),
        }
    }
}

impl From<i64> for MaxRows {
    fn from(value: i64) -> Self {
        if value < 0 {
            MaxRows::Unbounded
        } else {
            MaxRows::AtMost(usize::try_from(value).unwrap_or(usize::MAX))
        }
    }
}

impl From<Option<usize>> for MaxRows {
    fn from(value: Option<usize>) -> Self {
        value.map_or(MaxRows::Unbounded, MaxRows::AtMost)
    }
}

impl std::fmt::Display for MaxRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxRows::Unbounded => write!(f, "unbounded"),
            MaxRows::AtMost(max) => write!(f, "{max}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_conversion() {
        assert_eq!(MaxRows::from(MaxRows::UNBOUNDED_SENTINEL), MaxRows::Unbounded);
        assert_eq!(MaxRows::from(-42), MaxRows::Unbounded);
        assert_eq!(MaxRows::from(0), MaxRows::AtMost(0));
        assert_eq!(MaxRows::from(50), MaxRows::AtMost(50));
    }

    #[test]
    fn test_is_reached() {
        assert!(!MaxRows::Unbounded.is_reached(usize::MAX));
        assert!(MaxRows::AtMost(0).is_reached(0));
        assert!(!MaxRows::AtMost(3).is_reached(2));
        assert!(MaxRows::AtMost(3).is_reached(3));
    }

    #[test]
    fn test_deserialize_from_integer() {
        #[derive(Deserialize)]
        struct Settings {
            max_rows: MaxRows,
        }

        let unbounded: Settings = serde_json::from_str(r#"{"max_rows": -1}"#).unwrap();
        assert_eq!(unbounded.max_rows, MaxRows::Unbounded);

        let bounded: Settings = serde_json::from_str(r#"{"max_rows": 50}"#).unwrap();
        assert_eq!(bounded.max_rows, MaxRows::AtMost(50));
    }
}
