use crate::common::GraphResult;
use crate::model::{DirectoryObject, Group};
use crate::paging::{MaxRows, PageCursor, collect_matching};
use tokio_util::sync::CancellationToken;

/// Walks every page of a mixed directory-object collection (such as
/// `/me/memberOf`) and keeps only the groups, in server order.
///
/// A failed page fetch aborts the walk; the error is logged and returned.
pub async fn collect_groups<C>(cursor: C, cancel: &CancellationToken) -> GraphResult<Vec<Group>>
where
    C: PageCursor<Item = DirectoryObject>,
{
    match collect_matching(cursor, MaxRows::Unbounded, cancel, DirectoryObject::into_group).await
    {
        Ok(groups) => {
            log::info!("Found {} group membership(s)", groups.len());
            Ok(groups)
        }
        Err(e) => {
            log::error!("Failed to read group memberships: {e}");
            Err(e)
        }
    }
}
