//! High-level Graph operations for the signed-in user and the directory.

use crate::auth::ChallengeHandler;
use crate::cae::{CaeGuard, CaeOutcome};
use crate::common::{GraphError, GraphResult};
use crate::graph_client::{CollectionQuery, DEFAULT_MAX_ROWS, GraphClient};
use crate::membership::collect_groups;
use crate::model::{DirectoryObject, Group, User};
use crate::paging::accumulator::until_cancelled;
use crate::paging::{MaxRows, PageCursor, collect_pages};
use reqwest::StatusCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const USER_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "userPrincipalName",
    "mail",
    "jobTitle",
    "givenName",
    "surname",
];

const GROUP_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "description",
    "groupTypes",
    "mail",
    "visibility",
    "mailEnabled",
    "securityEnabled",
];

const GROUP_READ_HINT: &str = "Ensure the Group.Read.All permission is granted";

/// Graph operations guarded by CAE challenge handling.
///
/// Only the first request of an operation goes through the challenge guard;
/// follow-up page fetches run unguarded and their failures are returned.
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::auth::{AuthStateManager, ReauthenticationHandler, StaticTokenProvider};
/// use nimbus_graph::graph_client::{GraphClient, GraphConfig};
/// use nimbus_graph::graph_service::GraphService;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> nimbus_graph::common::GraphResult<()> {
/// let auth_state = Arc::new(AuthStateManager::new());
/// let client = GraphClient::new(&GraphConfig::default(), Arc::new(StaticTokenProvider::new("...")))?;
/// let service = GraphService::new(
///     client,
///     Arc::new(ReauthenticationHandler::new(auth_state)),
///     vec!["User.Read".to_string()],
/// );
///
/// let groups = service.get_member_of(&CancellationToken::new()).await?.unwrap_or_default();
/// # Ok(())
/// # }
/// ```
pub struct GraphService {
    client: GraphClient,
    cae: CaeGuard,
    max_rows: MaxRows,
}

impl GraphService {
    pub fn new(
        client: GraphClient,
        challenge_handler: Arc<dyn ChallengeHandler>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client,
            cae: CaeGuard::new(challenge_handler, scopes),
            max_rows: MaxRows::AtMost(DEFAULT_MAX_ROWS),
        }
    }

    /// Row cap used by [`GraphService::get_users`].
    pub fn with_max_rows(mut self, max_rows: MaxRows) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Profile of the signed-in user (`/me`).
    pub async fn get_me(&self) -> GraphResult<CaeOutcome<User>> {
        self.cae.call(|| self.client.get_json::<User>("/me")).await
    }

    /// Raw bytes of the signed-in user's photo, `None` when no photo is set.
    pub async fn get_my_photo(&self) -> GraphResult<CaeOutcome<Option<Vec<u8>>>> {
        self.cae
            .call(|| async {
                match self.client.get_bytes("/me/photo/$value").await {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) if e.code() == Some("ImageNotFound") || e.is_not_found() => {
                        log::info!("Signed-in user has no profile photo");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
    }

    /// Groups the signed-in user is a direct member of.
    ///
    /// Directory roles and other object types in `/me/memberOf` are skipped.
    pub async fn get_member_of(
        &self,
        cancel: &CancellationToken,
    ) -> GraphResult<CaeOutcome<Vec<Group>>> {
        let first_page = self
            .cae
            .call(|| {
                until_cancelled(
                    self.client
                        .get_collection::<DirectoryObject>("/me/memberOf"),
                    cancel,
                )
            })
            .await?;

        match first_page {
            CaeOutcome::Completed(page) => collect_groups(page, cancel)
                .await
                .map(CaeOutcome::Completed),
            CaeOutcome::ChallengeIssued => Ok(CaeOutcome::ChallengeIssued),
            CaeOutcome::ChallengeFailed => Ok(CaeOutcome::ChallengeFailed),
        }
    }

    /// Users of the directory, capped at the row limit set with
    /// [`GraphService::with_max_rows`].
    pub async fn get_users(&self, cancel: &CancellationToken) -> GraphResult<CaeOutcome<Vec<User>>> {
        self.get_users_up_to(self.max_rows, cancel).await
    }

    /// Users of the directory, capped at `max_rows`.
    pub async fn get_users_up_to(
        &self,
        max_rows: MaxRows,
        cancel: &CancellationToken,
    ) -> GraphResult<CaeOutcome<Vec<User>>> {
        let path = CollectionQuery::new("/users").select(USER_FIELDS).to_path();
        let first_page = self
            .cae
            .call(|| until_cancelled(self.client.get_collection::<User>(&path), cancel))
            .await?;

        match first_page {
            CaeOutcome::Completed(page) => {
                let users = collect_pages(page, max_rows, cancel).await?;
                log::info!("Retrieved {} user(s) (max rows {max_rows})", users.len());
                Ok(CaeOutcome::Completed(users))
            }
            CaeOutcome::ChallengeIssued => Ok(CaeOutcome::ChallengeIssued),
            CaeOutcome::ChallengeFailed => Ok(CaeOutcome::ChallengeFailed),
        }
    }

    /// Every group in the organization, ordered by display name.
    ///
    /// # Errors
    ///
    /// [`GraphError::InsufficientPermissions`] when the caller may not read
    /// groups; other failures are returned unchanged.
    pub async fn list_groups(&self, cancel: &CancellationToken) -> GraphResult<Vec<Group>> {
        log::info!("Retrieving groups from Microsoft Graph");
        let path = CollectionQuery::new("/groups")
            .select(GROUP_FIELDS)
            .order_by("displayName")
            .to_path();

        let first_page = until_cancelled(self.client.get_collection::<Group>(&path), cancel).await;
        let result = match first_page {
            Ok(page) => {
                log::debug!("First groups page has {} item(s)", page.current_page().len());
                collect_pages(page, MaxRows::Unbounded, cancel).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(groups) => {
                log::info!("Successfully retrieved {} groups", groups.len());
                Ok(groups)
            }
            Err(e) => {
                log::error!("Error retrieving groups from Microsoft Graph: {e}");
                Err(permission_error(e))
            }
        }
    }
}

fn permission_error(error: GraphError) -> GraphError {
    match error {
        GraphError::Service {
            status,
            code,
            message,
            ..
        } if status == StatusCode::FORBIDDEN
            || matches!(
                code.as_str(),
                "Forbidden" | "InsufficientPermissions" | "Authorization_RequestDenied"
            ) =>
        {
            GraphError::InsufficientPermissions {
                message,
                hint: GROUP_READ_HINT.to_string(),
            }
        }
        other => other,
    }
}
