//! # Nimbus Graph Library
//!
//! Microsoft Graph access for directory reads: bounded accumulation over
//! paginated collections and continuous access evaluation (CAE) fallback for
//! calls rejected with a claims challenge.
//!
//! ## Modules
//!
//! - [`paging`] - Page cursor abstraction and bounded accumulation
//! - [`cae`] - CAE-aware call wrapper and its outcome type
//! - [`membership`] - Group filtering over `memberOf` collections
//! - [`graph_client`] - Authenticated HTTP client and OData page cursors
//! - [`graph_service`] - User, photo, membership and group operations
//! - [`auth`] - Token providers, token cache and claims challenge handling
//! - [`model`] - Directory entities
//! - [`utils`] - Environment helpers
//! - [`common`] - Error types and rate limiting

pub mod auth;
pub mod cae;
pub mod common;
pub mod graph_client;
pub mod graph_service;
pub mod membership;
pub mod model;
pub mod paging;
pub mod utils;

pub use cae::{CaeGuard, CaeOutcome, call_with_cae_fallback};
pub use common::{GraphError, GraphResult};
pub use graph_client::{GraphClient, GraphConfig};
pub use graph_service::GraphService;
pub use paging::{MaxRows, collect_pages};
