pub mod errors;
pub mod rate_limiter;

pub use errors::{CAE_CLAIMS_CHALLENGE_MESSAGE, GraphError, GraphResult, TokenRefreshError};
pub use rate_limiter::{RateLimitError, RateLimiter, RateLimiterConfig};
