pub mod auth_state;
pub mod azure_ad;
pub mod challenge;
pub mod provider;
pub mod token_cache;
pub mod types;

pub use auth_state::{AuthStateManager, AuthenticationState};
pub use azure_ad::{AzureAdProvider, DeviceCodeFlowInfo, DeviceCodePrompt};
pub use challenge::{ChallengeHandler, ReauthenticationHandler, claims_challenge_from_headers};
pub use provider::{AuthProvider, AuthToken, StaticTokenProvider};
pub use token_cache::{CachingAuthProvider, TokenCache};
pub use types::{AuthType, AzureAdAuthConfig, AzureAdFlowType, CachedToken, DeviceCodeInfo};
