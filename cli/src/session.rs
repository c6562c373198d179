use crate::config::AppConfig;
use crate::error::AppResult;
use nimbus_graph::GraphService;
use nimbus_graph::auth::{
    AuthProvider, AuthStateManager, AuthType, AzureAdProvider, CachingAuthProvider, DeviceCodeInfo,
    DeviceCodePrompt, ReauthenticationHandler, StaticTokenProvider,
};
use nimbus_graph::graph_client::GraphClient;
use std::sync::Arc;

/// Prints device code instructions on stderr and optionally opens the
/// verification page.
pub struct ConsolePrompt {
    open_browser: bool,
}

impl ConsolePrompt {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl DeviceCodePrompt for ConsolePrompt {
    fn show(&self, info: &DeviceCodeInfo) {
        eprintln!("{}", info.message);
        if self.open_browser {
            if let Err(e) = open::that(&info.verification_uri) {
                log::warn!("Failed to open browser for device code sign-in: {e}");
            }
        }
    }
}

/// Everything one CLI invocation needs to talk to Graph.
pub struct Session {
    pub service: GraphService,
    /// How tokens are obtained; a static token cannot answer a claims
    /// challenge.
    pub auth_type: AuthType,
}

/// Wires the token provider, Graph client, and challenge handler from
/// configuration. `token` short-circuits Entra ID sign-in.
pub fn build_session(config: &AppConfig, token: Option<String>) -> AppResult<Session> {
    let auth_state = Arc::new(AuthStateManager::new());
    let scopes = config.graph().scopes.clone();

    let provider: Arc<dyn AuthProvider> = match token {
        Some(token) => {
            log::info!("Using token supplied on the command line");
            Arc::new(StaticTokenProvider::new(token))
        }
        None => {
            let azure_ad = config.azure_ad();
            log::info!("Using Azure AD {:?} flow", azure_ad.auth_method);
            let provider = AzureAdProvider::new(azure_ad.clone(), scopes.clone(), auth_state.clone())?
                .with_prompt(Arc::new(ConsolePrompt::new(azure_ad.open_browser)));
            Arc::new(CachingAuthProvider::new(
                Arc::new(provider),
                auth_state.clone(),
                scopes.join(" "),
            ))
        }
    };

    let auth_type = provider.auth_type();
    let client = GraphClient::new(config.graph(), provider)?;
    let service = GraphService::new(
        client,
        Arc::new(ReauthenticationHandler::new(auth_state.clone())),
        scopes,
    )
    .with_max_rows(config.graph().max_rows);

    Ok(Session { service, auth_type })
}
