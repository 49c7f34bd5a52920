//! BBMS OAuth linking
//!
//! The two-phase protocol that connects an organization to its Blackbaud
//! Merchant Services account:
//!
//! 1. **Start**: the authenticated admin supplies their merchant id and
//!    Blackbaud app credentials; we persist a pending attempt and hand back
//!    the authorization URL to open in a popup.
//! 2. **Callback**: Blackbaud redirects the browser back with a code and
//!    our state; the unauthenticated callback endpoint verifies the state,
//!    exchanges the code, and commits the encrypted tokens.
//!
//! Trust on the callback is established entirely through the state token.

pub mod exchange;
pub mod flow;
pub mod state;

pub use exchange::{SkyTokenClient, TokenResponse};
pub use flow::{OAuthFlowOrchestrator, OAuthLinkState, create_oauth_link_routes};
pub use state::{issue_state, split_state, verify_state};

/// Fixed parameters of the authorization round trip
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    /// Authorization-server base URL (e.g. `https://oauth2.sky.blackbaud.com`)
    pub oauth_base_url: String,
    /// Redirect URI registered with every tenant's Blackbaud application
    pub callback_url: String,
    /// Scope string requested during authorization
    pub scope: String,
}

impl OAuthSettings {
    pub fn from_config(bb: &crate::config::BlackbaudConfig) -> Self {
        Self {
            oauth_base_url: bb.oauth_base_url.clone(),
            callback_url: bb.callback_url.clone(),
            scope: bb.oauth_scope.clone(),
        }
    }
}
