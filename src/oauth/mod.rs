//! Identity provider integration for the authorization-code login flow.

mod google;

pub use google::GoogleOAuthClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::Principal;

/// Reasons a login attempt ends on the error screen.
///
/// All variants are terminal for the attempt; the user starts over from the login route.
#[derive(Debug, Error)]
pub enum AuthExchangeError {
    #[error("OAuth provider is not configured")]
    NotConfigured,
    #[error("Invalid provider endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Provider denied the request: {0}")]
    Denied(String),
    #[error("Callback is missing the authorization code")]
    MissingCode,
    #[error("OAuth state mismatch")]
    StateMismatch,
    #[error("Failed to exchange authorization code: {0}")]
    TokenExchange(String),
    #[error("Failed to fetch user profile: {0}")]
    Profile(String),
    #[error("Failed to open session: {0}")]
    Session(String),
}

impl AuthExchangeError {
    /// Short machine-readable reason, used in logs
    pub fn reason(&self) -> &'static str {
        match self {
            AuthExchangeError::NotConfigured => "not_configured",
            AuthExchangeError::InvalidEndpoint(_) => "invalid_endpoint",
            AuthExchangeError::Denied(_) => "access_denied",
            AuthExchangeError::MissingCode => "missing_code",
            AuthExchangeError::StateMismatch => "state_mismatch",
            AuthExchangeError::TokenExchange(_) => "token_exchange_failed",
            AuthExchangeError::Profile(_) => "userinfo_failed",
            AuthExchangeError::Session(_) => "session_failed",
        }
    }
}

/// An OAuth2 identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authorization endpoint URL the browser is redirected to
    fn authorization_url(&self, state: &str) -> Result<String, AuthExchangeError>;

    /// Exchange an authorization code for the signed-in user's profile
    async fn authenticate(&self, code: &str) -> Result<Principal, AuthExchangeError>;
}
