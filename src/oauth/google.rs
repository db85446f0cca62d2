use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use super::{AuthExchangeError, IdentityProvider};
use crate::config::{GoogleConfig, ServerConfig};
use crate::session::Principal;

const SCOPES: &str = "profile email";

/// Google OAuth2 client for the authorization-code flow
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl From<GoogleProfile> for Principal {
    fn from(profile: GoogleProfile) -> Self {
        Self {
            display_name: profile.name.unwrap_or_default(),
            id: profile.sub,
            email: profile.email,
            photo: profile.picture,
        }
    }
}

impl GoogleOAuthClient {
    pub fn new(config: &GoogleConfig, server: &ServerConfig) -> Self {
        let (client_id, client_secret) = match config.credentials() {
            Some((id, secret)) => (Some(id.to_string()), Some(secret.to_string())),
            None => (None, None),
        };

        Self {
            client_id,
            client_secret,
            redirect_uri: config.redirect_uri(server),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            userinfo_url: config.userinfo_url.clone(),
            http: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), AuthExchangeError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(AuthExchangeError::NotConfigured),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthExchangeError> {
        let (client_id, client_secret) = self.credentials()?;

        let response = self
            .http
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthExchangeError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthExchangeError::TokenExchange(format!(
                "Google token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthExchangeError::TokenExchange(e.to_string()))?;

        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, AuthExchangeError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthExchangeError::Profile(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthExchangeError::Profile(format!(
                "Google userinfo endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthExchangeError::Profile(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> Result<String, AuthExchangeError> {
        let (client_id, _) = self.credentials()?;

        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", client_id),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| AuthExchangeError::InvalidEndpoint(e.to_string()))?;

        Ok(url.into())
    }

    async fn authenticate(&self, code: &str) -> Result<Principal, AuthExchangeError> {
        let access_token = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&access_token).await?;
        Ok(profile.into())
    }
}
