use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::config::{Config, Environment};

type HmacSha256 = Hmac<Sha256>;

/// Cookie holding the OAuth `state` value between redirect and callback
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Generate a random session token
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Signs session tokens into cookie values and builds the session cookies.
///
/// Cookie values have the form `<token>.<hex hmac-sha256(secret, token)>`.
#[derive(Clone)]
pub struct CookieSigner {
    secret: Vec<u8>,
    cookie_name: String,
    ttl_seconds: i64,
    environment: Environment,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner")
            .field("cookie_name", &self.cookie_name)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl CookieSigner {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        cookie_name: impl Into<String>,
        ttl_seconds: u64,
        environment: Environment,
    ) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: cookie_name.into(),
            ttl_seconds: i64::try_from(ttl_seconds).unwrap_or(i64::MAX),
            environment,
        }
    }

    /// Build from configuration, generating an ephemeral secret when none is set
    pub fn from_config(config: &Config) -> Self {
        let secret = match config.session.secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                tracing::warn!("No session secret configured, generating a random one");
                generate_token()
            }
        };

        Self::new(
            secret,
            config.session.cookie_name.clone(),
            config.session.ttl_seconds,
            config.server.environment,
        )
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }

    pub fn sign(&self, token: &str) -> String {
        let mut mac = self.mac();
        mac.update(token.as_bytes());
        format!("{}.{}", token, hex::encode(mac.finalize().into_bytes()))
    }

    /// Recover the token from a signed cookie value. Tampered values yield `None`.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (token, signature) = value.rsplit_once('.')?;
        if token.is_empty() {
            return None;
        }
        let expected = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(token.as_bytes());

        // Use constant-time comparison
        mac.verify_slice(&expected).ok()?;
        Some(token.to_string())
    }

    /// Session token carried by the request, if its signature checks out
    pub fn session_token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.cookie_name)
            .and_then(|cookie| self.verify(cookie.value()))
    }

    fn same_site(&self) -> SameSite {
        if self.environment.is_production() {
            SameSite::None
        } else {
            SameSite::Lax
        }
    }

    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), self.sign(token)))
            .path("/")
            .http_only(true)
            .secure(self.environment.is_production())
            .same_site(self.same_site())
            .max_age(time::Duration::seconds(self.ttl_seconds))
            .build()
    }

    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .max_age(time::Duration::ZERO)
            .build()
    }

    pub fn state_cookie(&self, state: &str) -> Cookie<'static> {
        Cookie::build((OAUTH_STATE_COOKIE, state.to_string()))
            .path("/auth")
            .http_only(true)
            .secure(self.environment.is_production())
            .same_site(SameSite::Lax)
            .max_age(time::Duration::minutes(10))
            .build()
    }

    pub fn clear_state_cookie(&self) -> Cookie<'static> {
        Cookie::build((OAUTH_STATE_COOKIE, ""))
            .path("/auth")
            .max_age(time::Duration::ZERO)
            .build()
    }
}
