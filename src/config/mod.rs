use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub recipe: RecipeConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub environment: Environment,
    /// Directory holding the built client bundle, served with an index.html fallback
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            static_dir: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Origin of the single-page client; also the base for login redirects
    #[serde(default = "default_client_url")]
    pub url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_client_url(),
        }
    }
}

impl ClientConfig {
    /// Landing route after a successful login
    pub fn home_url(&self) -> String {
        format!("{}/home", self.url.trim_end_matches('/'))
    }

    /// Route shown when a login attempt fails
    pub fn error_url(&self) -> String {
        format!("{}/error", self.url.trim_end_matches('/'))
    }
}

fn default_client_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client ID
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret
    #[serde(default)]
    pub client_secret: Option<String>,
    /// OAuth redirect URI (callback URL)
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default = "default_google_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_google_token_url")]
    pub token_url: String,
    #[serde(default = "default_google_userinfo_url")]
    pub userinfo_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            callback_url: None,
            auth_url: default_google_auth_url(),
            token_url: default_google_token_url(),
            userinfo_url: default_google_userinfo_url(),
        }
    }
}

impl GoogleConfig {
    /// Client credentials, if both halves are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (non_blank(&self.client_id), non_blank(&self.client_secret)) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    pub fn redirect_uri(&self, server: &ServerConfig) -> String {
        non_blank(&self.callback_url)
            .map(str::to_string)
            .unwrap_or_else(|| format!("http://localhost:{}/auth/google/callback", server.port))
    }
}

fn default_google_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_google_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_google_userinfo_url() -> String {
    "https://www.googleapis.com/oauth2/v3/userinfo".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Key for signing session cookies. A random one is generated per process if unset.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Interval between sweeps of expired sessions, in seconds
    #[serde(default = "default_session_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_seconds: default_session_ttl(),
            cookie_name: default_cookie_name(),
            cleanup_interval: default_session_cleanup_interval(),
        }
    }
}

/// One year
pub const MAX_SESSION_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

fn default_cookie_name() -> String {
    "recipe_session".to_string()
}

fn default_session_cleanup_interval() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeConfig {
    /// Hugging Face inference API token. Without it every recipe comes from the templates.
    #[serde(default)]
    pub hugging_face_token: Option<String>,
    #[serde(default = "default_model_url")]
    pub model_url: String,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    /// Timeout for the upstream request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            hugging_face_token: None,
            model_url: default_model_url(),
            max_length: default_max_length(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl RecipeConfig {
    pub fn credential(&self) -> Option<&str> {
        non_blank(&self.hugging_face_token)
    }
}

fn default_model_url() -> String {
    "https://api-inference.huggingface.co/models/flax-community/t5-recipe-generation".to_string()
}

fn default_max_length() -> u32 {
    512
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per client within one window
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Interval between sweeps of stale windows, in seconds
    #[serde(default = "default_rate_limit_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Key clients on X-Forwarded-For / X-Real-IP. Only safe behind a proxy that sets them.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: default_requests_per_window(),
            window_seconds: default_window_seconds(),
            cleanup_interval: default_rate_limit_cleanup_interval(),
            trust_proxy_headers: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_requests_per_window() -> u32 {
    100
}

fn default_window_seconds() -> u64 {
    15 * 60
}

fn default_rate_limit_cleanup_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Load the TOML file (defaults if missing) and apply process environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    /// Override file values with environment variables. Blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        if let Some(env) = get("APP_ENV") {
            self.server.environment = if env.trim().eq_ignore_ascii_case("production") {
                Environment::Production
            } else {
                Environment::Development
            };
        }
        if let Some(url) = get("CLIENT_URL") {
            self.client.url = url;
        }
        if let Some(id) = get("GOOGLE_CLIENT_ID") {
            self.google.client_id = Some(id);
        }
        if let Some(secret) = get("GOOGLE_CLIENT_SECRET") {
            self.google.client_secret = Some(secret);
        }
        if let Some(callback) = get("GOOGLE_CALLBACK_URL") {
            self.google.callback_url = Some(callback);
        }
        if let Some(token) = get("HUGGING_FACE_TOKEN") {
            self.recipe.hugging_face_token = Some(token);
        }
        if let Some(url) = get("HUGGING_FACE_MODEL_URL") {
            self.recipe.model_url = url;
        }
        if let Some(secret) = get("SESSION_SECRET") {
            self.session.secret = Some(secret);
        }
        if let Some(ttl) = get("SESSION_TTL_SECONDS") {
            self.session.ttl_seconds = ttl
                .trim()
                .parse()
                .with_context(|| format!("Invalid SESSION_TTL_SECONDS value: {}", ttl))?;
        }

        Ok(())
    }

    /// Problems that leave the server running in a degraded mode
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.google.credentials().is_none() {
            warnings.push("Google OAuth credentials are not configured; logins will fail".to_string());
        }
        if self.recipe.credential().is_none() {
            warnings.push(
                "HUGGING_FACE_TOKEN is not configured; recipes will use the fallback templates"
                    .to_string(),
            );
        }
        if non_blank(&self.session.secret).is_none() {
            warnings.push(
                "SESSION_SECRET is not configured; sessions will not survive a restart".to_string(),
            );
        }
        warnings
    }

    /// Settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if !(self.client.url.starts_with("http://") || self.client.url.starts_with("https://")) {
            anyhow::bail!("Client URL must be an http(s) origin: {}", self.client.url);
        }
        if self.session.ttl_seconds == 0 || self.session.ttl_seconds > MAX_SESSION_TTL_SECONDS {
            anyhow::bail!(
                "Session TTL must be between 1 and {} seconds",
                MAX_SESSION_TTL_SECONDS
            );
        }
        if self.rate_limit.enabled
            && (self.rate_limit.window_seconds == 0 || self.rate_limit.requests_per_window == 0)
        {
            anyhow::bail!("Rate limit window and request count must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.client.url, "http://localhost:3000");
        assert_eq!(config.session.ttl_seconds, 86400);
        assert_eq!(config.rate_limit.requests_per_window, 100);
        assert_eq!(config.rate_limit.window_seconds, 900);
        assert_eq!(config.recipe.max_length, 512);
        assert!(!config.server.environment.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8081
            environment = "production"

            [client]
            url = "https://recipes.example.com"

            [recipe]
            hugging_face_token = "hf_abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert!(config.server.environment.is_production());
        assert_eq!(config.client.home_url(), "https://recipes.example.com/home");
        assert_eq!(config.recipe.credential(), Some("hf_abc"));
        assert_eq!(config.session.cookie_name, "recipe_session");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("PORT", "7000"),
                ("CLIENT_URL", "https://app.example.com/"),
                ("GOOGLE_CLIENT_ID", "id-123"),
                ("GOOGLE_CLIENT_SECRET", "shh"),
                ("HUGGING_FACE_TOKEN", "hf_token"),
                ("SESSION_TTL_SECONDS", "60"),
                ("APP_ENV", "production"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.client.error_url(), "https://app.example.com/error");
        assert_eq!(config.google.credentials(), Some(("id-123", "shh")));
        assert_eq!(config.recipe.credential(), Some("hf_token"));
        assert_eq!(config.session.ttl_seconds, 60);
        assert!(config.server.environment.is_production());
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("HUGGING_FACE_TOKEN", "  "), ("PORT", "")]))
            .unwrap();

        assert!(config.recipe.credential().is_none());
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_redirect_uri_defaults_to_local_callback() {
        let config = Config::default();
        assert_eq!(
            config.google.redirect_uri(&config.server),
            "http://localhost:5000/auth/google/callback"
        );
    }

    #[test]
    fn test_warnings_for_missing_credentials() {
        let warnings = Config::default().warnings();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("HUGGING_FACE_TOKEN")));
    }

    #[test]
    fn test_validate_rejects_bad_client_url() {
        let mut config = Config::default();
        config.client.url = "localhost:3000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_session_ttl() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("SESSION_TTL_SECONDS", "18446744073709551615")]))
            .unwrap();
        assert!(config.validate().is_err());

        config.session.ttl_seconds = MAX_SESSION_TTL_SECONDS;
        assert!(config.validate().is_ok());
        config.session.ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_proxy_headers_untrusted_by_default() {
        assert!(!Config::default().rate_limit.trust_proxy_headers);
        let config: Config = toml::from_str("[rate_limit]\ntrust_proxy_headers = true").unwrap();
        assert!(config.rate_limit.trust_proxy_headers);
    }
}
