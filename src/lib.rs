pub mod api;
pub mod cli;
pub mod config;
pub mod oauth;
pub mod recipe;
pub mod session;

use anyhow::{Context, Result};
use config::Config;
use std::sync::Arc;
use std::time::Duration;

use crate::api::rate_limit::RateLimiter;
use crate::oauth::{GoogleOAuthClient, IdentityProvider};
use crate::recipe::RecipeService;
use crate::session::{CookieSigner, MemorySessionStore, SessionStore};

pub struct AppState {
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub recipes: RecipeService,
    pub cookies: CookieSigner,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire up the in-memory session store, Google and the recipe service from `config`
    pub fn new(config: Config) -> Result<Self> {
        let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
            config.session.ttl_seconds,
        )));
        let identity = Arc::new(GoogleOAuthClient::new(&config.google, &config.server));
        let recipes = RecipeService::from_config(&config.recipe)
            .context("Failed to build recipe generation client")?;
        let cookies = CookieSigner::from_config(&config);
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        Ok(Self {
            config,
            sessions,
            identity,
            recipes,
            cookies,
            rate_limiter,
        })
    }

    /// Replace the session store
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Replace the identity provider
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_recipe_service(mut self, recipes: RecipeService) -> Self {
        self.recipes = recipes;
        self
    }
}
