use crate::{
    auth::bearer_token,
    config::Config,
    errors::ApiError,
    services::{IdentityService, InteractionService},
    store::Store,
};
use axum::http::HeaderMap;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// Cloned into every handler. Everything behind the `Arc`s is either
/// read-only after startup or synchronised internally.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub identity: Arc<IdentityService>,
    pub interactions: Arc<InteractionService>,
    pub login_limiter: Arc<DefaultKeyedRateLimiter<String>>, // Keyed by username
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let store = Store::new();
        let attempts =
            NonZeroU32::new(config.auth.login_attempts_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            identity: Arc::new(IdentityService::new(store.clone(), &config.auth)),
            interactions: Arc::new(InteractionService::new(store.clone())),
            login_limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(attempts))),
            store,
        }
    }

    /// Resolves `Authorization: Bearer <token>` to the caller's user id.
    pub fn current_user(&self, headers: &HeaderMap) -> Result<Uuid, ApiError> {
        let token = bearer_token(headers)?;
        self.identity.resolve_current_user(token)
    }

    /// Drops limiter keys whose quota has fully replenished. Every username
    /// posted to `/login` gets a key, so without this the map only grows.
    pub fn prune_login_limiter(&self) {
        let before = self.login_limiter.len();
        self.login_limiter.retain_recent();
        self.login_limiter.shrink_to_fit();

        debug!(
            "Login limiter pruned: {} -> {} keys",
            before,
            self.login_limiter.len()
        );
    }

    /// Runs [`AppState::prune_login_limiter`] every `every` until the runtime
    /// shuts down.
    pub fn spawn_login_limiter_pruning(&self, every: Duration) -> JoinHandle<()> {
        let state = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                state.prune_login_limiter();
            }
        })
    }
}
