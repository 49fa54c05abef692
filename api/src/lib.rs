// ============================================================================
// SOCIAL API - AUTHENTICATION AND POST LIKES
// ============================================================================

// - User registration/login with bcrypt password hashing
// - Stateless JWT identity with logout revocation
// - Like/unlike toggle with a consistent per-post like counter
// - Structured logging, CORS, login rate limiting

pub mod auth;
pub mod config;
pub mod dto;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod states;
pub mod store;

pub use states::AppState;

use axum::{
    Router,
    routing::{get, patch, post},
};
use routes::{health, interaction, post as posts, user};

/// Every route of the service, with state attached. Middleware is added by
/// the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Public routes (no auth required)
        .route("/health", get(health::health_check))
        .route("/register", post(user::register))
        .route("/login", post(user::login))
        .route("/posts", get(posts::get_posts).post(posts::create_post))
        .route("/posts/{id}", get(posts::get_post))
        // Protected routes (auth required)
        .route("/logout", post(user::logout))
        .route("/me", get(user::get_me))
        .route(
            "/interactions/{post_id}",
            patch(interaction::toggle_like).get(interaction::list_likers),
        )
        .with_state(state)
}
