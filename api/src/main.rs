use social_api::{AppState, config::Config, router};
use std::time::Duration;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    dotenvy::dotenv().ok();

    // Loaded once, injected everywhere
    let config = Config::from_env().expect("invalid configuration");

    let state = AppState::new(&config);
    state.spawn_login_limiter_pruning(Duration::from_secs(60));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(GlobalConcurrencyLimitLayer::new(config.server.max_concurrent_requests));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .expect("failed to bind listener");

    info!("Server running on http://{}", config.server.bind_addr);
    info!("API Endpoints:");
    info!("  GET    /health                  - Health check");
    info!("  POST   /register                - Create account");
    info!("  POST   /login                   - Login (form)");
    info!("  POST   /logout                  - Revoke token (auth)");
    info!("  GET    /me                      - Current user (auth)");
    info!("  POST   /posts                   - Create post (auth)");
    info!("  GET    /posts                   - List posts (paginated)");
    info!("  GET    /posts/:id               - Get specific post");
    info!("  PATCH  /interactions/:post_id   - Toggle like (auth)");
    info!("  GET    /interactions/:post_id   - List likers (auth)");

    axum::serve(listener, app).await.expect("server error");
}
