use crate::{
    AppState,
    auth::bearer_token,
    dto::{LoginForm, RegisterRequest},
    errors::ApiError,
    services::{NewUser, Profile},
};
use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Runs bcrypt-bound service calls on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("Blocking task failed: {}", e)))?
}

/// POST /register
/// Body: { "username": "...", "password": "...", "name": "...", "profile_image": "..." }
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Uuid>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let username = payload.username.clone();
    let identity = state.identity.clone();
    let id = run_blocking(move || {
        identity.register(NewUser {
            username: payload.username,
            password: payload.password,
            name: payload.name,
            profile_image: payload.profile_image,
        })
    })
    .await?;

    info!("New user registered: {}", username);

    Ok(Json(id))
}

/// POST /login
/// Body (form): username=...&password=...
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<String>, ApiError> {
    if state.login_limiter.check_key(&form.username).is_err() {
        warn!("Login rate limit hit for {}", form.username);
        return Err(ApiError::TooManyRequests);
    }

    let identity = state.identity.clone();
    let token = run_blocking(move || identity.login(&form.username, &form.password)).await?;

    Ok(Json(token))
}

/// POST /logout
/// Headers: Authorization: Bearer <token>
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers)?;
    state.identity.revoke_token(token)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /me
/// Headers: Authorization: Bearer <token>
pub async fn get_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Profile>, ApiError> {
    let user_id = state.current_user(&headers)?;
    let profile = state.identity.get_profile(&user_id)?;

    Ok(Json(profile))
}
