use crate::{AppState, errors::ApiError, services::LikerSummary};
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use uuid::Uuid;

/// PATCH /interactions/{post_id}
/// Headers: Authorization: Bearer <token>
/// Likes the post, or unlikes it if the caller already does.
pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Uuid>, ApiError> {
    let user_id = state.current_user(&headers)?;
    let post_id = state.interactions.toggle_like(user_id, post_id)?;

    Ok(Json(post_id))
}

/// GET /interactions/{post_id}
/// Headers: Authorization: Bearer <token>
pub async fn list_likers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<LikerSummary>>, ApiError> {
    state.current_user(&headers)?;

    Ok(Json(state.interactions.list_likers(post_id)))
}
