use crate::{
    AppState,
    dto::{CreatePostRequest, PaginatedResponse, PaginationParams},
    errors::ApiError,
    models::Post,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// POST /posts
/// Headers: Authorization: Bearer <token>
/// Body: { "title": "...", "content": "..." }
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user_id = state.current_user(&headers)?;

    let post = Post {
        id: Uuid::new_v4(),
        user_id,
        title: payload.title,
        content: payload.content,
        like_count: 0,
        created_at: Utc::now().timestamp(),
    };

    state.store.insert_post(post.clone());

    info!("Post created: {} by user {}", post.id, user_id);

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts?page=1&limit=10
pub async fn get_posts(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Json<PaginatedResponse<Post>> {
    let mut posts = state.store.posts();

    // Sort by creation date (newest first)
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = posts.len();
    let start = (params.page.saturating_sub(1)).saturating_mul(params.limit);
    let end = start.saturating_add(params.limit).min(total);

    let paginated_posts = if start < total {
        posts[start..end].to_vec()
    } else {
        vec![]
    };

    Json(PaginatedResponse {
        data: paginated_posts,
        page: params.page,
        limit: params.limit,
        total,
    })
}

/// GET /posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .store
        .post(&id)
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;

    Ok(Json(post))
}
