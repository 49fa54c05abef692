use crate::{errors::ApiError, store::Store};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// One row of `GET /interactions/{post_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikerSummary {
    pub user_name: String,
    pub username: String,
    pub profile_image: Option<String>,
    pub like_id: Uuid,
    pub post_id: Uuid,
}

/// Like/unlike toggling. Holds no state of its own; atomicity of each toggle
/// comes from the store.
pub struct InteractionService {
    store: Store,
}

impl InteractionService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<Uuid, ApiError> {
        let state = self
            .store
            .toggle_like(user_id, post_id)
            .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;

        info!("Like toggled on post {} by user {}: {:?}", post_id, user_id, state);

        Ok(post_id)
    }

    /// Users who currently like `post_id`, in the order they liked it.
    pub fn list_likers(&self, post_id: Uuid) -> Vec<LikerSummary> {
        self.store
            .likes_for_post(post_id)
            .into_iter()
            .filter_map(|like| {
                let user = self.store.user(&like.user_id)?;
                Some(LikerSummary {
                    user_name: user.name,
                    username: user.username,
                    profile_image: user.profile_image,
                    like_id: like.id,
                    post_id: like.post_id,
                })
            })
            .collect()
    }
}
