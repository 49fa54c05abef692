use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user's like on one post. The store keeps at most one per
/// `(user_id, post_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: i64,
    /// Store insertion order, used to list likers deterministically.
    #[serde(skip)]
    pub seq: u64,
}
