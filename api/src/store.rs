use crate::{
    errors::ApiError,
    models::{LikedPost, Post, User},
};
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use uuid::Uuid;

// ============================================================================
// STORE - Shared records behind the services
// ============================================================================
/// `DashMap` shards give us row-level locking: holding a `RefMut` on a post
/// blocks every other writer of that post until it is dropped.
///
/// Lock order is `username_index -> users` and `posts -> likes -> post_likes`.
/// Nothing acquires them the other way round.
#[derive(Clone, Default)]
pub struct Store {
    users: Arc<DashMap<Uuid, User>>,
    username_index: Arc<DashMap<String, Uuid>>, // Unique constraint on username
    posts: Arc<DashMap<Uuid, Post>>,
    likes: Arc<DashMap<(Uuid, Uuid), LikedPost>>, // Keyed by (user_id, post_id)
    post_likes: Arc<DashMap<Uuid, BTreeMap<u64, Uuid>>>, // post_id -> seq -> user_id
    like_seq: Arc<AtomicU64>,
}

/// Outcome of a toggle, seen from the user's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.username_index.contains_key(username)
    }

    /// Inserts the user unless the username is already indexed. The check and
    /// the insert happen under the index entry lock.
    pub fn insert_user(&self, user: User) -> Result<(), ApiError> {
        match self.username_index.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(ApiError::Conflict),
            Entry::Vacant(slot) => {
                let id = user.id;
                self.users.insert(id, user);
                slot.insert(id);
                Ok(())
            }
        }
    }

    pub fn user(&self, id: &Uuid) -> Option<User> {
        self.users.get(id).map(|user| user.clone())
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        let id = *self.username_index.get(username)?;
        self.user(&id)
    }

    pub fn insert_post(&self, post: Post) {
        self.posts.insert(post.id, post);
    }

    pub fn post(&self, id: &Uuid) -> Option<Post> {
        self.posts.get(id).map(|post| post.clone())
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Flips the like for `(user_id, post_id)` and adjusts the post's counter
    /// in one critical section. Returns `None` when the post does not exist.
    pub fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Option<LikeState> {
        let mut post = self.posts.get_mut(&post_id)?;

        let state = match self.likes.entry((user_id, post_id)) {
            Entry::Occupied(like) => {
                let removed = like.remove();
                if let Some(mut index) = self.post_likes.get_mut(&post_id) {
                    index.remove(&removed.seq);
                }
                post.like_count = post.like_count.saturating_sub(1);
                LikeState::Unliked
            }
            Entry::Vacant(slot) => {
                let seq = self.like_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(LikedPost {
                    id: Uuid::new_v4(),
                    user_id,
                    post_id,
                    created_at: Utc::now().timestamp(),
                    seq,
                });
                self.post_likes
                    .entry(post_id)
                    .or_default()
                    .insert(seq, user_id);
                post.like_count += 1;
                LikeState::Liked
            }
        };

        Some(state)
    }

    pub fn like(&self, user_id: Uuid, post_id: Uuid) -> Option<LikedPost> {
        self.likes
            .get(&(user_id, post_id))
            .map(|like| like.clone())
    }

    /// Likes on `post_id`, oldest first. Only touches that post's likes.
    pub fn likes_for_post(&self, post_id: Uuid) -> Vec<LikedPost> {
        let likers: Vec<Uuid> = match self.post_likes.get(&post_id) {
            Some(index) => index.values().copied().collect(),
            None => return Vec::new(),
        };

        // A like removed since the index was read is skipped.
        likers
            .into_iter()
            .filter_map(|user_id| self.like(user_id, post_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            name: username.to_uppercase(),
            password_hash: "hash".into(),
            profile_image: None,
            created_at: 0,
        }
    }

    fn post() -> Post {
        Post {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "title".into(),
            content: "content".into(),
            like_count: 0,
            created_at: 0,
        }
    }

    #[test]
    fn username_index_is_unique() {
        let store = Store::new();
        store.insert_user(user("alice")).unwrap();

        assert!(matches!(
            store.insert_user(user("alice")),
            Err(ApiError::Conflict)
        ));
        assert!(store.username_taken("alice"));
        assert!(store.user_by_username("alice").is_some());
        assert!(store.user_by_username("bob").is_none());
    }

    #[test]
    fn toggle_on_missing_post_is_none() {
        let store = Store::new();
        assert_eq!(store.toggle_like(Uuid::new_v4(), Uuid::new_v4()), None);
    }

    #[test]
    fn toggle_flips_row_and_counter() {
        let store = Store::new();
        let post = post();
        let post_id = post.id;
        let user_id = Uuid::new_v4();
        store.insert_post(post);

        assert_eq!(store.toggle_like(user_id, post_id), Some(LikeState::Liked));
        assert_eq!(store.post(&post_id).unwrap().like_count, 1);
        assert!(store.like(user_id, post_id).is_some());

        assert_eq!(store.toggle_like(user_id, post_id), Some(LikeState::Unliked));
        assert_eq!(store.post(&post_id).unwrap().like_count, 0);
        assert!(store.like(user_id, post_id).is_none());
    }

    #[test]
    fn likes_for_post_keeps_insertion_order() {
        let store = Store::new();
        let post = post();
        let post_id = post.id;
        store.insert_post(post);

        let users: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &users {
            store.toggle_like(*id, post_id);
        }

        let likers: Vec<Uuid> = store
            .likes_for_post(post_id)
            .into_iter()
            .map(|like| like.user_id)
            .collect();
        assert_eq!(likers, users);
    }

    #[test]
    fn relike_moves_to_the_end_and_other_posts_stay_separate() {
        let store = Store::new();
        let (first, second) = (post(), post());
        let (first_id, second_id) = (first.id, second.id);
        store.insert_post(first);
        store.insert_post(second);

        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        store.toggle_like(alice, first_id);
        store.toggle_like(bob, first_id);
        store.toggle_like(bob, second_id);

        store.toggle_like(alice, first_id);
        store.toggle_like(alice, first_id);

        let order: Vec<Uuid> = store
            .likes_for_post(first_id)
            .into_iter()
            .map(|like| like.user_id)
            .collect();
        assert_eq!(order, [bob, alice]);

        store.toggle_like(bob, second_id);
        assert!(store.likes_for_post(second_id).is_empty());
        assert_eq!(store.likes_for_post(first_id).len(), 2);
        assert!(store.likes_for_post(Uuid::new_v4()).is_empty());
    }
}
