use crate::{
    auth::{Claims, TokenKeys},
    config::AuthConfig,
    errors::ApiError,
    models::User,
    store::Store,
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Public view of a user, as returned by `GET /me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub profile_image: Option<String>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            profile_image: user.profile_image,
        }
    }
}

pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub profile_image: Option<String>,
}

/// Registers users, checks credentials and turns bearer tokens back into
/// user ids.
pub struct IdentityService {
    store: Store,
    keys: TokenKeys,
    token_ttl: Duration,
    bcrypt_cost: u32,
    revoked: DashMap<String, i64>, // jti -> exp
}

impl IdentityService {
    pub fn new(store: Store, config: &AuthConfig) -> Self {
        Self {
            store,
            keys: TokenKeys::new(config),
            token_ttl: config.token_ttl,
            bcrypt_cost: config.bcrypt_cost,
            revoked: DashMap::new(),
        }
    }

    pub fn register(&self, new_user: NewUser) -> Result<Uuid, ApiError> {
        if self.store.username_taken(&new_user.username) {
            return Err(ApiError::Conflict);
        }

        if new_user.password.len() > MAX_PASSWORD_BYTES {
            return Err(ApiError::ValidationError(format!(
                "Password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        let password_hash = hash(&new_user.password, self.bcrypt_cost)
            .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))?;

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            name: new_user.name,
            password_hash,
            profile_image: new_user.profile_image,
            created_at: Utc::now().timestamp(),
        };
        let id = user.id;

        // A concurrent registration may have claimed the name since the check above.
        self.store.insert_user(user)?;

        Ok(id)
    }

    /// `Ok(None)` means the user exists but the password does not match.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, ApiError> {
        let user = self
            .store
            .user_by_username(username)
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", username)))?;

        // Registration never stores such a password; bcrypt would compare a truncated prefix.
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(None);
        }

        let valid = verify(password, &user.password_hash)
            .map_err(|e| ApiError::InternalError(format!("Password verification failed: {}", e)))?;

        Ok(valid.then_some(user))
    }

    /// Credentials in, signed token out.
    pub fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let Some(user) = self.authenticate(username, password)? else {
            warn!("Rejected login for {}", username);
            return Err(ApiError::InvalidCredentials);
        };

        let token = self.issue_token(&user.username, &user.id, self.token_ttl)?;

        info!("User logged in: {}", user.username);

        Ok(token)
    }

    pub fn issue_token(
        &self,
        username: &str,
        user_id: &Uuid,
        ttl: Duration,
    ) -> Result<String, ApiError> {
        self.keys.create_token(username, user_id, ttl)
    }

    pub fn resolve_current_user(&self, token: &str) -> Result<Uuid, ApiError> {
        let claims = self.verified_claims(token)?;
        let id = claims.id.ok_or(ApiError::Unauthorized)?;

        Uuid::parse_str(&id).map_err(|_| ApiError::Unauthorized)
    }

    pub fn get_profile(&self, user_id: &Uuid) -> Result<Profile, ApiError> {
        self.store
            .user(user_id)
            .map(Profile::from)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))
    }

    /// Rejects the token for the rest of its lifetime.
    pub fn revoke_token(&self, token: &str) -> Result<(), ApiError> {
        let claims = self.verified_claims(token)?;
        let jti = claims.jti.ok_or(ApiError::Unauthorized)?;

        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp >= now);
        self.revoked.insert(jti, claims.exp);

        info!("Token revoked for {}", claims.sub);

        Ok(())
    }

    fn verified_claims(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.keys.validate_token(token)?;

        if let Some(jti) = &claims.jti {
            if self.revoked.contains_key(jti) {
                return Err(ApiError::Unauthorized);
            }
        }

        Ok(claims)
    }
}
