use crate::services::identity::MAX_PASSWORD_BYTES;
use serde::Deserialize;
use validator::{Validate, ValidationError};

#[derive(Debug, Validate, Deserialize)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,
    #[validate(
        length(min = 1, message = "Password must not be empty"),
        custom(function = "password_fits_bcrypt")
    )]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub profile_image: Option<String>,
}

/// Length in bytes, not characters: that is what bcrypt truncates on.
fn password_fits_bcrypt(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("password_too_long")
            .with_message("Password must be at most 72 bytes".into()));
    }
    Ok(())
}

/// `application/x-www-form-urlencoded` login body. Extra OAuth2 password-flow
/// fields (`grant_type`, `scope`, ...) are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Validate, Deserialize)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}
