pub mod health;
pub mod interaction;
pub mod post;
pub mod user;
