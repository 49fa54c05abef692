mod like;
mod post;
mod user;

pub use like::LikedPost;
pub use post::Post;
pub use user::User;
