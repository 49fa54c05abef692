pub mod identity;
pub mod interactions;

pub use identity::{IdentityService, NewUser, Profile};
pub use interactions::{InteractionService, LikerSummary};
