//! User login/logout activity entities.

pub mod kind;
pub mod model;

pub use kind::ActivityType;
pub use model::{CreateUserActivity, UserActivity};
