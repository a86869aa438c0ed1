//! User domain entities.

pub mod input;
pub mod model;

pub use input::{CreateUserInput, UpdateUserInput};
pub use model::{CreateUser, UpdateUser, User, UserWithRoles};
