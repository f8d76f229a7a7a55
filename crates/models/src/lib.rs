//! Wire and storage shapes of the `User` entity.

pub mod user;

pub use user::{User, UserDocument, UserResource};
