//! Storage abstractions for the service layer
//!
//! `UserRepository` is the document-store contract the service talks to;
//! `JsonUserRepository` implements it on top of the generic `JsonMapStore`.

pub mod json_map_store;
pub mod json_user_repository;
pub mod repository;

pub use json_user_repository::JsonUserRepository;
pub use repository::{UserRepository, UserStream};
