//! Service layer for the user API.
//! - `storage` holds the document-store abstraction and its JSON-backed implementation.
//! - `user_service` holds the business rules (update merge, delete-after-lookup).
//! - Absence is reported as `Option`/`bool`, failures as `ServiceError`.

pub mod errors;
pub mod storage;
pub mod user_service;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use errors::ServiceError;
pub use storage::{JsonUserRepository, UserRepository, UserStream};
pub use user_service::UserService;
