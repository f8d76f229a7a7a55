use std::sync::Arc;

use service::{UserRepository, UserService};

/// Shared handler state. Cloned per request; only the `Arc` is copied.
#[derive(Clone)]
pub struct ServerState {
    pub users: Arc<UserService<dyn UserRepository>>,
}

impl ServerState {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { users: Arc::new(UserService::new(repo)) }
    }
}
