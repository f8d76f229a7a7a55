use serde::{Deserialize, Serialize};

/// The user entity as seen by the service and HTTP layers.
///
/// `id` is `None` until the store assigns one on first save and never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// A not-yet-persisted user.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self { id: None, first_name: first_name.into(), last_name: last_name.into() }
    }

    /// A user addressed by an explicit key, used when seeding fixtures.
    pub fn with_id(id: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self { id: Some(id.into()), first_name: first_name.into(), last_name: last_name.into() }
    }

    /// Copy of `self` keeping the id, with names taken from `patch`.
    pub fn merged_with(&self, patch: &User) -> User {
        User {
            id: self.id.clone(),
            first_name: patch.first_name.clone(),
            last_name: patch.last_name.clone(),
        }
    }
}

/// Request body for create and update. Carries no id, so any `id`
/// sent by a client is dropped during deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResource {
    pub first_name: String,
    pub last_name: String,
}

impl From<UserResource> for User {
    fn from(r: UserResource) -> Self {
        User::new(r.first_name, r.last_name)
    }
}

/// Persisted record shape: `{ "_id": ..., "firstName": ..., "lastName": ... }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserDocument {
    pub fn from_user(id: String, user: User) -> Self {
        Self { id, first_name: user.first_name, last_name: user.last_name }
    }
}

impl From<UserDocument> for User {
    fn from(d: UserDocument) -> Self {
        User { id: Some(d.id), first_name: d.first_name, last_name: d.last_name }
    }
}
