use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{stream, StreamExt};
use models::{User, UserResource};
use tracing::{debug, info};

use crate::{
    errors::JsonApiError,
    json_stream::json_array_body,
    metrics::{self, Outcome},
    state::ServerState,
};

fn observe<T>(operation: &str, res: &Result<Option<T>, service::ServiceError>) {
    let outcome = match res {
        Ok(Some(_)) => Outcome::Ok,
        Ok(None) => Outcome::NotFound,
        Err(_) => Outcome::Error,
    };
    metrics::record(operation, outcome);
}

fn bind_body(
    operation: &str,
    payload: Result<Json<UserResource>, JsonRejection>,
) -> Result<UserResource, JsonApiError> {
    match payload {
        Ok(Json(input)) => Ok(input),
        Err(rejection) => {
            debug!(operation, reason = %rejection.body_text(), "request body rejected");
            metrics::record(operation, Outcome::Rejected);
            Err(rejection.into())
        }
    }
}

#[utoipa::path(
    post, path = "/api/v1/users", tag = "users",
    request_body = crate::openapi::UserResourceDoc,
    responses(
        (status = 200, description = "Created", body = crate::openapi::UserDoc),
        (status = 400, description = "Malformed Request"),
        (status = 500, description = "Storage Error")
    )
)]
pub async fn create_user(
    State(state): State<ServerState>,
    payload: Result<Json<UserResource>, JsonRejection>,
) -> Result<Json<User>, JsonApiError> {
    let input = bind_body("create", payload)?;
    let res = state.users.create_user(input.into()).await;
    metrics::record("create", if res.is_ok() { Outcome::Ok } else { Outcome::Error });
    let created = res?;
    info!(id = created.id.as_deref().unwrap_or_default(), "created user");
    Ok(Json(created))
}

/// Streams the collection as a JSON array.
///
/// The first element is pulled before the status line is sent, so a store
/// that fails up front still gets a 500 instead of a broken 200.
#[utoipa::path(
    get, path = "/api/v1/users", tag = "users",
    responses(
        (status = 200, description = "All users", body = [crate::openapi::UserDoc]),
        (status = 500, description = "Storage Error")
    )
)]
pub async fn list_users(State(state): State<ServerState>) -> Result<Response, JsonApiError> {
    let mut users = state.users.get_users();
    let first = match users.next().await {
        Some(Err(e)) => {
            metrics::record("list", Outcome::Error);
            return Err(e.into());
        }
        first => first,
    };
    metrics::record("list", Outcome::Ok);
    let body = json_array_body(stream::iter(first).chain(users));
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

#[utoipa::path(
    get, path = "/api/v1/users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "OK", body = crate::openapi::UserDoc),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<User>, JsonApiError> {
    let res = state.users.get_user_by_id(&id).await;
    observe("get", &res);
    match res? {
        Some(user) => Ok(Json(user)),
        None => Err(JsonApiError::not_found("user", &id)),
    }
}

#[utoipa::path(
    put, path = "/api/v1/users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    request_body = crate::openapi::UserResourceDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::UserDoc),
        (status = 400, description = "Malformed Request"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Storage Error")
    )
)]
pub async fn update_user(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<UserResource>, JsonRejection>,
) -> Result<Json<User>, JsonApiError> {
    let input = bind_body("update", payload)?;
    let res = state.users.update_user(&id, input.into()).await;
    observe("update", &res);
    match res? {
        Some(user) => {
            info!(id = %id, "updated user");
            Ok(Json(user))
        }
        None => Err(JsonApiError::not_found("user", &id)),
    }
}

#[utoipa::path(
    delete, path = "/api/v1/users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Storage Error")
    )
)]
pub async fn delete_user(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    let res = state.users.delete_user(&id).await.map(|deleted| deleted.then_some(()));
    observe("delete", &res);
    match res? {
        Some(()) => {
            info!(id = %id, "deleted user");
            Ok(StatusCode::OK)
        }
        None => Err(JsonApiError::not_found("user", &id)),
    }
}
