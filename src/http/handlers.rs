use super::AppState;
use super::dto::{DeletedDto, Envelope, ErrorBody, ListResponse, StatsResponse, UserDto};
use super::error::ApiError;
use crate::users::{ListParams, NewUser, UserPatch};
use axum::Extension;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::{StatusCode, Uri};
use axum::response::Json;
use serde_json::{Value, json};
use std::sync::Arc;

type ApiResult<T> = Result<T, ApiError>;

/// API banner
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "userbase API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "users": {
                "create": "POST /api/users",
                "getAll": "GET /api/users",
                "getStats": "GET /api/users/stats",
                "getOne": "GET /api/users/{id}",
                "update": "PUT /api/users/{id}",
                "delete": "DELETE /api/users/{id}"
            }
        },
        "health": "GET /api/health",
        "status": "operational"
    }))
}

pub async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let connected = state.db.is_open();
    Json(json!({
        "status": if connected { "healthy" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "uptime": state.started.elapsed().as_secs_f64(),
        "database": if connected { "connected" } else { "disconnected" },
    }))
}

/// Create a new user
pub async fn create_user(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<UserDto>>)> {
    let Json(input) = body?;
    let user = state.service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(Envelope::with_message("User created successfully", UserDto::from(&user)))))
}

/// List users with filtering, sorting and pagination
pub async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ListResponse>> {
    let Query(params) = query?;
    log::debug!("listing users with {params:?}");
    let page = state.service.list_users(&params).await?;
    Ok(Json(ListResponse::from(&page)))
}

pub async fn user_stats(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Json<StatsResponse>> {
    Ok(Json(Envelope::ok(state.service.stats().await?)))
}

/// Get a specific user by ID
pub async fn get_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<UserDto>>> {
    let user = state.service.get_user(&id).await?;
    Ok(Json(Envelope::ok(UserDto::from(&user))))
}

/// Update an existing user
pub async fn update_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> ApiResult<Json<Envelope<UserDto>>> {
    let Json(patch) = body?;
    let user = state.service.update_user(&id, patch).await?;
    Ok(Json(Envelope::with_message("User updated successfully", UserDto::from(&user))))
}

/// Delete a user by ID
pub async fn delete_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<DeletedDto>>> {
    let id = state.service.delete_user(&id).await?;
    Ok(Json(Envelope::with_message("User deleted successfully", DeletedDto { id: id.to_string() })))
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new(format!("Not found - {}", uri.path()), Vec::new())))
}
