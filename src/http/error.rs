use super::dto::ErrorBody;
use crate::users::UserError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    User(UserError),
    /// The request never reached the service: unreadable body, oversized body, bad query string.
    Rejected { status: StatusCode, message: String },
}

/// Map domain errors to HTTP status codes
#[must_use]
pub fn status_for(error: &UserError) -> StatusCode {
    match error {
        UserError::Validation(_) => StatusCode::BAD_REQUEST,
        UserError::Conflict { .. } => StatusCode::CONFLICT,
        UserError::NotFound { .. } => StatusCode::NOT_FOUND,
        UserError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        Self::User(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        // oversized bodies keep their 413; any other unreadable body is a 400
        let status = match r.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::Rejected { status, message: r.body_text() }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        Self::Rejected { status: StatusCode::BAD_REQUEST, message: r.body_text() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::User(e) => {
                let status = status_for(&e);
                if status.is_server_error() {
                    log::error!("request failed: {e}");
                } else {
                    log::debug!("request rejected ({status}): {e}");
                }
                let body = ErrorBody::new(e.to_string(), e.details().to_vec());
                (status, Json(body)).into_response()
            }
            Self::Rejected { status, message } => {
                log::debug!("request rejected ({status}): {message}");
                (status, Json(ErrorBody::new(message, Vec::new()))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(&UserError::validation("age", "x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&UserError::email_taken("a@x.io")), StatusCode::CONFLICT);
        assert_eq!(status_for(&UserError::not_found("1")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&UserError::store("closed")), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn into_response_sets_status() {
        let resp = ApiError::from(UserError::not_found("1")).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
