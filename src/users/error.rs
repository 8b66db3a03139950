use crate::errors::DbError;
use serde::Serialize;
use thiserror::Error;

/// One rejected field of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<FieldError>),

    #[error("{message}")]
    Conflict { email: String, message: String },

    #[error("User not found")]
    NotFound { id: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join(", ")
}

impl UserError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn email_taken(email: impl Into<String>) -> Self {
        Self::Conflict { email: email.into(), message: "User with this email already exists".into() }
    }

    pub fn email_in_use(email: impl Into<String>) -> Self {
        Self::Conflict { email: email.into(), message: "Email already in use".into() }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Store failure raised while saving an update; a lost race on the email index reads as
    /// an update conflict rather than a create conflict.
    #[must_use]
    pub fn on_update(e: DbError) -> Self {
        match e {
            DbError::DuplicateKey { value, .. } => Self::email_in_use(value),
            other => other.into(),
        }
    }

    /// Field details for validation failures, empty otherwise.
    #[must_use]
    pub fn details(&self) -> &[FieldError] {
        match self {
            Self::Validation(v) => v,
            _ => &[],
        }
    }
}

impl From<DbError> for UserError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::DuplicateKey { value, .. } => Self::email_taken(value),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for UserError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::StoreUnavailable(format!("background task failed: {e}"))
    }
}
