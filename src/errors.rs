use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate key on unique index '{field}': {value}")]
    DuplicateKey { field: String, value: String },

    #[error("Invalid document ID: {0}")]
    InvalidDocumentId(String),

    #[error("Operation log error: {0}")]
    WalError(String),

    #[error("Malformed stored document: {0}")]
    MalformedDocument(String),

    #[error("Database is closed")]
    Closed,
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = DbError::DuplicateKey { field: "email".into(), value: "a@b.c".into() };
        assert_eq!(e.to_string(), "Duplicate key on unique index 'email': a@b.c");
        assert_eq!(DbError::Closed.to_string(), "Database is closed");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(DbError::from(io).to_string(), "I/O error: gone");
    }
}
