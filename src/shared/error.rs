use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Database(String),
    Storage(String),
    Network(String),
    Remote { status: Option<u16>, message: String },
    Timeout(String),
    NotFound(String),
    ValidationError(String),
    SerializationError(String),
    DeserializationError(String),
    UnresolvedIdentifier(String),
    Cancelled(String),
    Internal(String),
}

impl AppError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Remote {
            status,
            message: message.into(),
        }
    }

    /// Failures that are expected to clear up on a later pass without user action.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::Timeout(_) => true,
            AppError::Remote {
                status: Some(status),
                ..
            } => *status >= 500,
            AppError::Remote { status: None, .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Remote {
                status: Some(status),
                message,
            } => write!(f, "Remote error ({}): {}", status, message),
            AppError::Remote {
                status: None,
                message,
            } => write!(f, "Remote error: {}", message),
            AppError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            AppError::UnresolvedIdentifier(msg) => write!(f, "Unresolved identifier: {}", msg),
            AppError::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::ValidationError(format!("Invalid base64 image: {err}"))
    }
}

impl From<crate::domain::value_objects::EmbeddedImageError> for AppError {
    fn from(err: crate::domain::value_objects::EmbeddedImageError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn classifies_transient_failures() {
        assert!(AppError::Network("offline".into()).is_transient());
        assert!(AppError::Timeout("insert".into()).is_transient());
        assert!(AppError::remote(Some(503), "unavailable").is_transient());
        assert!(!AppError::remote(Some(409), "duplicate key").is_transient());
        assert!(!AppError::UnresolvedIdentifier("temp-1".into()).is_transient());
    }

    #[test]
    fn remote_display_includes_status() {
        let err = AppError::remote(Some(500), "boom");
        assert_eq!(err.to_string(), "Remote error (500): boom");
    }
}
