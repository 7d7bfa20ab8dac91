//! Typed error hierarchy for the section composer.
//!
//! `SectionError` covers the three failure families a caller has to tell apart:
//! - validation (`UnknownComponent`, `MalformedValue`, `Validation`)
//! - missing records (`NotFound`)
//! - storage and transport failures (`Persistence`, `LockPoisoned`)

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from the section store, editor and remote client.
#[derive(Debug, Error)]
pub enum SectionError {
    #[error("Unknown section component '{component}'")]
    UnknownComponent { component: String },

    #[error("Malformed value for '{field}': {message}")]
    MalformedValue { field: String, message: String },

    #[error("Invalid section: {0}")]
    Validation(String),

    #[error("Section {id} not found")]
    NotFound { id: String },

    #[error("Persistence failure: {source}")]
    Persistence {
        #[source]
        source: BoxError,
    },

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Admin token rejected")]
    Unauthorized,
}

impl SectionError {
    pub fn persistence<E: Into<BoxError>>(err: E) -> Self {
        Self::Persistence { source: err.into() }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for every variant a caller should surface as a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownComponent { .. } | Self::MalformedValue { .. } | Self::Validation(_)
        )
    }

    /// Whether retrying the same mutation later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::LockPoisoned)
    }
}

impl From<rusqlite::Error> for SectionError {
    fn from(err: rusqlite::Error) -> Self {
        Self::persistence(err)
    }
}

impl From<serde_json::Error> for SectionError {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence(err)
    }
}
