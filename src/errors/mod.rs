//! Error handling module for the portfolio sync layer.
//!
//! Provides the crate error type with stable error codes, and the advisory
//! messages surfaced to the presentation layer in place of raw errors.

use serde::Serialize;
use thiserror::Error;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const HTTP_ERROR: &str = "HTTP_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_EDITABLE: &str = "NOT_EDITABLE";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
}

/// Sync layer error type.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network unreachable, DNS failure, or no backend configured
    #[error("{0}")]
    Transport(String),
    /// Backend answered with a non-2xx status
    #[error("backend responded with HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// Local payload validation failed; never sent upstream
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    /// Edit attempted on a record without a backend-assigned id
    #[error("project '{0}' has no backend id and cannot be edited")]
    NotEditable(String),
    /// Lookup yielded no record
    #[error("project '{0}' not found")]
    NotFound(String),
    /// Local storage failure
    #[error("{0}")]
    Storage(String),
    /// Startup configuration problem
    #[error("{0}")]
    Config(String),
    /// Backend body could not be decoded
    #[error("{0}")]
    Decode(String),
}

impl SyncError {
    /// Build a validation error naming the offending field.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        SyncError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Transport(_) => codes::TRANSPORT_ERROR,
            SyncError::Http { .. } => codes::HTTP_ERROR,
            SyncError::Validation { .. } => codes::VALIDATION_ERROR,
            SyncError::NotEditable(_) => codes::NOT_EDITABLE,
            SyncError::NotFound(_) => codes::NOT_FOUND,
            SyncError::Storage(_) => codes::STORAGE_ERROR,
            SyncError::Config(_) => codes::CONFIG_ERROR,
            SyncError::Decode(_) => codes::DECODE_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether this failure came from talking to the backend.
    ///
    /// These are the failures that send reads to the fallback dataset and
    /// contact submissions to the local queue.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::Http { .. } | SyncError::Decode(_)
        )
    }

    /// Name of the field a validation error is about.
    pub fn field(&self) -> Option<&str> {
        match self {
            SyncError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            tracing::warn!("Backend error: {:?}", err);
            return SyncError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        if err.is_decode() {
            tracing::warn!("Backend decode error: {:?}", err);
            return SyncError::Decode(format!("Invalid backend response: {}", err));
        }
        tracing::warn!("Transport error: {:?}", err);
        SyncError::Transport(format!("Transport error: {}", err))
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::Transport(format!("Invalid request URL: {}", err))
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Storage error: {:?}", err);
        SyncError::Storage(format!("Storage error: {}", err))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        SyncError::Decode(format!("JSON error: {}", err))
    }
}

/// Non-fatal notice for the presentation layer.
///
/// Degraded-mode advisories never block rendering; validation and
/// not-editable advisories block only the write that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Advisory {
    /// Data was served from the fallback dataset
    Degraded { detail: String },
    /// Contact message was queued on this device
    SavedLocally,
    /// Contact message reached the backend
    Sent,
    /// Edit was accepted by the backend
    Saved { name: String },
    /// Edit attempted on a fallback-only record
    NotEditable,
    /// `repoTree` or another edited field failed validation
    InvalidInput { field: String, detail: String },
    /// Lookup found nothing in either source
    NotFound,
    /// Admin listing could not reach the backend
    LoadFailed,
    /// Write reached the backend and failed
    SaveFailed,
}

impl Advisory {
    /// Short headline for a toast or status line.
    pub fn title(&self) -> &'static str {
        match self {
            Advisory::Degraded { .. } | Advisory::SavedLocally => "Degraded mode",
            Advisory::Sent => "Message sent",
            Advisory::Saved { .. } => "Saved",
            Advisory::NotEditable => "Editing unavailable",
            Advisory::InvalidInput { .. } => "Invalid input",
            Advisory::NotFound => "Project not found",
            Advisory::LoadFailed | Advisory::SaveFailed => "Error",
        }
    }

    /// Longer explanation shown under the title.
    pub fn description(&self) -> String {
        match self {
            Advisory::Degraded { detail } => detail.clone(),
            Advisory::SavedLocally => "Message saved locally.".to_string(),
            Advisory::Sent => "I will get back to you as soon as possible.".to_string(),
            Advisory::Saved { name } => format!("Project \"{}\" updated.", name),
            Advisory::NotEditable => {
                "This project does not exist on the backend yet.".to_string()
            }
            Advisory::InvalidInput { field, detail } => format!("Check {}: {}", field, detail),
            Advisory::NotFound => {
                "The requested project does not exist or is not synchronized yet.".to_string()
            }
            Advisory::LoadFailed => "Unable to load projects.".to_string(),
            Advisory::SaveFailed => "Unable to save changes.".to_string(),
        }
    }

    /// Whether the advisory reports degraded-mode operation.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Advisory::Degraded { .. } | Advisory::SavedLocally)
    }

    /// Map a write-path error to what the user should see.
    pub fn for_write_error(err: &SyncError) -> Self {
        match err {
            SyncError::NotEditable(_) => Advisory::NotEditable,
            SyncError::Validation { field, message } => Advisory::InvalidInput {
                field: field.clone(),
                detail: message.clone(),
            },
            SyncError::NotFound(_) => Advisory::NotFound,
            _ => Advisory::SaveFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(SyncError::Transport("down".into()).is_transport());
        assert!(SyncError::Http {
            status: 502,
            message: "bad gateway".into()
        }
        .is_transport());
        assert!(!SyncError::validation("repoTree", "not an array").is_transport());
        assert!(!SyncError::NotEditable("x".into()).is_transport());
        assert!(!SyncError::NotFound("x".into()).is_transport());
    }

    #[test]
    fn test_validation_names_field() {
        let err = SyncError::validation("repoTree", "expected an array");
        assert_eq!(err.field(), Some("repoTree"));
        assert_eq!(err.error_code(), codes::VALIDATION_ERROR);
        assert!(err.message().contains("repoTree"));
    }

    #[test]
    fn test_write_error_advisories() {
        assert_eq!(
            Advisory::for_write_error(&SyncError::NotEditable("dotfiles".into())),
            Advisory::NotEditable
        );
        assert_eq!(
            Advisory::for_write_error(&SyncError::Transport("down".into())),
            Advisory::SaveFailed
        );
        let advisory = Advisory::for_write_error(&SyncError::validation("startedAt", "bad date"));
        assert!(advisory.description().contains("startedAt"));
        assert!(!advisory.is_degraded());
    }
}
