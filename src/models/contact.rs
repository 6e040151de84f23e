//! Contact form models.

use serde::{Deserialize, Serialize};

use crate::errors::SyncError;

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    /// Check the fields the contact form marks as required.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::validation("name", "name is required"));
        }
        if self.email.trim().is_empty() {
            return Err(SyncError::validation("email", "email is required"));
        }
        if !self.email.contains('@') {
            return Err(SyncError::validation(
                "email",
                format!("'{}' is not an email address", self.email),
            ));
        }
        if self.message.trim().is_empty() {
            return Err(SyncError::validation("message", "message is required"));
        }
        Ok(())
    }
}

/// A contact message queued on this device because the backend was unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
    /// Milliseconds since the Unix epoch at queue time
    pub id: i64,
    /// RFC 3339 timestamp at queue time
    pub date: String,
}

impl ContactSubmission {
    pub fn from_request(request: ContactRequest, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            name: request.name,
            email: request.email,
            message: request.message,
            id: now.timestamp_millis(),
            date: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// Backend acknowledgment of a contact message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}
