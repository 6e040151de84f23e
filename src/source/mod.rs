//! Read-side data source abstraction.
//!
//! The backend client and the static fallback dataset both implement
//! [`ProjectSource`]; the sync layer tries one and substitutes the other.

use async_trait::async_trait;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::errors::SyncError;
use crate::models::{Project, ProjectQuery};

/// Characters left unescaped in a URL component (same set browsers keep in `encodeURIComponent`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A place projects can be read from.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Short label used in logs.
    fn label(&self) -> &'static str;

    /// List projects matching a filter; an empty filter lists everything.
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, SyncError>;

    /// List projects flagged as featured.
    async fn list_featured(&self) -> Result<Vec<Project>, SyncError>;

    /// Fetch one project by its lookup key.
    async fn get_project(&self, key: &str) -> Result<Project, SyncError>;
}

/// URL slug for a project name, used as a secondary lookup key.
pub fn project_slug(name: &str) -> String {
    utf8_percent_encode(name, COMPONENT).to_string()
}

/// Decode a percent-encoded lookup key; keys that do not decode as UTF-8 are used as-is.
pub fn decode_key(key: &str) -> String {
    percent_decode_str(key)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| key.to_string())
}

/// Whether `key` is the project's backend id, the canonical lookup key.
pub fn id_matches(project: &Project, key: &str) -> bool {
    project.id.as_deref() == Some(key)
}

/// Whether `key` names the project, raw or slugged.
///
/// Kept so links built from project names keep resolving.
pub fn name_matches(project: &Project, key: &str) -> bool {
    project.name == decode_key(key) || project_slug(&project.name) == key
}
