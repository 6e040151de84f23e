//! HTTP client for the portfolio backend.
//!
//! A thin wrapper over `reqwest`: no retries, no caching, no deadline beyond the
//! transport's own. A client built without a base URL fails every call.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::errors::SyncError;
use crate::models::{
    ContactReceipt, ContactRequest, Project, ProjectList, ProjectQuery, ProjectUpdate, WriteAck,
};
use crate::source::ProjectSource;

/// REST client for `{base}/api/projects` and `{base}/api/contact`.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http_client: HttpClient,
    base_url: Option<Url>,
}

impl RemoteClient {
    /// Create a client; `None` yields a client whose every call fails.
    pub fn new(base_url: Option<Url>) -> Result<Self, SyncError> {
        let http_client = HttpClient::builder()
            .user_agent(concat!("portfolio-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Create a client that is not connected to any backend.
    pub fn unconfigured() -> Result<Self, SyncError> {
        Self::new(None)
    }

    /// Get the base URL
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// GET /api/projects?q&lang&sort
    pub async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, SyncError> {
        let mut url = self.endpoint(&["projects"])?;
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        let list: ProjectList = self.get(url).await?;
        Ok(list.items)
    }

    /// GET /api/projects/featured
    pub async fn list_featured(&self) -> Result<Vec<Project>, SyncError> {
        let list: ProjectList = self.get(self.endpoint(&["projects", "featured"])?).await?;
        Ok(list.items)
    }

    /// GET /api/projects/{id}
    pub async fn get_project(&self, id: &str) -> Result<Project, SyncError> {
        self.get(self.endpoint(&["projects", id])?).await
    }

    /// PUT /api/projects/{id}
    pub async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<WriteAck, SyncError> {
        let url = self.endpoint(&["projects", id])?;
        tracing::debug!(%url, "PUT");
        let response = self.http_client.put(url).json(update).send().await?;
        read_json(response).await
    }

    /// POST /api/projects with a single project.
    pub async fn create_project(&self, project: &Project) -> Result<WriteAck, SyncError> {
        self.post(self.endpoint(&["projects"])?, project).await
    }

    /// POST /api/projects with a batch of projects.
    pub async fn create_projects(&self, projects: &[Project]) -> Result<WriteAck, SyncError> {
        self.post(self.endpoint(&["projects"])?, &projects).await
    }

    /// POST /api/contact
    ///
    /// Only success matters; an unreadable acknowledgment body is ignored.
    pub async fn submit_contact(
        &self,
        request: &ContactRequest,
    ) -> Result<ContactReceipt, SyncError> {
        let url = self.endpoint(&["contact"])?;
        tracing::debug!(%url, "POST");
        let response = self.http_client.post(url).json(request).send().await?;
        let body = read_body(response).await?;
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    /// Build `{base}/api/{segments...}`; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SyncError> {
        let mut url = self
            .base_url
            .clone()
            .ok_or_else(|| SyncError::Transport("Backend URL is not configured".to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::Transport("Backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, SyncError> {
        tracing::debug!(%url, "GET");
        let response = self.http_client.get(url).send().await?;
        read_json(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, SyncError> {
        tracing::debug!(%url, "POST");
        let response = self.http_client.post(url).json(body).send().await?;
        read_json(response).await
    }
}

/// Read a 2xx body as text; any other status becomes an HTTP error.
async fn read_body(response: Response) -> Result<String, SyncError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(SyncError::Http {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
    let body = read_body(response).await?;
    serde_json::from_str(&body)
        .map_err(|e| SyncError::Decode(format!("Invalid backend response: {}", e)))
}

#[async_trait]
impl ProjectSource for RemoteClient {
    fn label(&self) -> &'static str {
        "backend"
    }

    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, SyncError> {
        RemoteClient::list_projects(self, query).await
    }

    async fn list_featured(&self) -> Result<Vec<Project>, SyncError> {
        RemoteClient::list_featured(self).await
    }

    async fn get_project(&self, key: &str) -> Result<Project, SyncError> {
        RemoteClient::get_project(self, key).await
    }
}
