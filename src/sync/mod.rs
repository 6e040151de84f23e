//! Synchronization and degraded-mode fallback.
//!
//! Reads go to the backend first and fall back to the static dataset on any
//! transport failure, with a degraded-mode advisory attached. Writes never fall
//! back: project edits are validated locally and then either reach the backend
//! or fail visibly, while contact messages that cannot be delivered are queued
//! on the device.

mod normalize;
mod view;

pub use normalize::*;
pub use view::*;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::client::RemoteClient;
use crate::config::Config;
use crate::db::{init_database, ContactQueue, LocalStore};
use crate::errors::{Advisory, SyncError};
use crate::mock::{self, MockSource};
use crate::models::{
    language_options, ContactRequest, ContactSubmission, Profile, Project, ProjectQuery,
    ProjectUpdate, WriteAck,
};
use crate::source::ProjectSource;

type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SyncError>> + Send + 'a>>;

/// Where a read result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Backend,
    Fallback,
}

/// Read result plus the advisory to show alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct Sourced<T> {
    pub data: T,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<Advisory>,
}

impl<T> Sourced<T> {
    fn backend(data: T) -> Self {
        Self {
            data,
            origin: Origin::Backend,
            advisory: None,
        }
    }

    fn fallback(data: T, detail: &str) -> Self {
        Self {
            data,
            origin: Origin::Fallback,
            advisory: Some(Advisory::Degraded {
                detail: detail.to_string(),
            }),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

/// Entry point for every data operation the site performs.
pub struct SyncService {
    remote: Arc<RemoteClient>,
    primary: Arc<dyn ProjectSource>,
    mock: Arc<MockSource>,
    fallback: Arc<dyn ProjectSource>,
    outbox: ContactQueue,
}

impl SyncService {
    /// Create a service over a backend client and a local contact queue, with
    /// the built-in dataset as fallback.
    pub fn new(remote: RemoteClient, outbox: ContactQueue) -> Self {
        let remote = Arc::new(remote);
        let mock = Arc::new(MockSource::default());
        Self {
            primary: remote.clone(),
            remote,
            fallback: mock.clone(),
            mock,
            outbox,
        }
    }

    /// Replace the fallback dataset.
    pub fn with_fallback(mut self, mock: MockSource) -> Self {
        let mock = Arc::new(mock);
        self.fallback = mock.clone();
        self.mock = mock;
        self
    }

    /// Open local storage and build the backend client from configuration.
    pub async fn from_config(config: &Config) -> Result<Self, SyncError> {
        if config.backend_url.is_none() {
            tracing::warn!(
                "No backend configured (PORTFOLIO_BACKEND_URL). Every request will use fallback data!"
            );
        }
        let remote = RemoteClient::new(config.backend_url.clone())?;
        let pool = init_database(&config.store_path).await?;
        let outbox = ContactQueue::new(LocalStore::new(pool));
        Ok(Self::new(remote, outbox))
    }

    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    /// The site owner's profile.
    pub fn profile(&self) -> &'static Profile {
        mock::profile()
    }

    /// Try the backend, then the fallback source if the backend is unreachable.
    async fn resolve<'a, T, F>(
        &'a self,
        operation: &'static str,
        detail: &str,
        read: F,
    ) -> Result<Sourced<T>, SyncError>
    where
        F: Fn(&'a dyn ProjectSource) -> SourceFuture<'a, T>,
    {
        match read(self.primary.as_ref()).await {
            Ok(data) => Ok(Sourced::backend(data)),
            Err(err) if err.is_transport() => {
                tracing::warn!(
                    "{} unavailable from {} ({}), using {} data",
                    operation,
                    self.primary.label(),
                    err,
                    self.fallback.label()
                );
                let data = read(self.fallback.as_ref()).await?;
                Ok(Sourced::fallback(data, detail))
            }
            Err(err) => Err(err),
        }
    }

    /// List projects matching a filter.
    pub async fn list_projects(
        &self,
        query: &ProjectQuery,
    ) -> Result<Sourced<Vec<Project>>, SyncError> {
        self.resolve(
            "list_projects",
            "Projects loaded from the fallback dataset.",
            |source| source.list_projects(query),
        )
        .await
    }

    /// List featured projects for the home page.
    pub async fn list_featured(&self) -> Result<Sourced<Vec<Project>>, SyncError> {
        self.resolve(
            "list_featured",
            "Featured projects loaded from the fallback dataset.",
            |source| source.list_featured(),
        )
        .await
    }

    /// Fetch one project by id, or by name as a compatibility key.
    ///
    /// Yields `NotFound` when the backend is unreachable and the fallback
    /// dataset has no matching record.
    pub async fn get_project(&self, key: &str) -> Result<Sourced<Project>, SyncError> {
        self.resolve(
            "get_project",
            "Details loaded from the fallback dataset.",
            |source| source.get_project(key),
        )
        .await
    }

    /// Options for the language selector, taken from the fallback dataset when `items` is empty.
    pub fn language_options(&self, items: &[Project]) -> Vec<String> {
        if items.is_empty() {
            language_options(self.mock.projects())
        } else {
            language_options(items)
        }
    }

    /// Projects for the admin screen.
    ///
    /// Never falls back: fallback records cannot be edited.
    pub async fn admin_projects(&self, q: &str) -> Result<Vec<Project>, SyncError> {
        let query = ProjectQuery::new().with_q(q);
        self.remote.list_projects(&query).await.map_err(|err| {
            tracing::warn!("Failed to load projects for editing: {}", err);
            err
        })
    }

    /// Save every editable field of a project, then re-read it from the backend.
    pub async fn update_project(
        &self,
        project: &Project,
        form: &ProjectForm,
    ) -> Result<Project, SyncError> {
        self.save(project, || form.normalize()).await
    }

    /// Save a project's narrative and repo tree, then re-read it from the backend.
    pub async fn update_details(
        &self,
        project: &Project,
        form: &DetailsForm,
    ) -> Result<Project, SyncError> {
        self.save(project, || form.normalize()).await
    }

    async fn save<N>(&self, project: &Project, normalize: N) -> Result<Project, SyncError>
    where
        N: FnOnce() -> Result<ProjectUpdate, SyncError>,
    {
        let Some(id) = project.editable_id() else {
            tracing::debug!("Rejecting edit of '{}': no backend id", project.name);
            return Err(SyncError::NotEditable(project.name.clone()));
        };

        let update = normalize().map_err(|err| {
            tracing::debug!("Rejecting edit of '{}': {}", project.name, err);
            err
        })?;

        self.remote.update_project(id, &update).await.map_err(|err| {
            tracing::error!("Failed to save project {}: {}", id, err);
            err
        })?;

        // The acknowledgment is not the final state; read it back
        let refreshed = self.remote.get_project(id).await.map_err(|err| {
            tracing::error!("Saved project {} but failed to reload it: {}", id, err);
            err
        })?;
        tracing::info!("Project {} updated", id);
        Ok(refreshed)
    }

    /// Create one project on the backend.
    pub async fn create_project(&self, project: &Project) -> Result<WriteAck, SyncError> {
        validate_new_project(project)?;
        self.remote.create_project(project).await
    }

    /// Create several projects in one request.
    pub async fn create_projects(&self, projects: &[Project]) -> Result<WriteAck, SyncError> {
        for project in projects {
            validate_new_project(project)?;
        }
        self.remote.create_projects(projects).await
    }

    /// Push the fallback dataset to the backend.
    ///
    /// Running this twice inserts the records twice unless the backend rejects duplicates.
    pub async fn seed_from_mock(&self) -> Result<WriteAck, SyncError> {
        let ack = self.create_projects(self.mock.projects()).await?;
        tracing::info!("Seeded backend with {} projects", self.mock.projects().len());
        Ok(ack)
    }

    /// Send a contact message, queueing it on this device if the backend is unreachable.
    pub async fn submit_contact(&self, request: ContactRequest) -> Result<Advisory, SyncError> {
        request.validate()?;

        match self.remote.submit_contact(&request).await {
            Ok(_) => Ok(Advisory::Sent),
            Err(err) if err.is_transport() => {
                tracing::warn!("Contact submission failed ({}), saving locally", err);
                self.outbox
                    .append(ContactSubmission::from_request(request, Utc::now()))
                    .await?;
                Ok(Advisory::SavedLocally)
            }
            Err(err) => Err(err),
        }
    }

    /// Contact messages queued on this device.
    pub async fn outbox(&self) -> Result<Vec<ContactSubmission>, SyncError> {
        self.outbox.read_all().await
    }
}

fn validate_new_project(project: &Project) -> Result<(), SyncError> {
    if project.name.trim().is_empty() {
        return Err(SyncError::validation("name", "name is required"));
    }
    if project.url.trim().is_empty() {
        return Err(SyncError::validation(
            "url",
            format!("url is required for '{}'", project.name),
        ));
    }
    Ok(())
}
