//! In-memory view of a project and its versions.
//!
//! The server owns the data; this store only mirrors what it last returned
//! and mediates the two mutations the interface offers: uploading a new
//! version and promoting one to current. Version status is never written
//! here, only read back from the service.

use std::sync::Arc;

use crate::client::{AnalysisApi, ApiError};
use crate::model::{Project, Version};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Version {version_id} does not belong to project {project_id}")]
    InvalidReference {
        project_id: String,
        version_id: String,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn map_not_found(err: ApiError, id: &str) -> StoreError {
    match err {
        ApiError::NotFound(_) => StoreError::NotFound(id.to_string()),
        other => StoreError::Api(other),
    }
}

pub struct ProjectVersionStore {
    api: Arc<dyn AnalysisApi>,
    project: Option<Project>,
    versions: Vec<Version>,
}

impl ProjectVersionStore {
    pub fn new(api: Arc<dyn AnalysisApi>) -> Self {
        Self {
            api,
            project: None,
            versions: Vec::new(),
        }
    }

    /// The last project snapshot seen from the server, if any.
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// The last version list seen from the server, in server order.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn current_version_id(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|p| p.current_version_id.as_deref())
    }

    /// Create a new project. The name must contain at least one
    /// non-whitespace character; validation happens before any network call.
    pub async fn create_project(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation(
                "Project name must not be empty".to_string(),
            ));
        }

        let project = self.api.create_project(name, description).await?;
        tracing::info!(project_id = %project.id, "Created project");

        self.project = Some(project.clone());
        self.versions.clear();
        Ok(project)
    }

    /// Load a project and its versions into the store.
    pub async fn open_project(&mut self, project_id: &str) -> Result<Project, StoreError> {
        let project = self
            .api
            .get_project(project_id)
            .await
            .map_err(|e| map_not_found(e, project_id))?;
        self.project = Some(project.clone());
        self.list_versions(project_id).await?;
        Ok(project)
    }

    /// Refresh and return the project's versions, in the order the server
    /// returned them.
    pub async fn list_versions(&mut self, project_id: &str) -> Result<&[Version], StoreError> {
        self.versions = self
            .api
            .list_versions(project_id)
            .await
            .map_err(|e| map_not_found(e, project_id))?;
        Ok(&self.versions)
    }

    /// Upload a new document revision. Does not wait for analysis; the
    /// version list is refreshed so the new version is visible immediately.
    pub async fn upload_version(
        &mut self,
        project_id: &str,
        label: Option<&str>,
        file_name: &str,
        file: Vec<u8>,
    ) -> Result<Version, StoreError> {
        let label = label.map(str::trim).filter(|l| !l.is_empty());
        let version = self
            .api
            .upload_version(project_id, label, file_name, file)
            .await
            .map_err(|e| map_not_found(e, project_id))?;

        tracing::info!(project_id = %project_id, version_id = %version.id, "Uploaded version");

        self.list_versions(project_id).await?;
        Ok(version)
    }

    /// Promote a version to current. The version must be among the
    /// project's versions; on `InvalidReference` the current version id is
    /// left untouched and no mutation is sent.
    pub async fn promote(
        &mut self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Project, StoreError> {
        self.list_versions(project_id).await?;
        if !self.versions.iter().any(|v| v.id == version_id) {
            return Err(StoreError::InvalidReference {
                project_id: project_id.to_string(),
                version_id: version_id.to_string(),
            });
        }

        let project = self
            .api
            .set_current_version(project_id, version_id)
            .await
            .map_err(|e| map_not_found(e, project_id))?;

        tracing::info!(project_id = %project_id, version_id = %version_id, "Promoted version to current");

        self.project = Some(project.clone());
        Ok(project)
    }
}
