//! Typed access to the remote lease analysis service.
//!
//! Everything the crate knows about leases comes through [`AnalysisApi`];
//! the orchestration layers never touch HTTP directly, which also keeps
//! them testable against scripted in-memory implementations.

mod http;

use async_trait::async_trait;

pub use http::HttpAnalysisClient;

use crate::model::{
    AbnormalityReport, Change, Project, RiskReport, Version, VersionSummary,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether a retry on the next poll tick can reasonably succeed.
    ///
    /// Network failures, server errors and malformed bodies are transient;
    /// a missing resource or a client-side rejection is not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http(_) | ApiError::Parse(_) => true,
            ApiError::UnexpectedStatus { status, .. } => *status >= 500,
            ApiError::NotFound(_) => false,
        }
    }
}

/// Outbound contract of the lease analysis service.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, ApiError>;

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn get_project(&self, project_id: &str) -> Result<Project, ApiError>;

    /// Designate `version_id` as the project's current version.
    async fn set_current_version(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Project, ApiError>;

    async fn list_versions(&self, project_id: &str) -> Result<Vec<Version>, ApiError>;

    /// Upload a new document revision. Returns as soon as the server has
    /// registered the version; analysis continues asynchronously.
    async fn upload_version(
        &self,
        project_id: &str,
        label: Option<&str>,
        file_name: &str,
        file: Vec<u8>,
    ) -> Result<Version, ApiError>;

    /// Fetch the status/summary snapshot for a version. Analysis payloads
    /// are bundled into the response once the version is complete.
    async fn version_summary(&self, version_id: &str) -> Result<VersionSummary, ApiError>;

    async fn fetch_risk(&self, version_id: &str) -> Result<RiskReport, ApiError>;

    async fn fetch_abnormalities(&self, version_id: &str)
        -> Result<AbnormalityReport, ApiError>;

    async fn fetch_clauses(
        &self,
        version_id: &str,
        topic: &str,
    ) -> Result<Vec<String>, ApiError>;

    async fn ask(&self, version_id: &str, question: &str) -> Result<String, ApiError>;

    async fn compute_diff(
        &self,
        base_version_id: &str,
        compare_version_id: &str,
    ) -> Result<Vec<Change>, ApiError>;
}
