//! HTTP implementation of [`AnalysisApi`] against the lease analysis service.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{AnalysisApi, ApiError};
use crate::model::{
    AbnormalityReport, Change, ClientConfig, Project, RiskReport, Version, VersionSummary,
};

#[derive(Debug, Deserialize)]
struct ClausesResponse {
    #[serde(default)]
    clauses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    #[serde(default)]
    answer: String,
}

#[derive(Debug, Deserialize)]
struct DiffResponse {
    #[serde(default)]
    changes: Vec<Change>,
}

/// Client for the lease analysis service HTTP API
pub struct HttpAnalysisClient {
    client: Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("lease-intel-client/0.1")
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Self {
        Self::new(&ClientConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        resource: &str,
    ) -> Result<T, ApiError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(resource.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::UnexpectedStatus { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to deserialize {}: {}", resource, e)))
    }
}

#[async_trait]
impl AnalysisApi for HttpAnalysisClient {
    async fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, ApiError> {
        let url = self.url("/v1/projects");
        tracing::debug!(name = %name, "Creating project");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "name": name, "description": description }))
            .send()
            .await?;

        Self::decode(response, "project").await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response = self.client.get(self.url("/v1/projects")).send().await?;
        Self::decode(response, "projects").await
    }

    async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        let url = self.url(&format!("/v1/projects/{}", project_id));
        let response = self.client.get(&url).send().await?;
        Self::decode(response, project_id).await
    }

    async fn set_current_version(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Project, ApiError> {
        let url = self.url(&format!("/v1/projects/{}", project_id));
        tracing::debug!(project_id = %project_id, version_id = %version_id, "Promoting version");

        let response = self
            .client
            .patch(&url)
            .form(&[("current_version_id", version_id)])
            .send()
            .await?;

        Self::decode(response, project_id).await
    }

    async fn list_versions(&self, project_id: &str) -> Result<Vec<Version>, ApiError> {
        let url = self.url(&format!("/v1/projects/{}/versions", project_id));
        let response = self.client.get(&url).send().await?;
        Self::decode(response, project_id).await
    }

    async fn upload_version(
        &self,
        project_id: &str,
        label: Option<&str>,
        file_name: &str,
        file: Vec<u8>,
    ) -> Result<Version, ApiError> {
        let url = self.url(&format!("/v1/projects/{}/versions/upload", project_id));
        tracing::debug!(project_id = %project_id, label = ?label, bytes = file.len(), "Uploading version");

        let mut form = Form::new().part("file", Part::bytes(file).file_name(file_name.to_string()));
        if let Some(label) = label {
            form = form.text("label", label.to_string());
        }

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::decode(response, project_id).await
    }

    async fn version_summary(&self, version_id: &str) -> Result<VersionSummary, ApiError> {
        let url = self.url(&format!("/v1/versions/{}/status", version_id));
        let response = self.client.get(&url).send().await?;
        Self::decode(response, version_id).await
    }

    async fn fetch_risk(&self, version_id: &str) -> Result<RiskReport, ApiError> {
        let url = self.url(&format!("/v1/versions/{}/risk", version_id));
        let response = self.client.get(&url).send().await?;
        Self::decode(response, version_id).await
    }

    async fn fetch_abnormalities(
        &self,
        version_id: &str,
    ) -> Result<AbnormalityReport, ApiError> {
        let url = self.url(&format!("/v1/versions/{}/abnormalities", version_id));
        let response = self.client.get(&url).send().await?;
        Self::decode(response, version_id).await
    }

    async fn fetch_clauses(
        &self,
        version_id: &str,
        topic: &str,
    ) -> Result<Vec<String>, ApiError> {
        let url = self.url(&format!("/v1/versions/{}/clauses", version_id));
        tracing::debug!(version_id = %version_id, topic = %topic, "Fetching clauses");

        let response = self
            .client
            .post(&url)
            .form(&[("topic", topic)])
            .send()
            .await?;

        let body: ClausesResponse = Self::decode(response, topic).await?;
        Ok(body.clauses)
    }

    async fn ask(&self, version_id: &str, question: &str) -> Result<String, ApiError> {
        let url = self.url(&format!("/v1/versions/{}/ask", version_id));
        let response = self
            .client
            .post(&url)
            .form(&[("question", question)])
            .send()
            .await?;

        let body: AnswerResponse = Self::decode(response, version_id).await?;
        Ok(body.answer)
    }

    async fn compute_diff(
        &self,
        base_version_id: &str,
        compare_version_id: &str,
    ) -> Result<Vec<Change>, ApiError> {
        let url = self.url("/v1/diff");
        tracing::debug!(base = %base_version_id, compare = %compare_version_id, "Requesting diff");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("base_version_id", base_version_id),
                ("compare_version_id", compare_version_id),
            ])
            .send()
            .await?;

        let body: DiffResponse = Self::decode(response, "diff").await?;
        Ok(body.changes)
    }
}
