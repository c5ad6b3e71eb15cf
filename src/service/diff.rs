//! Consumer side of the diff engine.
//!
//! The server computes and orders the changes; this service validates the
//! inputs before the request and the record shapes after it, and otherwise
//! passes the sequence through untouched. Reordering or deduplicating here
//! would silently desynchronize the display from the server's numbering.

use std::sync::Arc;

use crate::client::{AnalysisApi, ApiError};
use crate::model::Change;

#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Change {index} is malformed: {reason}")]
    MalformedChange { index: usize, reason: &'static str },

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct DiffService {
    api: Arc<dyn AnalysisApi>,
}

impl DiffService {
    pub fn new(api: Arc<dyn AnalysisApi>) -> Self {
        Self { api }
    }

    /// Request the structured diff between two versions of the same project.
    ///
    /// Both ids must be non-empty; the check happens before any network
    /// call. The returned changes keep the server's order verbatim.
    pub async fn compute_diff(
        &self,
        base_version_id: &str,
        compare_version_id: &str,
    ) -> Result<Vec<Change>, DiffError> {
        if base_version_id.trim().is_empty() {
            return Err(DiffError::InvalidArgument(
                "A base version must be selected".to_string(),
            ));
        }
        if compare_version_id.trim().is_empty() {
            return Err(DiffError::InvalidArgument(
                "A compare version must be selected".to_string(),
            ));
        }

        let changes = self
            .api
            .compute_diff(base_version_id, compare_version_id)
            .await?;

        for (index, change) in changes.iter().enumerate() {
            if let Some(reason) = change.shape_violation() {
                return Err(DiffError::MalformedChange { index, reason });
            }
        }

        tracing::debug!(
            base = %base_version_id,
            compare = %compare_version_id,
            changes = changes.len(),
            "Diff computed"
        );
        Ok(changes)
    }
}
