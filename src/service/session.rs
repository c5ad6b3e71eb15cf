//! Per-session orchestrator.
//!
//! One `AnalysisSession` per user view: it owns the project/version store,
//! the status poller, the clause cache and the diff consumer, and it holds
//! the authoritative risk/abnormality copies for the version on display.
//! `dispose` cancels every recurring task so nothing outlives the view.

use std::sync::Arc;

use tokio::sync::watch;

use crate::client::{AnalysisApi, ApiError};
use crate::model::{Abnormality, ClientConfig, RiskAssessment, VersionStatus};
use crate::service::clauses::ClauseCache;
use crate::service::diff::DiffService;
use crate::service::poller::{PollSnapshot, VersionStatusPoller};
use crate::service::store::ProjectVersionStore;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct AnalysisSession {
    api: Arc<dyn AnalysisApi>,
    store: ProjectVersionStore,
    poller: VersionStatusPoller,
    clauses: ClauseCache,
    diff: DiffService,
    risk: Option<RiskAssessment>,
    abnormalities: Option<Vec<Abnormality>>,
}

impl AnalysisSession {
    pub fn new(api: Arc<dyn AnalysisApi>, config: &ClientConfig) -> Self {
        Self {
            store: ProjectVersionStore::new(Arc::clone(&api)),
            poller: VersionStatusPoller::new(Arc::clone(&api), config),
            clauses: ClauseCache::new(Arc::clone(&api)),
            diff: DiffService::new(Arc::clone(&api)),
            api,
            risk: None,
            abnormalities: None,
        }
    }

    pub fn store(&self) -> &ProjectVersionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProjectVersionStore {
        &mut self.store
    }

    pub fn clauses(&self) -> &ClauseCache {
        &self.clauses
    }

    pub fn diff(&self) -> &DiffService {
        &self.diff
    }

    pub fn poller_mut(&mut self) -> &mut VersionStatusPoller {
        &mut self.poller
    }

    /// The authoritative risk mapping for the displayed version, if loaded.
    pub fn risk(&self) -> Option<&RiskAssessment> {
        self.risk.as_ref()
    }

    pub fn abnormalities(&self) -> Option<&[Abnormality]> {
        self.abnormalities.as_deref()
    }

    /// Start watching a version's analysis. Snapshots arrive on the
    /// returned channel; feed them back through
    /// [`apply_snapshot`](Self::apply_snapshot) to keep the session's
    /// analysis copies current.
    pub fn watch_version(
        &mut self,
        version_id: &str,
    ) -> watch::Receiver<Option<PollSnapshot>> {
        self.poller.start_polling(version_id)
    }

    /// Absorb a poll snapshot. A `complete` summary carries the
    /// authoritative analysis payloads; they overwrite whatever stale
    /// copies the session held.
    pub fn apply_snapshot(&mut self, snapshot: &PollSnapshot) {
        if snapshot.summary.status != VersionStatus::Complete {
            return;
        }
        if let Some(risk) = &snapshot.summary.risk {
            self.risk = Some(risk.clone());
        }
        if let Some(abnormalities) = &snapshot.summary.abnormalities {
            self.abnormalities = Some(abnormalities.clone());
        }
    }

    /// Load the analysis payloads through the standalone endpoints, for
    /// versions that completed before this session started watching them.
    pub async fn load_analysis(&mut self, version_id: &str) -> Result<(), ApiError> {
        let risk = self.api.fetch_risk(version_id).await?;
        let abnormalities = self.api.fetch_abnormalities(version_id).await?;
        self.risk = Some(risk.payload);
        self.abnormalities = Some(abnormalities.payload);
        Ok(())
    }

    /// Free-form question against a version. The question must be
    /// non-empty; validation happens before any network call.
    pub async fn ask(&self, version_id: &str, question: &str) -> Result<String, SessionError> {
        if question.trim().is_empty() {
            return Err(SessionError::Validation(
                "Question must not be empty".to_string(),
            ));
        }
        Ok(self.api.ask(version_id, question).await?)
    }

    /// Tear the session down: cancel all polling and drop cached state.
    /// Safe to call more than once.
    pub fn dispose(&mut self) {
        self.poller.stop_all();
        self.risk = None;
        self.abnormalities = None;
        tracing::debug!("Analysis session disposed");
    }
}
