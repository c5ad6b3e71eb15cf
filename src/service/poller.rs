//! Version status polling.
//!
//! Each watched version gets its own scheduled task: an immediate fetch,
//! then one per interval tick until the status turns terminal or the task
//! is stopped. Snapshots are published through a watch channel, so
//! subscribers always see the latest one without queueing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::{AnalysisApi, ApiError};
use crate::model::{ClientConfig, VersionSummary};

/// Latest observation of a version's analysis state.
#[derive(Debug, Clone)]
pub struct PollSnapshot {
    pub version_id: String,
    pub summary: VersionSummary,
    pub observed_at: DateTime<Utc>,
}

struct PollTask {
    handle: JoinHandle<()>,
    rx: watch::Receiver<Option<PollSnapshot>>,
}

pub struct VersionStatusPoller {
    api: Arc<dyn AnalysisApi>,
    interval: Duration,
    active: HashMap<String, PollTask>,
}

impl VersionStatusPoller {
    pub fn new(api: Arc<dyn AnalysisApi>, config: &ClientConfig) -> Self {
        Self {
            api,
            interval: config.poll_interval,
            active: HashMap::new(),
        }
    }

    /// Begin polling a version. The first fetch happens immediately, then
    /// once per interval until a terminal status is observed or
    /// [`stop_polling`](Self::stop_polling) is called.
    ///
    /// Starting a version that is already being polled does not spawn a
    /// second task; the existing subscription is returned instead.
    pub fn start_polling(&mut self, version_id: &str) -> watch::Receiver<Option<PollSnapshot>> {
        if let Some(task) = self.active.get(version_id) {
            if !task.handle.is_finished() {
                return task.rx.clone();
            }
        }

        let (tx, rx) = watch::channel(None);
        let api = Arc::clone(&self.api);
        let id = version_id.to_string();
        let every = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_error: Option<String> = None;

            loop {
                ticker.tick().await;

                match api.version_summary(&id).await {
                    Ok(summary) => {
                        last_error = None;
                        let terminal = summary.status.is_terminal();
                        let snapshot = PollSnapshot {
                            version_id: id.clone(),
                            summary,
                            observed_at: Utc::now(),
                        };
                        // The poller keeps a receiver for the task's whole
                        // lifetime, so the channel cannot be closed here.
                        tx.send_replace(Some(snapshot));
                        if terminal {
                            tracing::debug!(version_id = %id, "Terminal status observed, polling stopped");
                            break;
                        }
                    }
                    Err(e) if e.is_transient() => {
                        // Swallowed; the next tick retries. Log once per
                        // distinct failure so a flapping server does not
                        // flood the log.
                        let msg = e.to_string();
                        if last_error.as_deref() != Some(msg.as_str()) {
                            tracing::warn!(version_id = %id, error = %msg, "Status poll failed, will retry");
                            last_error = Some(msg);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(version_id = %id, error = %e, "Status poll failed permanently");
                        break;
                    }
                }
            }
        });

        self.active.insert(
            version_id.to_string(),
            PollTask {
                handle,
                rx: rx.clone(),
            },
        );
        rx
    }

    /// Cancel polling for a version. Calling this for a version that is not
    /// being polled is a no-op.
    pub fn stop_polling(&mut self, version_id: &str) {
        if let Some(task) = self.active.remove(version_id) {
            task.handle.abort();
            tracing::debug!(version_id = %version_id, "Polling stopped");
        }
    }

    /// Cancel every active poll. Called on session disposal.
    pub fn stop_all(&mut self) {
        for (version_id, task) in self.active.drain() {
            task.handle.abort();
            tracing::debug!(version_id = %version_id, "Polling stopped");
        }
    }

    /// Whether a poll task is still running for this version.
    pub fn is_polling(&self, version_id: &str) -> bool {
        self.active
            .get(version_id)
            .map(|t| !t.handle.is_finished())
            .unwrap_or(false)
    }

    /// The latest snapshot observed for a version, if any poll succeeded.
    pub fn latest(&self, version_id: &str) -> Option<PollSnapshot> {
        self.active
            .get(version_id)
            .and_then(|t| t.rx.borrow().clone())
    }

    /// One-shot fetch outside the polling schedule, for use after a
    /// terminal status has already stopped the recurring task.
    pub async fn refresh(&self, version_id: &str) -> Result<VersionSummary, ApiError> {
        self.api.version_summary(version_id).await
    }
}

impl Drop for VersionStatusPoller {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::client::testing::MockApi;
    use crate::model::VersionStatus;

    fn summary(status: VersionStatus, progress: Option<u8>) -> VersionSummary {
        VersionSummary {
            status,
            stage: None,
            progress,
            risk: None,
            abnormalities: None,
        }
    }

    fn poller(api: &Arc<MockApi>, interval_ms: u64) -> VersionStatusPoller {
        let config = ClientConfig {
            poll_interval: Duration::from_millis(interval_ms),
            ..ClientConfig::default()
        };
        VersionStatusPoller::new(api.clone() as Arc<dyn AnalysisApi>, &config)
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_terminal_then_stops() {
        let api = Arc::new(MockApi::new());
        api.push_summary(Ok(summary(VersionStatus::Pending, Some(5))));
        api.push_summary(Ok(summary(VersionStatus::Processing, Some(60))));
        api.push_summary(Ok(summary(VersionStatus::Complete, Some(100))));

        let mut poller = poller(&api, 100);
        let mut rx = poller.start_polling("v1");

        // First fetch is immediate.
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().summary.status, VersionStatus::Pending);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().summary.status, VersionStatus::Processing);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().summary.status, VersionStatus::Complete);

        // Terminal: no further polls even as time advances.
        let calls_at_terminal = api.summary_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(api.summary_calls.load(Ordering::SeqCst), calls_at_terminal);
        assert!(!poller.is_polling("v1"));

        // The last snapshot stays readable after the task ends.
        let latest = poller.latest("v1").unwrap();
        assert_eq!(latest.summary.status, VersionStatus::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_analysis_is_terminal() {
        let api = Arc::new(MockApi::new());
        api.push_summary(Ok(summary(VersionStatus::Failed, None)));

        let mut poller = poller(&api, 100);
        let mut rx = poller.start_polling("v1");

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().summary.status, VersionStatus::Failed);

        let calls = api.summary_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(api.summary_calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried() {
        let api = Arc::new(MockApi::new());
        api.push_summary(Err(ApiError::UnexpectedStatus {
            status: 503,
            body: "unavailable".to_string(),
        }));
        api.push_summary(Err(ApiError::Parse("truncated body".to_string())));
        api.push_summary(Ok(summary(VersionStatus::Complete, Some(100))));

        let mut poller = poller(&api, 100);
        let mut rx = poller.start_polling("v1");

        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone().unwrap();
        assert_eq!(snapshot.summary.status, VersionStatus::Complete);
        assert!(api.summary_calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn never_emits_a_transition_out_of_terminal() {
        let api = Arc::new(MockApi::new());
        api.push_summary(Ok(summary(VersionStatus::Complete, Some(100))));
        // Script a bogus regression; the poller must never fetch it.
        api.push_summary(Ok(summary(VersionStatus::Processing, Some(50))));

        let mut poller = poller(&api, 100);
        let mut rx = poller.start_polling("v1");

        rx.changed().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(rx.borrow().as_ref().unwrap().summary.status, VersionStatus::Complete);
        // Sender is gone or unchanged either way; no later value exists.
        assert!(!rx.has_changed().unwrap_or(false));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_polling_is_idempotent() {
        let api = Arc::new(MockApi::new());
        api.push_summary(Ok(summary(VersionStatus::Pending, None)));

        let mut poller = poller(&api, 100);
        let _rx = poller.start_polling("v1");
        tokio::time::sleep(Duration::from_millis(10)).await;

        poller.stop_polling("v1");
        poller.stop_polling("v1");
        poller.stop_polling("never-started");
        assert!(!poller.is_polling("v1"));
    }

    #[tokio::test(start_paused = true)]
    async fn starting_twice_reuses_the_task() {
        let api = Arc::new(MockApi::new());
        api.push_summary(Ok(summary(VersionStatus::Pending, None)));

        let mut poller = poller(&api, 100);
        let mut rx1 = poller.start_polling("v1");
        rx1.changed().await.unwrap();
        let calls = api.summary_calls.load(Ordering::SeqCst);

        let _rx2 = poller.start_polling("v1");
        // No immediate extra fetch from a duplicate task.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.summary_calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_fetches_after_terminal() {
        let api = Arc::new(MockApi::new());
        api.push_summary(Ok(summary(VersionStatus::Complete, Some(100))));

        let mut poller = poller(&api, 100);
        let mut rx = poller.start_polling("v1");
        rx.changed().await.unwrap();

        // Manual refresh repeats the last scripted summary.
        let refreshed = poller.refresh("v1").await.unwrap();
        assert_eq!(refreshed.status, VersionStatus::Complete);
    }
}
