//! Per-topic clause cache.
//!
//! A topic is visible when the cache holds a non-empty clause list for it.
//! Toggling a visible topic evicts it without a network call; toggling an
//! absent topic fetches it. The loading set is the mutual exclusion for
//! in-flight fetches: a toggle for a topic that is already loading is
//! ignored, while unrelated topics may load concurrently.
//!
//! An empty fetch result is never cached; it only clears the loading flag,
//! so the next toggle for that topic fetches again.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::{AnalysisApi, ApiError};

/// Outcome of a [`ClauseCache::toggle`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseToggle {
    /// Fetched and now visible.
    Shown(Vec<String>),
    /// Fetched, but the service found nothing for the topic; not cached.
    Empty,
    /// Evicted from the cache without a network call.
    Hidden,
    /// A fetch for this topic is already outstanding; request ignored.
    AlreadyLoading,
}

#[derive(Default)]
struct CacheState {
    shown: HashMap<String, Vec<String>>,
    loading: HashSet<String>,
}

pub struct ClauseCache {
    api: Arc<dyn AnalysisApi>,
    state: Mutex<CacheState>,
}

impl ClauseCache {
    pub fn new(api: Arc<dyn AnalysisApi>) -> Self {
        Self {
            api,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Show or hide the clauses for a topic.
    ///
    /// A fetch failure clears the loading flag and propagates the error;
    /// the topic stays absent so the user can retry.
    pub async fn toggle(&self, version_id: &str, topic: &str) -> Result<ClauseToggle, ApiError> {
        {
            let mut state = self.state.lock().await;
            if state.shown.remove(topic).is_some() {
                tracing::debug!(topic = %topic, "Clauses hidden");
                return Ok(ClauseToggle::Hidden);
            }
            if !state.loading.insert(topic.to_string()) {
                tracing::debug!(topic = %topic, "Clause fetch already in flight, ignoring");
                return Ok(ClauseToggle::AlreadyLoading);
            }
        }

        let result = self.api.fetch_clauses(version_id, topic).await;

        let mut state = self.state.lock().await;
        state.loading.remove(topic);

        match result {
            Ok(clauses) if clauses.is_empty() => {
                tracing::debug!(topic = %topic, "No clauses found for topic");
                Ok(ClauseToggle::Empty)
            }
            Ok(clauses) => {
                state.shown.insert(topic.to_string(), clauses.clone());
                Ok(ClauseToggle::Shown(clauses))
            }
            Err(e) => {
                tracing::warn!(topic = %topic, error = %e, "Clause fetch failed");
                Err(e)
            }
        }
    }

    /// The visible clauses for a topic, if any.
    pub async fn visible(&self, topic: &str) -> Option<Vec<String>> {
        self.state.lock().await.shown.get(topic).cloned()
    }

    pub async fn is_loading(&self, topic: &str) -> bool {
        self.state.lock().await.loading.contains(topic)
    }

    /// Hide a topic without a refetch. Returns whether it was visible.
    pub async fn evict(&self, topic: &str) -> bool {
        self.state.lock().await.shown.remove(topic).is_some()
    }

    /// Drop all cached topics. Loading flags are kept; in-flight fetches
    /// will finish and clear them on their own.
    pub async fn clear(&self) {
        self.state.lock().await.shown.clear();
    }
}
