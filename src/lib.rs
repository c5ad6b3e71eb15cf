//! Client-side orchestration for a remote lease analysis service.
//!
//! The analysis engine itself (risk scoring, abnormality detection, clause
//! lookup, diffing) lives behind an HTTP API; this crate owns the typed
//! client, the per-version polling lifecycle, the per-topic clause cache,
//! and the in-memory project/version view a presentation layer reads from.

pub mod client;
pub mod model;
pub mod service;

pub use client::{AnalysisApi, ApiError, HttpAnalysisClient};
pub use model::ClientConfig;
pub use service::AnalysisSession;
