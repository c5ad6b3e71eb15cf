//! Wire models for the lease analysis service.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A lease project as returned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Id of the version currently designated as authoritative, if any.
    #[serde(default)]
    pub current_version_id: Option<String>,
}

/// Analysis lifecycle of an uploaded version.
///
/// `Complete` and `Failed` are terminal; the poller never schedules another
/// fetch once either has been observed. The pre-summary service generation
/// reported `uploaded`/`processed` instead; those are accepted as aliases so
/// both backend generations satisfy the same contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    #[serde(alias = "uploaded")]
    Pending,
    Processing,
    #[serde(alias = "processed")]
    Complete,
    Failed,
}

impl VersionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, VersionStatus::Complete | VersionStatus::Failed)
    }
}

/// One uploaded revision of a lease document.
///
/// The analysis sub-phase fields (`stage`, `progress`) are not part of the
/// version listing; they arrive on the [`VersionSummary`] snapshot the
/// status endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub status: VersionStatus,
    /// Creation timestamp as reported by the server (format is server-owned).
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One scored risk category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEntry {
    /// 1..=10, or null when the engine could not score the category.
    #[serde(default)]
    pub score: Option<u8>,
    pub explanation: String,
}

/// Risk scores keyed by category name.
pub type RiskAssessment = HashMap<String, RiskEntry>;

/// How an abnormal clause cuts for the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Beneficial,
    Harmful,
    Neutral,
}

/// A clause flagged as unusual by the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Abnormality {
    pub text: String,
    pub impact: Impact,
}

/// Response of the risk endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskReport {
    #[serde(default, deserialize_with = "de_risk_payload")]
    pub payload: RiskAssessment,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of the abnormalities endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AbnormalityReport {
    #[serde(default)]
    pub payload: Vec<Abnormality>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of the status/summary endpoint.
///
/// The canonical service bundles the analysis payloads into this response
/// once the version is complete; the separate risk/abnormality endpoints
/// remain available for on-demand refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionSummary {
    pub status: VersionStatus,
    /// Free-form sub-phase label, e.g. "index" or "risk".
    #[serde(default)]
    pub stage: Option<String>,
    /// 0..=100.
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default, deserialize_with = "de_opt_risk_payload")]
    pub risk: Option<RiskAssessment>,
    #[serde(default)]
    pub abnormalities: Option<Vec<Abnormality>>,
}

/// Normalize a risk payload that may arrive either as structured JSON or as
/// a JSON-encoded string.
///
/// Contract: accepts either shape and returns the structured mapping; any
/// parse failure degrades to an empty mapping. Never returns an error, so
/// a malformed payload cannot take down the response it is embedded in.
pub fn normalize_risk_payload(value: Value) -> RiskAssessment {
    let structured = match value {
        Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Risk payload is not valid JSON, treating as empty");
                return RiskAssessment::new();
            }
        },
        other => other,
    };

    match serde_json::from_value(structured) {
        Ok(assessment) => assessment,
        Err(e) => {
            tracing::warn!(error = %e, "Risk payload has unexpected shape, treating as empty");
            RiskAssessment::new()
        }
    }
}

fn de_risk_payload<'de, D>(deserializer: D) -> Result<RiskAssessment, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_risk_payload(value))
}

fn de_opt_risk_payload<'de, D>(deserializer: D) -> Result<Option<RiskAssessment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(normalize_risk_payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_accepts_structured_mapping() {
        let value = json!({
            "rent_escalation": {"score": 3, "explanation": "Uncapped annual increases"}
        });
        let risks = normalize_risk_payload(value);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks["rent_escalation"].score, Some(3));
    }

    #[test]
    fn normalize_accepts_json_encoded_string() {
        let encoded = r#"{"termination": {"score": null, "explanation": "No early exit"}}"#;
        let risks = normalize_risk_payload(Value::String(encoded.to_string()));
        assert_eq!(risks.len(), 1);
        assert_eq!(risks["termination"].score, None);
    }

    #[test]
    fn normalize_degrades_unparseable_string_to_empty() {
        let risks = normalize_risk_payload(Value::String("not json at all".to_string()));
        assert!(risks.is_empty());
    }

    #[test]
    fn normalize_degrades_wrong_shape_to_empty() {
        let risks = normalize_risk_payload(json!([1, 2, 3]));
        assert!(risks.is_empty());
    }

    #[test]
    fn status_terminal_set() {
        assert!(VersionStatus::Complete.is_terminal());
        assert!(VersionStatus::Failed.is_terminal());
        assert!(!VersionStatus::Pending.is_terminal());
        assert!(!VersionStatus::Processing.is_terminal());
    }

    #[test]
    fn status_accepts_legacy_aliases() {
        let status: VersionStatus = serde_json::from_str("\"uploaded\"").unwrap();
        assert_eq!(status, VersionStatus::Pending);
        let status: VersionStatus = serde_json::from_str("\"processed\"").unwrap();
        assert_eq!(status, VersionStatus::Complete);
    }

    #[test]
    fn summary_deserializes_with_string_encoded_risk() {
        let summary: VersionSummary = serde_json::from_value(json!({
            "status": "complete",
            "stage": "done",
            "progress": 100,
            "risk": "{\"deposit\": {\"score\": 8, \"explanation\": \"Standard deposit terms\"}}",
            "abnormalities": [{"text": "Tenant pays roof repairs", "impact": "harmful"}]
        }))
        .unwrap();

        assert_eq!(summary.status, VersionStatus::Complete);
        let risk = summary.risk.unwrap();
        assert_eq!(risk["deposit"].score, Some(8));
        assert_eq!(summary.abnormalities.unwrap()[0].impact, Impact::Harmful);
    }

    #[test]
    fn summary_tolerates_missing_optional_fields() {
        let summary: VersionSummary =
            serde_json::from_value(json!({"status": "processing"})).unwrap();
        assert_eq!(summary.status, VersionStatus::Processing);
        assert!(summary.stage.is_none());
        assert!(summary.risk.is_none());
    }
}
