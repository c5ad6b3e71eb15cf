//! Structured diff records between two lease versions.
//!
//! The server owns ordering and clause numbering; the client only checks
//! that each record is internally consistent before handing it to display.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One unit of difference between a base and a compare version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub clause_no: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

impl Change {
    /// Check the kind/field invariant: `added` carries only `after`,
    /// `removed` only `before`, `modified` both. Returns a description of
    /// the violation, or `None` when the record is well-formed.
    pub fn shape_violation(&self) -> Option<&'static str> {
        match self.kind {
            ChangeKind::Added if self.before.is_some() => {
                Some("an added change must not carry a before text")
            }
            ChangeKind::Added if self.after.is_none() => {
                Some("an added change must carry an after text")
            }
            ChangeKind::Removed if self.after.is_some() => {
                Some("a removed change must not carry an after text")
            }
            ChangeKind::Removed if self.before.is_none() => {
                Some("a removed change must carry a before text")
            }
            ChangeKind::Modified if self.before.is_none() || self.after.is_none() => {
                Some("a modified change must carry both before and after texts")
            }
            _ => None,
        }
    }
}
