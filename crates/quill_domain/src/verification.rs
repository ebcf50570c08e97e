use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum VerificationStatus {
    #[serde(rename = "PASS")]
    #[strum(serialize = "PASS")]
    Pass,
    #[serde(rename = "ISSUES FOUND")]
    #[strum(serialize = "ISSUES FOUND")]
    IssuesFound,
    #[serde(rename = "UNKNOWN")]
    #[strum(serialize = "UNKNOWN")]
    Unknown,
    #[serde(rename = "REJECT")]
    #[strum(serialize = "REJECT")]
    Reject,
}

impl VerificationStatus {
    /// Classifies the first line of the model's status section.
    pub fn classify(line: &str) -> Self {
        let line = line.to_uppercase();
        if line.contains("PASS") {
            Self::Pass
        } else if line.contains("ISSUES") {
            Self::IssuesFound
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Recommendation {
    Approve,
    Reject,
    Revise,
    Unknown,
}

impl Recommendation {
    /// Classifies the first line of the model's recommendation section.
    /// APPROVE wins over REJECT, which wins over REVISE.
    pub fn classify(line: &str) -> Self {
        let line = line.to_uppercase();
        if line.contains("APPROVE") {
            Self::Approve
        } else if line.contains("REJECT") {
            Self::Reject
        } else if line.contains("REVISE") {
            Self::Revise
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub status: VerificationStatus,
    pub recommendation: Recommendation,
    /// Raw model response; empty when verification short-circuited.
    pub full_report: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_citations: Vec<String>,
    /// Why verification was refused without calling the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerificationResult {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Reject,
            recommendation: Recommendation::Reject,
            full_report: String::new(),
            missing_citations: Vec::new(),
            reason: Some(reason.into()),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.recommendation == Recommendation::Approve
    }
}
