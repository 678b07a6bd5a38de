//! Domain types for analysis outputs.
//!
//! Wire names follow the JSON schemas the model is asked to produce, so the
//! same types deserialize model output and serialize API responses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Informational,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Informational => "Informational",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding in a vulnerability report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Vulnerability {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub description: String,
    /// Analysis tool the finding is attributed to.
    pub tool: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSelection {
    pub selected_tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VulnerabilityReport {
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TechnologyCategory {
    #[serde(rename = "Programming Language")]
    ProgrammingLanguage,
    #[serde(rename = "Standard/Token")]
    StandardToken,
    #[serde(rename = "Framework/Library")]
    FrameworkLibrary,
    #[serde(rename = "Design Pattern")]
    DesignPattern,
    #[serde(rename = "Security Feature")]
    SecurityFeature,
    Other,
}

impl TechnologyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TechnologyCategory::ProgrammingLanguage => "Programming Language",
            TechnologyCategory::StandardToken => "Standard/Token",
            TechnologyCategory::FrameworkLibrary => "Framework/Library",
            TechnologyCategory::DesignPattern => "Design Pattern",
            TechnologyCategory::SecurityFeature => "Security Feature",
            TechnologyCategory::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyInfo {
    pub name: String,
    pub category: TechnologyCategory,
    pub description: String,
    pub usage_in_contract: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyReport {
    pub identified_technologies: Vec<TechnologyInfo>,
    pub overall_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityAnalysis {
    pub selected_tools: Vec<String>,
    pub vulnerabilities: Vec<Vulnerability>,
}

/// Outcome of one submission. Failures carry a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnalysisResult {
    #[serde(rename_all = "camelCase")]
    Vulnerability {
        data: VulnerabilityAnalysis,
        contract_identifier: String,
        /// Row id of the persisted report, when persistence succeeded.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        report_id: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    Technology {
        data: TechnologyReport,
        contract_identifier: String,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        error: String,
        contract_identifier: Option<String>,
    },
}

impl AnalysisResult {
    pub fn failure(error: impl std::fmt::Display, contract_identifier: Option<String>) -> Self {
        AnalysisResult::Failure {
            error: error.to_string(),
            contract_identifier,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, AnalysisResult::Failure { .. })
    }

    pub fn contract_identifier(&self) -> Option<&str> {
        match self {
            AnalysisResult::Vulnerability {
                contract_identifier,
                ..
            }
            | AnalysisResult::Technology {
                contract_identifier,
                ..
            } => Some(contract_identifier),
            AnalysisResult::Failure {
                contract_identifier,
                ..
            } => contract_identifier.as_deref(),
        }
    }
}
