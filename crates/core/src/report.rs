//! Persisted and downloadable report documents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{Severity, Vulnerability};

/// Disclaimer attached to every downloadable report.
pub const REPORT_DISCLAIMER: &str = "This is an AI-generated preliminary analysis. Further manual review and professional auditing are recommended for critical applications.";

const MAX_IDENTIFIER_LEN: usize = 50;

/// Record written to the report store after a vulnerability audit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub contract_identifier: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub selected_tools: Vec<String>,
    pub vulnerabilities: Vec<Vulnerability>,
}

impl ReportDocument {
    pub fn new(
        contract_identifier: impl Into<String>,
        selected_tools: Vec<String>,
        vulnerabilities: Vec<Vulnerability>,
        analysis_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            contract_identifier: contract_identifier.into(),
            analysis_timestamp,
            selected_tools,
            vulnerabilities,
        }
    }
}

/// JSON document offered for download.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadableReport {
    pub contract_identifier: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub ai_selected_tools: Vec<String>,
    pub reported_vulnerabilities: Vec<Vulnerability>,
    pub summary: String,
}

impl From<ReportDocument> for DownloadableReport {
    fn from(doc: ReportDocument) -> Self {
        Self {
            contract_identifier: doc.contract_identifier,
            analysis_timestamp: doc.analysis_timestamp,
            ai_selected_tools: doc.selected_tools,
            reported_vulnerabilities: doc.vulnerabilities,
            summary: REPORT_DISCLAIMER.to_string(),
        }
    }
}

/// File name for a downloaded report.
///
/// Characters outside `[A-Za-z0-9_.-]` become `_` and the identifier is
/// truncated to 50 characters.
pub fn report_file_name(contract_identifier: &str, date: NaiveDate) -> String {
    let safe: String = contract_identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_IDENTIFIER_LEN)
        .collect();

    format!("auditlens_report_{}_{}.json", safe, date.format("%Y-%m-%d"))
}

/// Finding counts per severity, most severe first. Severities with no
/// findings are included with a zero count.
pub fn severity_counts(vulnerabilities: &[Vulnerability]) -> Vec<(Severity, usize)> {
    Severity::ALL
        .iter()
        .map(|severity| {
            let count = vulnerabilities
                .iter()
                .filter(|v| v.severity == *severity)
                .count();
            (*severity, count)
        })
        .collect()
}
