use auditlens_core::analysis::{
    AnalysisResult, Severity, TechnologyReport, VulnerabilityAnalysis,
};
use auditlens_core::report::severity_counts;
use colored::{ColoredString, Colorize};

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical | Severity::High => severity.as_str().red().bold(),
        Severity::Medium => severity.as_str().yellow().bold(),
        Severity::Low | Severity::Informational => severity.as_str().normal(),
    }
}

fn header(title: &str) -> String {
    format!(
        "\n{}\n{}\n{}\n",
        "=".repeat(80).bright_cyan(),
        title.bright_cyan().bold(),
        "=".repeat(80).bright_cyan()
    )
}

/// Human-readable rendering of an analysis result.
pub fn format_result(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Vulnerability {
            data,
            contract_identifier,
            report_id,
        } => {
            let mut out = format_vulnerabilities(data, contract_identifier);
            if let Some(id) = report_id {
                out.push_str(&format!(
                    "\n{} auditlens reports get {}\n",
                    "Saved report:".green(),
                    id
                ));
            }
            out
        }
        AnalysisResult::Technology {
            data,
            contract_identifier,
        } => format_technologies(data, contract_identifier),
        AnalysisResult::Failure {
            error,
            contract_identifier,
        } => format!(
            "{} {}{}\n",
            "Analysis failed:".red().bold(),
            error,
            contract_identifier
                .as_ref()
                .map(|id| format!(" ({id})"))
                .unwrap_or_default()
        ),
    }
}

fn format_vulnerabilities(data: &VulnerabilityAnalysis, contract_identifier: &str) -> String {
    let mut out = header(&format!("VULNERABILITY REPORT: {contract_identifier}"));

    out.push_str(&format!(
        "\n{}: {}\n",
        "AI-selected tools".green(),
        if data.selected_tools.is_empty() {
            "(none)".to_string()
        } else {
            data.selected_tools.join(", ")
        }
    ));

    let summary = severity_counts(&data.vulnerabilities)
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(severity, count)| format!("{} {}", count, severity_label(severity)))
        .collect::<Vec<_>>();

    if summary.is_empty() {
        out.push_str(&format!("\n{}\n", "No vulnerabilities reported.".yellow()));
        return out;
    }

    out.push_str(&format!("{}: {}\n", "Findings".green(), summary.join(", ")));

    for vuln in &data.vulnerabilities {
        out.push_str(&format!(
            "\n{} {} [{}]\n",
            format!("[{}]", vuln.id).yellow().bold(),
            vuln.title.white().bold(),
            severity_label(vuln.severity)
        ));
        out.push_str(&format!("    {}: {}\n", "Tool".green(), vuln.tool));
        out.push_str(&format!("    {}\n", vuln.description));
    }

    out
}

fn format_technologies(data: &TechnologyReport, contract_identifier: &str) -> String {
    let mut out = header(&format!("TECHNOLOGY REPORT: {contract_identifier}"));

    out.push_str(&format!("\n{}\n", data.overall_summary));

    for tech in &data.identified_technologies {
        out.push_str(&format!(
            "\n{} ({})\n",
            tech.name.white().bold(),
            tech.category.as_str().cyan()
        ));
        out.push_str(&format!("    {}\n", tech.description));
        out.push_str(&format!("    {}: {}\n", "Usage".green(), tech.usage_in_contract));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditlens_core::analysis::Vulnerability;

    #[test]
    fn test_failure_mentions_identifier() {
        colored::control::set_override(false);
        let out = format_result(&AnalysisResult::failure("boom", Some("0xabc".into())));
        assert_eq!(out, "Analysis failed: boom (0xabc)\n");
    }

    #[test]
    fn test_vulnerability_summary() {
        colored::control::set_override(false);
        let result = AnalysisResult::Vulnerability {
            data: VulnerabilityAnalysis {
                selected_tools: vec!["Slither".into()],
                vulnerabilities: vec![Vulnerability {
                    id: "VULN-001".into(),
                    title: "Unchecked call".into(),
                    severity: Severity::Medium,
                    description: "Return value ignored.".into(),
                    tool: "Slither".into(),
                }],
            },
            contract_identifier: "Vault.sol".into(),
            report_id: Some(3),
        };

        let out = format_result(&result);
        assert!(out.contains("VULNERABILITY REPORT: Vault.sol"));
        assert!(out.contains("Findings: 1 Medium"));
        assert!(out.contains("[VULN-001] Unchecked call [Medium]"));
        assert!(out.contains("auditlens reports get 3"));
    }

    #[test]
    fn test_empty_vulnerability_list() {
        colored::control::set_override(false);
        let result = AnalysisResult::Vulnerability {
            data: VulnerabilityAnalysis {
                selected_tools: vec![],
                vulnerabilities: vec![],
            },
            contract_identifier: "Vault.sol".into(),
            report_id: None,
        };
        let out = format_result(&result);
        assert!(out.contains("AI-selected tools: (none)"));
        assert!(out.contains("No vulnerabilities reported."));
    }
}
