use crate::fetch::SourceFetcher;
use crate::llm::Analyzer;
use crate::prelude::*;
use crate::store::ReportStore;
use auditlens_core::analysis::{AnalysisResult, TechnologyReport, VulnerabilityAnalysis};
use auditlens_core::audit::{
    build_technology_prompt, build_tool_selection_prompt, build_vulnerability_prompt,
    parse_technology_report, parse_tool_selection, parse_vulnerability_report,
    short_code_technology_report, ANALYST_PREAMBLE,
};
use auditlens_core::report::ReportDocument;
use auditlens_core::ContractInput;

mod cli;
mod output;

pub use cli::{run, App};

/// Run the analysis flow for a validated input.
///
/// Never fails: every error is folded into [`AnalysisResult::Failure`] with
/// the contract identifier, so callers can show the message as is.
pub async fn analyze_contract<A: Analyzer>(
    input: ContractInput,
    analyzer: &A,
    fetcher: &SourceFetcher,
    store: Option<&ReportStore>,
) -> AnalysisResult {
    let identifier = input.identifier().to_string();

    match run_analysis(&input, analyzer, fetcher, store).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("Error analyzing contract {}: {}", identifier, e);
            AnalysisResult::failure(e, Some(identifier))
        }
    }
}

async fn run_analysis<A: Analyzer>(
    input: &ContractInput,
    analyzer: &A,
    fetcher: &SourceFetcher,
    store: Option<&ReportStore>,
) -> Result<AnalysisResult> {
    let code = fetcher.fetch(input).await?;
    let contract_identifier = input.identifier().to_string();

    if input.is_tech_query() {
        let data = technology_report(&code, analyzer).await?;
        return Ok(AnalysisResult::Technology {
            data,
            contract_identifier,
        });
    }

    let data = vulnerability_analysis(&code, analyzer).await?;

    let report_id = match store {
        Some(store) => {
            store
                .save(ReportDocument::new(
                    contract_identifier.clone(),
                    data.selected_tools.clone(),
                    data.vulnerabilities.clone(),
                    chrono::Utc::now(),
                ))
                .await
        }
        None => None,
    };

    Ok(AnalysisResult::Vulnerability {
        data,
        contract_identifier,
        report_id,
    })
}

/// Tool selection followed by the vulnerability report, each a model call.
pub async fn vulnerability_analysis<A: Analyzer>(
    code: &str,
    analyzer: &A,
) -> Result<VulnerabilityAnalysis> {
    let response = analyzer
        .complete(ANALYST_PREAMBLE, &build_tool_selection_prompt(code))
        .await?;
    let selection = parse_tool_selection(&response)
        .map_err(|e| eyre!("AI tool selection failed or returned no tools: {}", e))?;

    log::debug!("Selected tools: {:?}", selection.selected_tools);

    let response = analyzer
        .complete(
            ANALYST_PREAMBLE,
            &build_vulnerability_prompt(code, &selection.selected_tools),
        )
        .await?;
    let report = parse_vulnerability_report(&response)
        .map_err(|e| eyre!("AI vulnerability report generation failed: {}", e))?;

    Ok(VulnerabilityAnalysis {
        selected_tools: selection.selected_tools,
        vulnerabilities: report.vulnerabilities,
    })
}

/// Technology breakdown. Code too short to analyze skips the model call.
pub async fn technology_report<A: Analyzer>(code: &str, analyzer: &A) -> Result<TechnologyReport> {
    if let Some(report) = short_code_technology_report(code) {
        return Ok(report);
    }

    let response = analyzer
        .complete(ANALYST_PREAMBLE, &build_technology_prompt(code))
        .await?;

    parse_technology_report(&response)
        .map_err(|e| eyre!("AI technology usage analysis failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditlens_core::analysis::Severity;
    use std::sync::Mutex;

    /// Replays canned responses in order and records the prompts it saw.
    struct ScriptedAnalyzer {
        responses: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedAnalyzer {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(vec![]),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl Analyzer for ScriptedAnalyzer {
        async fn complete(&self, _preamble: &str, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| eyre!("no scripted response left"))
        }
    }

    const TOOLS: &str = r#"{"selectedTools":["Slither","Echidna"]}"#;
    const REPORT: &str = r#"```json
{"vulnerabilities":[{"id":"VULN-001","title":"Reentrancy","severity":"High","description":"withdraw() sends before zeroing the balance.","tool":"Slither"}]}
```"#;

    fn offline_fetcher() -> SourceFetcher {
        SourceFetcher::new("http://127.0.0.1:9/api".into(), None, 1).unwrap()
    }

    fn file_input() -> ContractInput {
        ContractInput::file(
            "Vault.sol",
            r#"{"language":"Solidity","sources":{"Vault.sol":{"content":"contract Vault {}"}}}"#.into(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_vulnerability_flow_chains_two_calls() {
        let analyzer = ScriptedAnalyzer::new(&[TOOLS, REPORT]);
        let result = analyze_contract(file_input(), &analyzer, &offline_fetcher(), None).await;

        match result {
            AnalysisResult::Vulnerability {
                data,
                contract_identifier,
                report_id,
            } => {
                assert_eq!(contract_identifier, "Vault.sol");
                assert_eq!(data.selected_tools, vec!["Slither", "Echidna"]);
                assert_eq!(data.vulnerabilities[0].severity, Severity::High);
                assert_eq!(report_id, None);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let prompts = analyzer.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("contract Vault {}"));
        assert!(!prompts[0].contains("\"sources\""));
        assert!(prompts[1].contains("Slither, Echidna"));
    }

    #[tokio::test]
    async fn test_vulnerability_report_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path().join("reports.db")).unwrap();
        let analyzer = ScriptedAnalyzer::new(&[TOOLS, REPORT]);

        let result =
            analyze_contract(file_input(), &analyzer, &offline_fetcher(), Some(&store)).await;

        let AnalysisResult::Vulnerability { report_id, .. } = result else {
            panic!("expected a vulnerability result");
        };
        let stored = store.get(report_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.document.contract_identifier, "Vault.sol");
        assert_eq!(stored.document.vulnerabilities.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_model_output_becomes_failure() {
        let analyzer = ScriptedAnalyzer::new(&["I cannot help with that."]);
        let result = analyze_contract(file_input(), &analyzer, &offline_fetcher(), None).await;

        match result {
            AnalysisResult::Failure {
                error,
                contract_identifier,
            } => {
                assert!(error.starts_with("AI tool selection failed"));
                assert_eq!(contract_identifier.as_deref(), Some("Vault.sol"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_technology_flow() {
        let analyzer = ScriptedAnalyzer::new(&[
            r#"{"identifiedTechnologies":[{"name":"OpenZeppelin Ownable","category":"Design Pattern","description":"Access control","usageInContract":"onlyOwner on mint"}],"overallSummary":"Owned ERC-20."}"#,
        ]);
        let input =
            ContractInput::tech_query("contract Token is ERC20, Ownable { function mint() onlyOwner {} }".into())
                .unwrap();

        let result = analyze_contract(input, &analyzer, &offline_fetcher(), None).await;
        let AnalysisResult::Technology { data, .. } = result else {
            panic!("expected a technology result");
        };
        assert_eq!(data.identified_technologies.len(), 1);
        assert_eq!(data.overall_summary, "Owned ERC-20.");
    }

    #[tokio::test]
    async fn test_short_technology_query_skips_model() {
        let analyzer = ScriptedAnalyzer::new(&[]);
        let input = ContractInput::tech_query("contract A {}".into()).unwrap();

        let result = analyze_contract(input, &analyzer, &offline_fetcher(), None).await;
        assert!(result.is_success());
        assert!(analyzer.prompts().is_empty());
    }
}
