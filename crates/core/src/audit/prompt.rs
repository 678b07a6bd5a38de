use crate::analysis::TechnologyReport;

/// Static-analysis tools the model may choose from.
pub const AVAILABLE_TOOLS: [&str; 5] = ["Slither", "Mythril", "Oyente", "Manticore", "Echidna"];

/// Pasted code shorter than this (after trimming) is not sent to the model.
pub const MIN_TECHNOLOGY_CODE_LEN: usize = 20;

/// System preamble shared by every analysis request.
pub const ANALYST_PREAMBLE: &str = "\
You are a smart contract security auditor and blockchain technology expert.
You answer ONLY with a single JSON object matching the requested shape.

Rules:
- No markdown fences. No explanations outside the JSON object.
- Use exactly the field names given in the request.
- Base every statement on the provided code.";

fn code_block(code: &str) -> String {
    format!("Smart Contract Code:\n```\n{code}\n```")
}

/// Build the prompt asking the model to pick analysis tools for the code.
pub fn build_tool_selection_prompt(code: &str) -> String {
    let tools = AVAILABLE_TOOLS
        .iter()
        .map(|tool| format!("- {tool}"))
        .collect::<Vec<_>>()
        .join("\n");

    [
        format!(
            "Given the following smart contract code, select the most relevant analysis tools to use for vulnerability detection. Available tools:\n\n{tools}"
        ),
        code_block(code),
        "Return a JSON object with a \"selectedTools\" field containing a list of the names of the selected tools.".to_string(),
    ]
    .join("\n\n")
}

/// Build the prompt asking for a vulnerability report, given the tools
/// selected in the previous step.
pub fn build_vulnerability_prompt(code: &str, selected_tools: &[String]) -> String {
    let tools = if selected_tools.is_empty() {
        "(none selected; rely on manual review)".to_string()
    } else {
        selected_tools.join(", ")
    };

    [
        format!(
            "Act as if the following static-analysis tools were run against the smart contract below: {tools}.\nSynthesize the vulnerabilities those tools would most likely report."
        ),
        code_block(code),
        "Return a JSON object with a \"vulnerabilities\" field: a list of objects with the fields \"id\" (e.g. \"VULN-001\"), \"title\", \"severity\" (one of \"Critical\", \"High\", \"Medium\", \"Low\", \"Informational\"), \"description\", and \"tool\" (the tool that would report it).\nIf no vulnerabilities are found, return an empty list.".to_string(),
    ]
    .join("\n\n")
}

/// Build the prompt asking for the technologies used by the code.
pub fn build_technology_prompt(code: &str) -> String {
    [
        "Analyze the provided smart contract code to identify the technologies used.\nFor each identified technology (programming language, standards like ERC-20/ERC-721, libraries like OpenZeppelin, design patterns like Ownable or ReentrancyGuard, security features, etc.):\n- Provide its name.\n- Categorize it as one of \"Programming Language\", \"Standard/Token\", \"Framework/Library\", \"Design Pattern\", \"Security Feature\", \"Other\".\n- Briefly describe the technology.\n- Explain its specific usage within the provided contract code, referring to functions where relevant.\n\nFinally, provide a concise overall summary of the contract's technology stack and architecture.".to_string(),
        code_block(code),
        "Return a JSON object with \"identifiedTechnologies\" (a list of objects with \"name\", \"category\", \"description\", \"usageInContract\") and \"overallSummary\" fields.\nIf the code is too short or nonsensical to analyze, return an empty \"identifiedTechnologies\" list and a summary stating that.".to_string(),
    ]
    .join("\n\n")
}

/// Canned report for code too short to be worth a model call.
pub fn short_code_technology_report(code: &str) -> Option<TechnologyReport> {
    if code.trim().len() >= MIN_TECHNOLOGY_CODE_LEN {
        return None;
    }

    Some(TechnologyReport {
        identified_technologies: vec![],
        overall_summary:
            "The provided code snippet is too short or empty for a meaningful technology analysis."
                .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_selection_prompt_lists_tools() {
        let prompt = build_tool_selection_prompt("contract A {}");
        for tool in AVAILABLE_TOOLS {
            assert!(prompt.contains(&format!("- {tool}")));
        }
        assert!(prompt.contains("```\ncontract A {}\n```"));
        assert!(prompt.contains("\"selectedTools\""));
    }

    #[test]
    fn test_vulnerability_prompt_mentions_selected_tools() {
        let tools = vec!["Slither".to_string(), "Echidna".to_string()];
        let prompt = build_vulnerability_prompt("contract A {}", &tools);
        assert!(prompt.contains("Slither, Echidna"));
        assert!(prompt.contains("\"vulnerabilities\""));
    }

    #[test]
    fn test_vulnerability_prompt_without_tools() {
        let prompt = build_vulnerability_prompt("contract A {}", &[]);
        assert!(prompt.contains("none selected"));
    }

    #[test]
    fn test_technology_prompt_shape() {
        let prompt = build_technology_prompt("contract Token is ERC20 {}");
        assert!(prompt.contains("contract Token is ERC20 {}"));
        assert!(prompt.contains("\"usageInContract\""));
        assert!(prompt.contains("\"overallSummary\""));
    }

    #[test]
    fn test_short_code_short_circuits() {
        let report = short_code_technology_report("  contract A {}  ").unwrap();
        assert!(report.identified_technologies.is_empty());
        assert!(report.overall_summary.contains("too short"));

        assert!(short_code_technology_report("contract Token is ERC20 { }").is_none());
    }
}
