use serde::de::{DeserializeOwned, IgnoredAny};

use crate::analysis::{TechnologyReport, ToolSelection, VulnerabilityReport};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Model response contains no JSON object")]
    NoJson,

    #[error("Model response does not match the expected {expected} shape: {message}")]
    Shape {
        expected: &'static str,
        message: String,
    },
}

/// Extract the JSON object from a model response.
///
/// Skips markdown fences and commentary on either side. The result is the
/// first complete JSON object in the response; anything after it, braces
/// included, is ignored. When no complete object parses, the text from the
/// first `{` to the last `}` is returned so the caller reports the syntax error.
pub fn extract_json(response: &str) -> Result<&str, ExtractError> {
    let trimmed = response.trim();

    for (start, _) in trimmed.match_indices('{') {
        let mut values =
            serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<IgnoredAny>();
        if let Some(Ok(_)) = values.next() {
            return Ok(&trimmed[start..start + values.byte_offset()]);
        }
    }

    let start = trimmed.find('{').ok_or(ExtractError::NoJson)?;
    let end = trimmed.rfind('}').ok_or(ExtractError::NoJson)?;

    if end < start {
        return Err(ExtractError::NoJson);
    }

    Ok(&trimmed[start..=end])
}

/// Deserialize the first object in the response that has the expected
/// shape. Each `{` is tried as a start in turn and whatever trails the object
/// is ignored. Fails with the error of the earliest candidate.
fn parse<T: DeserializeOwned>(response: &str, expected: &'static str) -> Result<T, ExtractError> {
    let trimmed = response.trim();
    let mut first_error = None;

    for (start, _) in trimmed.match_indices('{') {
        match serde_json::Deserializer::from_str(&trimmed[start..])
            .into_iter::<T>()
            .next()
        {
            Some(Ok(value)) => return Ok(value),
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
            None => {}
        }
    }

    match first_error {
        Some(message) => Err(ExtractError::Shape { expected, message }),
        None => Err(ExtractError::NoJson),
    }
}

pub fn parse_tool_selection(response: &str) -> Result<ToolSelection, ExtractError> {
    parse(response, "tool selection")
}

pub fn parse_vulnerability_report(response: &str) -> Result<VulnerabilityReport, ExtractError> {
    parse(response, "vulnerability report")
}

pub fn parse_technology_report(response: &str) -> Result<TechnologyReport, ExtractError> {
    parse(response, "technology report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Severity;

    #[test]
    fn test_clean_json_passes_through() {
        let response = r#"{"selectedTools":["Slither"]}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_json_wrapped_in_fence() {
        let response = "```json\n{\"selectedTools\":[\"Slither\",\"Mythril\"]}\n```";
        let selection = parse_tool_selection(response).unwrap();
        assert_eq!(selection.selected_tools, vec!["Slither", "Mythril"]);
    }

    #[test]
    fn test_leading_and_trailing_commentary() {
        let response = "Here is the report:\n{\"vulnerabilities\":[{\"id\":\"VULN-001\",\"title\":\"Reentrancy\",\"severity\":\"Critical\",\"description\":\"withdraw() calls out before updating balances\",\"tool\":\"Slither\"}]}\nLet me know if you need more.";
        let report = parse_vulnerability_report(response).unwrap();
        assert_eq!(report.vulnerabilities.len(), 1);
        assert_eq!(report.vulnerabilities[0].severity, Severity::Critical);
    }

    #[test]
    fn test_trailing_prose_with_braces() {
        let response = "{\"selectedTools\":[\"Slither\"]}\nNote: a guard like `modifier onlyOwner() { _; }` would help.";
        assert_eq!(extract_json(response).unwrap(), r#"{"selectedTools":["Slither"]}"#);

        let selection = parse_tool_selection(response).unwrap();
        assert_eq!(selection.selected_tools, vec!["Slither"]);
    }

    #[test]
    fn test_leading_prose_with_braces() {
        let response = "Checked `receive() {}` first.\n```json\n{\"selectedTools\":[\"Echidna\"]}\n```";
        let selection = parse_tool_selection(response).unwrap();
        assert_eq!(selection.selected_tools, vec!["Echidna"]);
    }

    #[test]
    fn test_malformed_object_reports_syntax_error() {
        let err = parse_tool_selection("{\"selectedTools\": [\"Slither\",}").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Shape {
                expected: "tool selection",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(
            parse_tool_selection("no json here"),
            Err(ExtractError::NoJson)
        );
        assert_eq!(extract_json(""), Err(ExtractError::NoJson));
        assert_eq!(extract_json("no json here"), Err(ExtractError::NoJson));
        assert_eq!(extract_json("} backwards {"), Err(ExtractError::NoJson));
    }

    #[test]
    fn test_wrong_shape() {
        let err = parse_technology_report(r#"{"selectedTools":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Shape {
                expected: "technology report",
                ..
            }
        ));
    }

    #[test]
    fn test_technology_report() {
        let response = r#"{"identifiedTechnologies":[{"name":"Solidity","category":"Programming Language","description":"EVM language","usageInContract":"Whole contract"}],"overallSummary":"Simple token."}"#;
        let report = parse_technology_report(response).unwrap();
        assert_eq!(report.identified_technologies[0].name, "Solidity");
        assert_eq!(report.overall_summary, "Simple token.");
    }
}
