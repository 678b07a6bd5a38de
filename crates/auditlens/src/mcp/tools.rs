use crate::services::Services;
use auditlens_core::analysis::AnalysisResult;
use auditlens_core::input::SubmissionForm;
use auditlens_core::report::DownloadableReport;
use auditlens_core::ContractInput;
use serde::{Deserialize, Serialize};

use super::{JsonRpcError, Tool};

// MCP Protocol types for tools
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ToolsList {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal(format!("Internal error: {e}")))
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    serde_json::from_value(arguments.unwrap_or(serde_json::Value::Null))
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid arguments: {e}")))
}

/// Wrap an analysis result; failures are flagged with `isError`.
fn analysis_content(result: &AnalysisResult) -> Result<serde_json::Value, JsonRpcError> {
    let text = serde_json::to_string_pretty(result)
        .map_err(|e| JsonRpcError::internal(format!("Serialization error: {e}")))?;

    to_value(CallToolResult {
        content: vec![Content::Text { text }],
        is_error: (!result.is_success()).then_some(true),
    })
}

pub fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    to_value(InitializeResult {
        protocol_version: "2024-11-05".to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "auditlens".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    })
}

pub fn handle_tools_list() -> Result<serde_json::Value, JsonRpcError> {
    let tools = vec![
        Tool {
            name: "analyze_contract".to_string(),
            description: "Audit a smart contract. The source is taken from a URL, an uploaded file (name + content), or fetched from Etherscan by address (requires ETHERSCAN_API_KEY). Multi-file Etherscan bundles are flattened before analysis. Returns the AI-selected analysis tools and a list of vulnerabilities with id, title, severity, description, and tool.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "inputType": {
                        "type": "string",
                        "description": "Where the source comes from",
                        "enum": ["url", "file", "address"]
                    },
                    "contractUrl": {
                        "type": "string",
                        "description": "URL of the contract source (inputType 'url')"
                    },
                    "contractFile": {
                        "type": "object",
                        "description": "Uploaded .sol or .vy file (inputType 'file')",
                        "properties": {
                            "name": { "type": "string" },
                            "content": { "type": "string" }
                        },
                        "required": ["name", "content"]
                    },
                    "contractAddress": {
                        "type": "string",
                        "description": "Contract address, with or without 0x (inputType 'address')"
                    }
                },
                "required": ["inputType"]
            }),
        },
        Tool {
            name: "analyze_technology".to_string(),
            description: "Identify the technologies, standards, libraries, design patterns, and security features used by pasted smart contract code, with an overall summary of its architecture.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "Smart contract code to analyze"
                    }
                },
                "required": ["code"]
            }),
        },
        Tool {
            name: "get_report".to_string(),
            description: "Fetch a persisted vulnerability report by id, in the downloadable report format.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "number",
                        "description": "Report id returned by analyze_contract"
                    }
                },
                "required": ["id"]
            }),
        },
    ];

    to_value(ToolsList { tools })
}

pub async fn handle_tools_call(
    params: Option<serde_json::Value>,
    services: &Services,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?;

    match params.name.as_str() {
        "analyze_contract" => handle_analyze_contract(params.arguments, services).await,
        "analyze_technology" => handle_analyze_technology(params.arguments, services).await,
        "get_report" => handle_get_report(params.arguments, services).await,
        _ => Err(JsonRpcError::invalid_params(format!(
            "Unknown tool: {}",
            params.name
        ))),
    }
}

async fn handle_analyze_contract(
    arguments: Option<serde_json::Value>,
    services: &Services,
) -> Result<serde_json::Value, JsonRpcError> {
    let form: SubmissionForm = parse_arguments(arguments)?;

    if form.input_type == "techQuery" {
        return Err(JsonRpcError::invalid_params(
            "Use analyze_technology for pasted code".to_string(),
        ));
    }

    let result = match ContractInput::from_form(form) {
        Ok(input) => {
            crate::analyze::analyze_contract(
                input,
                &services.analyzer,
                &services.fetcher,
                services.store.as_ref(),
            )
            .await
        }
        Err((error, identifier)) => AnalysisResult::failure(error, identifier),
    };

    analysis_content(&result)
}

async fn handle_analyze_technology(
    arguments: Option<serde_json::Value>,
    services: &Services,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct AnalyzeTechnologyArgs {
        code: String,
    }

    let args: AnalyzeTechnologyArgs = parse_arguments(arguments)?;

    let result = match ContractInput::tech_query(args.code) {
        Ok(input) => {
            crate::analyze::analyze_contract(
                input,
                &services.analyzer,
                &services.fetcher,
                services.store.as_ref(),
            )
            .await
        }
        Err(error) => AnalysisResult::failure(
            error,
            Some(auditlens_core::input::TECH_QUERY_IDENTIFIER.to_string()),
        ),
    };

    analysis_content(&result)
}

async fn handle_get_report(
    arguments: Option<serde_json::Value>,
    services: &Services,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct GetReportArgs {
        id: i64,
    }

    let args: GetReportArgs = parse_arguments(arguments)?;

    let store = services
        .store
        .as_ref()
        .ok_or_else(|| JsonRpcError::internal("Report persistence is disabled".to_string()))?;

    let report = store
        .get(args.id)
        .await
        .map_err(|e| JsonRpcError::internal(format!("Tool execution error: {e}")))?
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Report {} not found", args.id)))?;

    let text = serde_json::to_string_pretty(&DownloadableReport::from(report.document))
        .map_err(|e| JsonRpcError::internal(format!("Serialization error: {e}")))?;

    to_value(CallToolResult {
        content: vec![Content::Text { text }],
        is_error: None,
    })
}
