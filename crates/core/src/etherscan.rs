//! Interpretation of Etherscan `getsourcecode` responses.

use serde::{Deserialize, Serialize};

use crate::source::{normalize_source, NormalizedSource};

pub const ETHERSCAN_API_BASE: &str = "https://api.etherscan.io/api";

/// Value shipped in sample `.env` files. Treated as unset.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_ETHERSCAN_API_KEY_HERE";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EtherscanError {
    #[error("ETHERSCAN_API_KEY is not set. Please obtain one from https://etherscan.io/myapikey and add it.")]
    MissingApiKey,

    #[error("Etherscan API rate limit reached. Please try again later or check your API key plan.")]
    RateLimited,

    #[error("Etherscan API error for address {address}: {message} - {result}")]
    Api {
        address: String,
        message: String,
        result: String,
    },

    #[error("Contract source code not found or not verified on Etherscan for address: {0}")]
    NotVerified(String),

    #[error("Fetched contract code is empty for address: {0}. It might be an unverified proxy or an empty contract.")]
    EmptySource(String),
}

/// Top-level `getsourcecode` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceCodeResponse {
    /// `"1"` on success, `"0"` on error.
    pub status: String,
    pub message: String,
    pub result: SourceCodeResult,
}

/// On error Etherscan puts a plain message in `result` instead of a list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourceCodeResult {
    Entries(Vec<SourceCodeEntry>),
    Message(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceCodeEntry {
    #[serde(default)]
    pub source_code: String,
    #[serde(rename = "ABI", default)]
    pub abi: String,
    #[serde(default)]
    pub contract_name: String,
    #[serde(default)]
    pub compiler_version: String,
    #[serde(default)]
    pub optimization_used: String,
    #[serde(default)]
    pub runs: String,
    #[serde(default)]
    pub constructor_arguments: String,
    #[serde(rename = "EVMVersion", default)]
    pub evm_version: String,
    #[serde(default)]
    pub library: String,
    #[serde(default)]
    pub license_type: String,
    /// `"0"` or `"1"`.
    #[serde(default)]
    pub proxy: String,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub swarm_source: String,
}

impl SourceCodeEntry {
    pub fn is_proxy(&self) -> bool {
        self.proxy == "1"
    }
}

impl SourceCodeResult {
    fn describe(&self) -> String {
        match self {
            SourceCodeResult::Message(message) => message.clone(),
            SourceCodeResult::Entries(entries) => format!("{} result(s)", entries.len()),
        }
    }
}

/// Reject missing, blank, or placeholder API keys.
pub fn validate_api_key(key: Option<&str>) -> Result<&str, EtherscanError> {
    match key.map(str::trim) {
        Some(key) if !key.is_empty() && key != API_KEY_PLACEHOLDER => Ok(key),
        _ => Err(EtherscanError::MissingApiKey),
    }
}

/// Build the `getsourcecode` request URL.
pub fn source_code_url(base: &str, address: &str, api_key: &str) -> String {
    format!(
        "{}?module=contract&action=getsourcecode&address={}&apikey={}",
        base.trim_end_matches('/'),
        urlencoding::encode(address),
        urlencoding::encode(api_key)
    )
}

/// Pull the flat contract source out of a `getsourcecode` response.
pub fn extract_source(
    response: &SourceCodeResponse,
    address: &str,
) -> Result<NormalizedSource, EtherscanError> {
    if response.status == "0" {
        if response.message == "NOTOK" && response.result.describe().contains("Max rate limit reached")
        {
            return Err(EtherscanError::RateLimited);
        }
        return Err(EtherscanError::Api {
            address: address.to_string(),
            message: response.message.clone(),
            result: response.result.describe(),
        });
    }

    let entry = match &response.result {
        SourceCodeResult::Entries(entries) => entries.first(),
        SourceCodeResult::Message(_) => None,
    };

    let raw = match entry {
        Some(entry) if !entry.source_code.is_empty() => &entry.source_code,
        _ => return Err(EtherscanError::NotVerified(address.to_string())),
    };

    normalize_source(raw).map_err(|_| EtherscanError::EmptySource(address.to_string()))
}
