//! Validation of user-submitted contract inputs.
//!
//! A submission arrives either as form-style fields (HTTP API, MCP tools) or
//! as CLI arguments. Both paths end in a [`ContractInput`] that has already
//! been validated.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Identifier reported for pasted code submitted for technology analysis.
pub const TECH_QUERY_IDENTIFIER: &str = "Pasted Code for Technology Analysis";

/// File extensions accepted for uploaded contracts (Solidity and Vyper).
pub const ACCEPTED_EXTENSIONS: [&str; 2] = [".sol", ".vy"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid Contract Address: Invalid Ethereum address format.")]
    InvalidAddress,

    #[error("No file uploaded.")]
    MissingFile,

    #[error("Invalid file type. Please upload a .sol or .vy file.")]
    InvalidFileType,

    #[error("Please paste smart contract code for technology analysis.")]
    EmptyTechQuery,

    #[error("Invalid input type selected.")]
    UnknownInputType,
}

/// A validated contract submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractInput {
    Url(String),
    File { name: String, content: String },
    Address(String),
    TechQuery(String),
}

/// Form-style submission, using the field names of the submission form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionForm {
    pub input_type: String,
    pub contract_url: Option<String>,
    pub contract_file: Option<UploadedFile>,
    pub contract_address: Option<String>,
    pub tech_query_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub content: String,
}

impl ContractInput {
    /// Build and validate an input from a URL.
    pub fn url(raw: &str) -> Result<Self, InputError> {
        validate_url(raw).map(ContractInput::Url)
    }

    /// Build and validate an input from an uploaded file.
    pub fn file(name: &str, content: String) -> Result<Self, InputError> {
        validate_file_name(name)?;
        Ok(ContractInput::File {
            name: name.to_string(),
            content,
        })
    }

    /// Build and validate an input from an on-chain address.
    pub fn address(raw: &str) -> Result<Self, InputError> {
        validate_address(raw).map(ContractInput::Address)
    }

    /// Build and validate an input from pasted code.
    pub fn tech_query(code: String) -> Result<Self, InputError> {
        if code.trim().is_empty() {
            return Err(InputError::EmptyTechQuery);
        }
        Ok(ContractInput::TechQuery(code))
    }

    /// Build an input from form-style fields.
    ///
    /// On failure the identifier known so far is returned with the error, so
    /// the caller can report it alongside the message.
    pub fn from_form(form: SubmissionForm) -> Result<Self, (InputError, Option<String>)> {
        match form.input_type.as_str() {
            "url" => {
                let raw = form.contract_url.unwrap_or_default();
                Self::url(&raw).map_err(|e| (e, Some(raw)))
            }
            "file" => {
                let file = form
                    .contract_file
                    .ok_or((InputError::MissingFile, None))?;
                let name = file.name.clone();
                Self::file(&file.name, file.content).map_err(|e| (e, Some(name)))
            }
            "address" => {
                let raw = form.contract_address.unwrap_or_default();
                Self::address(&raw).map_err(|e| (e, Some(raw)))
            }
            "techQuery" => Self::tech_query(form.tech_query_code.unwrap_or_default())
                .map_err(|e| (e, Some(TECH_QUERY_IDENTIFIER.to_string()))),
            _ => Err((InputError::UnknownInputType, None)),
        }
    }

    /// Identifier reported with results and persisted reports.
    pub fn identifier(&self) -> &str {
        match self {
            ContractInput::Url(url) => url,
            ContractInput::File { name, .. } => name,
            ContractInput::Address(address) => address,
            ContractInput::TechQuery(_) => TECH_QUERY_IDENTIFIER,
        }
    }

    pub fn is_tech_query(&self) -> bool {
        matches!(self, ContractInput::TechQuery(_))
    }
}

fn address_regex() -> &'static Regex {
    static ADDRESS: OnceLock<Regex> = OnceLock::new();
    ADDRESS.get_or_init(|| Regex::new(r"^(0x)?[0-9a-fA-F]{40}$").expect("valid address regex"))
}

/// Validate an Ethereum address, with or without the `0x` prefix.
pub fn validate_address(raw: &str) -> Result<String, InputError> {
    if address_regex().is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err(InputError::InvalidAddress)
    }
}

/// Validate an absolute `http` or `https` URL.
pub fn validate_url(raw: &str) -> Result<String, InputError> {
    let parsed =
        url::Url::parse(raw).map_err(|_| InputError::InvalidUrl("Invalid URL format.".into()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        scheme => Err(InputError::InvalidUrl(format!(
            "Unsupported URL scheme '{scheme}'."
        ))),
    }
}

/// Accept only Solidity (`.sol`) and Vyper (`.vy`) files.
pub fn validate_file_name(name: &str) -> Result<(), InputError> {
    if ACCEPTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        Ok(())
    } else {
        Err(InputError::InvalidFileType)
    }
}
