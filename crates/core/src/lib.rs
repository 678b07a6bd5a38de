//! Core library for auditlens
//!
//! This crate implements the **Functional Core** of the auditlens application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`auditlens_core`** (this crate): Pure transformation functions with zero I/O
//! - **`auditlens`**: HTTP fetches, model calls, persistence, and the CLI/HTTP
//!   surfaces (the Imperative Shell)
//!
//! Every function here is deterministic and testable with fixture data: no
//! network, no database, no clock (timestamps are passed in).
//!
//! # Module Organization
//!
//! - [`source`]: Normalization of raw contract source payloads into flat text
//! - [`input`]: Validation of submitted URLs, files, addresses, and pasted code
//! - [`etherscan`]: Interpretation of Etherscan `getsourcecode` responses
//! - [`audit`]: Prompt construction and model response extraction
//! - [`analysis`]: Domain types for tool selections, vulnerabilities, and technologies
//! - [`report`]: Persisted and downloadable report documents
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use auditlens_core::source::normalize;
//!
//! let raw = r#"{"language":"Solidity","sources":{"A.sol":{"content":"contract A {}"}}}"#;
//! assert_eq!(normalize(raw).unwrap(), "contract A {}");
//! ```

pub mod analysis;
pub mod audit;
pub mod etherscan;
pub mod input;
pub mod report;
pub mod source;

pub use analysis::{AnalysisResult, Severity, Vulnerability};
pub use input::ContractInput;
pub use source::{normalize, normalize_source, NormalizeError, NormalizedSource, SourceShape};
