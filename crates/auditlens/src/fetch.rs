use crate::prelude::*;
use auditlens_core::etherscan::{extract_source, source_code_url, validate_api_key, SourceCodeResponse};
use auditlens_core::source::normalize_source;
use auditlens_core::ContractInput;
use std::time::Duration;

/// Retrieves raw contract source for a validated input and flattens it.
pub struct SourceFetcher {
    client: reqwest::Client,
    etherscan_api_url: String,
    etherscan_api_key: Option<String>,
}

impl SourceFetcher {
    pub fn new(
        etherscan_api_url: String,
        etherscan_api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            etherscan_api_url,
            etherscan_api_key,
        })
    }

    /// Fetch and normalize the source for `input`.
    pub async fn fetch(&self, input: &ContractInput) -> Result<String> {
        let raw = match input {
            ContractInput::Url(url) => self.fetch_url(url).await?,
            ContractInput::File { content, .. } => content.clone(),
            ContractInput::TechQuery(code) => code.clone(),
            ContractInput::Address(address) => return self.fetch_address(address).await,
        };

        let normalized = normalize_source(&raw)
            .map_err(|_| eyre!("Fetched or provided contract code is empty."))?;
        if let Some(warning) = &normalized.warning {
            log::warn!("{} ({})", warning, input.identifier());
        }

        Ok(normalized.text)
    }

    async fn fetch_url(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(f!("Failed to fetch contract code from URL: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Network(f!(
                "Failed to fetch contract code from URL: HTTP {}",
                response.status()
            ))
            .into());
        }

        response
            .text()
            .await
            .map_err(|e| Error::Network(f!("Failed to read contract code from URL: {e}")).into())
    }

    async fn fetch_address(&self, address: &str) -> Result<String> {
        let api_key = validate_api_key(self.etherscan_api_key.as_deref())?;
        let url = source_code_url(&self.etherscan_api_url, address, api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(f!("Failed to fetch contract code from Etherscan API: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Network(f!(
                "Failed to fetch contract code from Etherscan API: HTTP {}",
                response.status()
            ))
            .into());
        }

        let body: SourceCodeResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(f!("Failed to parse Etherscan response: {e}")))?;

        let normalized = extract_source(&body, address)?;
        if let Some(warning) = &normalized.warning {
            log::warn!("{} ({})", warning, address);
        }

        log::debug!(
            "Fetched {} ({:?}, {} file(s))",
            address,
            normalized.shape,
            normalized.files
        );

        Ok(normalized.text)
    }
}
