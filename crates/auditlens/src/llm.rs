use crate::prelude::*;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::ollama;
use std::future::Future;

/// A text-completion backend used by the analysis flows.
pub trait Analyzer: Send + Sync {
    fn complete(
        &self,
        preamble: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Analyzer backed by an Ollama server through `rig`.
pub struct OllamaAnalyzer {
    client: ollama::Client,
    model: String,
}

impl OllamaAnalyzer {
    pub fn new(ollama_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(ollama_url)?,
            model: model.to_string(),
        })
    }
}

fn create_client(ollama_url: &str) -> Result<ollama::Client> {
    use rig::client::Nothing;

    ollama::Client::builder()
        .api_key(Nothing)
        .base_url(ollama_url)
        .build()
        .map_err(|e| eyre!("Failed to create Ollama client: {}", e))
}

impl Analyzer for OllamaAnalyzer {
    async fn complete(&self, preamble: &str, prompt: &str) -> Result<String> {
        let agent = self.client.agent(&self.model).preamble(preamble).build();

        let prompt = prompt.to_string();
        agent
            .prompt(&prompt)
            .await
            .map_err(|e| Error::Model(e.to_string()).into())
    }
}
