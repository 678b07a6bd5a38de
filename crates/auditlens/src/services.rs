use crate::fetch::SourceFetcher;
use crate::llm::OllamaAnalyzer;
use crate::prelude::{eprintln, *};
use crate::store::ReportStore;
use std::path::PathBuf;

/// Collaborators shared by the CLI, the HTTP API, and the MCP server.
pub struct Services {
    pub analyzer: OllamaAnalyzer,
    pub fetcher: SourceFetcher,
    pub store: Option<ReportStore>,
}

impl Services {
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        let fetcher = SourceFetcher::new(
            global.etherscan_api_url.clone(),
            global.etherscan_api_key.clone(),
            global.http_timeout,
        )?;

        let analyzer = OllamaAnalyzer::new(&global.ollama_url, &global.model)?;

        let store = if global.no_store {
            None
        } else {
            Some(ReportStore::open(database_path(global)?)?)
        };

        if global.verbose {
            eprintln!("Ollama URL: {}", global.ollama_url);
            eprintln!("Model: {}", global.model);
            if let Some(store) = &store {
                eprintln!("Report database: {}", store.path().display());
            }
        }

        Ok(Self {
            analyzer,
            fetcher,
            store,
        })
    }
}

/// Database location: `--db`, or `<data dir>/auditlens/reports.db`.
pub fn database_path(global: &crate::Global) -> Result<PathBuf> {
    if let Some(path) = &global.db {
        return Ok(path.clone());
    }

    let data_dir = dirs_next::data_dir()
        .ok_or_else(|| eyre!("Unable to determine data directory"))?
        .join("auditlens");

    std::fs::create_dir_all(&data_dir)
        .map_err(|e| eyre!("Failed to create data directory: {}", e))?;

    Ok(data_dir.join("reports.db"))
}
