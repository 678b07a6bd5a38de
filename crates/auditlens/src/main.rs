use crate::prelude::*;
use clap::Parser;
use std::path::PathBuf;

mod analyze;
mod error;
mod fetch;
mod llm;
mod mcp;
mod prelude;
mod reports;
mod services;
mod store;
mod web;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "AI-assisted smart contract vulnerability and technology reports"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Etherscan API key, required for address lookups
    #[clap(long, env = "ETHERSCAN_API_KEY", global = true, hide_env_values = true)]
    etherscan_api_key: Option<String>,

    /// Etherscan API base URL
    #[clap(
        long,
        env = "ETHERSCAN_API_URL",
        global = true,
        default_value = auditlens_core::etherscan::ETHERSCAN_API_BASE
    )]
    etherscan_api_url: String,

    /// Ollama base URL
    #[clap(long, env = "OLLAMA_URL", global = true, default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Model used for every analysis request
    #[clap(long, env = "AUDITLENS_MODEL", global = true, default_value = "llama3.1")]
    model: String,

    /// Timeout in seconds for source fetches
    #[clap(long, env = "AUDITLENS_HTTP_TIMEOUT", global = true, default_value = "30")]
    http_timeout: u64,

    /// Path of the SQLite report database
    #[clap(long, env = "AUDITLENS_DB", global = true)]
    db: Option<PathBuf>,

    /// Do not persist vulnerability reports
    #[clap(long, global = true)]
    no_store: bool,

    /// Whether to display additional information.
    #[clap(long, env = "AUDITLENS_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Analyze a contract from a URL, file, address, or pasted code
    Analyze(crate::analyze::App),

    /// Serve the HTTP API
    Serve(crate::web::ServeOptions),

    /// Model Context Protocol server over stdio
    MCP,

    /// Inspect persisted vulnerability reports
    Reports(crate::reports::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Analyze(sub_app) => crate::analyze::run(sub_app, app.global).await,
        SubCommands::Serve(options) => crate::web::run(options, app.global).await,
        SubCommands::MCP => crate::mcp::run_stdio(app.global).await,
        SubCommands::Reports(sub_app) => crate::reports::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
