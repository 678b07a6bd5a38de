use crate::prelude::{eprintln, println, *};
use crate::services::Services;
use auditlens_core::analysis::AnalysisResult;
use auditlens_core::ContractInput;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::PathBuf;

use super::output;

#[derive(Debug, clap::Parser)]
#[command(name = "analyze")]
#[command(about = "Analyze a smart contract")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Fetch the contract source from a URL and audit it
    #[clap(name = "url")]
    Url {
        /// URL of the contract source
        url: String,
    },

    /// Audit a local .sol or .vy file
    #[clap(name = "file")]
    File {
        /// Path of the contract file
        path: PathBuf,
    },

    /// Fetch verified source from Etherscan and audit it
    #[clap(name = "address")]
    Address {
        /// Contract address (with or without 0x)
        address: String,
    },

    /// Break down the technologies used by pasted code
    #[clap(name = "tech")]
    Tech {
        /// File with the code to analyze; reads stdin when omitted or `-`
        path: Option<PathBuf>,
    },
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let input = build_input(app.command)?;
    let services = Services::from_global(&global)?;

    if global.verbose {
        eprintln!("Analyzing {}", input.identifier());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("Invalid spinner template: {}", e))?,
    );
    spinner.set_message(f!("Analyzing {}...", input.identifier()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = super::analyze_contract(
        input,
        &services.analyzer,
        &services.fetcher,
        services.store.as_ref(),
    )
    .await;

    spinner.finish_and_clear();

    if app.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result)
                .map_err(|e| eyre!("Failed to serialize output: {}", e))?
        );
    } else {
        print!("{}", output::format_result(&result));
    }

    match result {
        AnalysisResult::Failure { error, .. } => Err(eyre!(error)),
        _ => Ok(()),
    }
}

fn build_input(command: Commands) -> Result<ContractInput> {
    let input = match command {
        Commands::Url { url } => ContractInput::url(&url)?,
        Commands::Address { address } => ContractInput::address(&address)?,
        Commands::File { path } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| eyre!("Invalid file path: {}", path.display()))?;
            // Validate the name before touching the disk.
            auditlens_core::input::validate_file_name(&name)?;
            let content = std::fs::read_to_string(&path)
                .wrap_err_with(|| f!("Failed to read file '{}'", path.display()))?;
            ContractInput::file(&name, content)?
        }
        Commands::Tech { path } => {
            let code = match path {
                Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
                    .wrap_err_with(|| f!("Failed to read file '{}'", path.display()))?,
                _ => {
                    let mut code = String::new();
                    std::io::stdin()
                        .read_to_string(&mut code)
                        .wrap_err("Failed to read stdin")?;
                    code
                }
            };
            ContractInput::tech_query(code)?
        }
    };

    Ok(input)
}
