use crate::prelude::{eprintln, println, *};
use crate::store::{ReportStore, StoredReport};
use auditlens_core::report::{report_file_name, DownloadableReport};
use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(name = "reports")]
#[command(about = "Inspect persisted vulnerability reports")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List the most recent reports
    #[clap(name = "list")]
    List {
        /// Maximum number of reports to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one report
    #[clap(name = "get")]
    Get {
        /// Report id
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Write the downloadable JSON report into this directory
        #[arg(long, value_name = "DIR")]
        download: Option<PathBuf>,
    },
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let store = ReportStore::open(crate::services::database_path(&global)?)?;

    if global.verbose {
        eprintln!("Report database: {}", store.path().display());
    }

    match app.command {
        Commands::List { limit, json } => list(&store, limit, json).await,
        Commands::Get { id, json, download } => get(&store, id, json, download).await,
    }
}

async fn list(store: &ReportStore, limit: usize, json: bool) -> Result<()> {
    let reports = store.list(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("No reports found.");
        return Ok(());
    }

    let mut table = new_table(&["ID", "Contract", "Analyzed", "Tools", "Findings"]);

    for report in &reports {
        table.add_row(prettytable::row![
            report.id,
            &report.document.contract_identifier,
            report
                .document
                .analysis_timestamp
                .format("%Y-%m-%d %H:%M:%S UTC"),
            report.document.selected_tools.join(", "),
            report.document.vulnerabilities.len()
        ]);
    }

    table.printstd();

    Ok(())
}

async fn get(store: &ReportStore, id: i64, json: bool, download: Option<PathBuf>) -> Result<()> {
    let report = store
        .get(id)
        .await?
        .ok_or_else(|| eyre!("Report {} not found", id))?;

    if let Some(dir) = download {
        let path = write_download(&report, &dir)?;
        println!("Report written to {}", path.display());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut table = new_table(&[]);
    table.add_row(prettytable::row!["Contract", &report.document.contract_identifier]);
    table.add_row(prettytable::row![
        "Analyzed",
        report
            .document
            .analysis_timestamp
            .format("%Y-%m-%d %H:%M:%S UTC")
    ]);
    table.add_row(prettytable::row![
        "Tools",
        report.document.selected_tools.join(", ")
    ]);
    table.printstd();

    println!();

    let mut findings = new_table(&["ID", "Severity", "Title", "Tool"]);
    for vuln in &report.document.vulnerabilities {
        findings.add_row(prettytable::row![&vuln.id, vuln.severity, &vuln.title, &vuln.tool]);
    }
    findings.printstd();

    Ok(())
}

fn write_download(report: &StoredReport, dir: &std::path::Path) -> Result<PathBuf> {
    let name = report_file_name(
        &report.document.contract_identifier,
        chrono::Utc::now().date_naive(),
    );
    let path = dir.join(name);
    let body = DownloadableReport::from(report.document.clone());

    std::fs::write(&path, serde_json::to_string_pretty(&body)?)
        .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;

    Ok(path)
}
