//! aqlexec - run AQL queries from a file against an ArangoDB server.

use std::sync::Arc;

use aql_exec::cli::Cli;
use aql_exec::config::{FileProfileProvider, ProfileProvider};
use aql_exec::host::HeadlessHost;
use aql_exec::logging;
use aql_exec::transport::HttpTransport;
use aql_exec::{AqlExecError, Result, Session, UnitOutcome};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Load .env first so it can set RUST_LOG
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse_args();
    match cli.log_path() {
        Some(path) => {
            if let Err(e) = logging::init_file_logging(&path) {
                eprintln!("Warning: {e}; logging to stderr");
                logging::init_stderr_logging();
            }
        }
        None => logging::init_stderr_logging(),
    }
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Could not load .env: {e}");
        }
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let provider = Arc::new(FileProfileProvider::new(config_path));

    if cli.list {
        let active = provider.default_profile_name().ok();
        for name in provider.list_profile_names()? {
            let marker = if active.as_deref() == Some(name.as_str()) { "*" } else { " " };
            println!("{marker} {name}");
        }
        return Ok(());
    }

    let host = Arc::new(match &cli.file {
        Some(path) => HeadlessHost::from_file(path, cli.selections.clone())?,
        None => HeadlessHost::new(None, String::new(), Vec::new()),
    });
    let session = Session::new(provider, host, Arc::new(HttpTransport::new()));

    if let Some(name) = &cli.connection {
        session.switch_connection(name).await?;
    }

    if cli.collections {
        if cli.connection.is_none() {
            session.fill_database_collections().await;
        }
        for (name, _) in session.completions() {
            println!("{name}");
        }
        return Ok(());
    }

    if cli.file.is_none() {
        if cli.connection.is_some() {
            return Ok(());
        }
        return Err(AqlExecError::config(
            "No query file given. Use --help for usage information.",
        ));
    }

    let profile = session.active_profile()?;
    info!("Connection: {} ({})", profile.name, profile.display_string());

    let report = session.run(cli.run_mode(), &Default::default()).await?;
    let failed = report
        .outcomes
        .iter()
        .filter(|o| !matches!(o, UnitOutcome::Written { .. }))
        .count();
    info!(
        "{} of {} queries written, {} failed",
        report.written(),
        report.outcomes.len(),
        failed
    );
    Ok(())
}
