//! sqlite-node - parameterized query execution against SQLite database files.

use sqlite_node::batch::{BatchRunner, FailurePolicy};
use sqlite_node::cli::Cli;
use sqlite_node::config::Config;
use sqlite_node::db::SqliteConnector;
use sqlite_node::error::{NodeError, Result};
use sqlite_node::logging;
use sqlite_node::output::OutputRecord;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        match e.item_index() {
            Some(index) => error!("{} in request {}: {}", e.category(), index, e.message()),
            None => error!("{}: {}", e.category(), e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration file, then let flags override it
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);

    let requests = cli.requests()?;

    let connector = SqliteConnector::new(config.execution.clone());
    let policy = FailurePolicy::from(&config.batch);
    let runner = BatchRunner::new(&connector, &config.execution, policy);

    let records = runner.run(&requests).await?;
    print_records(&records, cli.pretty)
}

/// Writes the output records to stdout as a JSON array.
fn print_records(records: &[OutputRecord], pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(records)
    } else {
        serde_json::to_string(records)
    }
    .map_err(|e| NodeError::input(format!("Failed to serialize output: {e}")))?;

    println!("{rendered}");
    Ok(())
}
