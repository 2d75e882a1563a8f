use clap::Parser;
use patient_records::config::Config;
use patient_records::constants::DEFAULT_CONFIG_FILE;
use patient_records::server::{self, AppState};
use patient_records::storage::{SqliteStorage, Storage};
use patient_records::{logging, metrics, Database};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "patient_records")]
#[command(about = "Patient and diagnosis records HTTP service")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file (missing file means defaults)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Interface to bind, overrides config and RECORDS_HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to run the server on, overrides config and RECORDS_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file, overrides config and RECORDS_DATABASE_PATH
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&config.logging);

    info!(database = %config.database.path.display(), "Initializing database storage...");
    let db = Database::open(&config.database.path)?;
    db.ensure_schema()?;
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(db));

    let mut state = AppState::new(storage);
    if config.metrics.enabled {
        match metrics::install_recorder() {
            Ok(handle) => state = state.with_metrics(handle),
            Err(e) => warn!(error = %e, "Continuing without metrics"),
        }
    }

    server::start_server(state, config.bind_addr()?).await?;

    Ok(())
}
