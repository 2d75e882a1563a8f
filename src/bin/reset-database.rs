//! Development-only: drop and recreate the patient and diagnosis tables.

use clap::Parser;
use patient_records::config::{Config, LoggingConfig};
use patient_records::constants::DEFAULT_CONFIG_FILE;
use patient_records::{logging, Database};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reset-database")]
#[command(about = "Drop and recreate all patient records (development only)")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// SQLite database file, overrides config
    #[arg(long)]
    database: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(long)]
    yes: bool,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    let _log_guard = logging::init_logging(&LoggingConfig {
        json_file: false,
        ..config.logging.clone()
    });

    if !cli.yes {
        println!(
            "WARNING: This will delete ALL patients and diagnoses in {}",
            config.database.path.display()
        );
        print!("Type 'yes' to continue: ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    let db = Database::open(&config.database.path)?;
    db.reset_schema()?;

    println!("Database reset successfully.");
    Ok(())
}
