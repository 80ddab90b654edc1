//! sqldump CLI - Logical MySQL dumps with per-column obfuscation.

use clap::{Parser, Subcommand};
use serde::Serialize;
use sqldump::dump::CatalogEnumerator;
use sqldump::{Config, DumpError, DumpSource, Dumper, MysqlReader, TransformerRegistry};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "sqldump")]
#[command(about = "Logical MySQL dumps with per-column obfuscation")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump every table of the source database to a SQL file
    Dump {
        /// Override output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Override source database
        #[arg(long)]
        database: Option<String>,

        /// Write directly to the target file instead of renaming a temp file
        #[arg(long)]
        no_atomic: bool,

        /// Escape quotes and backslashes in values
        #[arg(long)]
        escape_values: bool,
    },

    /// List the tables a dump would contain, in dump order
    Tables,

    /// Test the source database connection
    HealthCheck,

    /// List the available obfuscation transformers
    Transformers,
}

#[derive(Serialize)]
struct HealthCheckResult {
    connected: bool,
    latency_ms: u64,
    server_version: Option<String>,
    error: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DumpError> {
    let cli = Cli::parse();

    // Listing transformers needs neither config nor a connection
    if let Commands::Transformers = cli.command {
        let registry = TransformerRegistry::with_builtins();
        if cli.output_json {
            println!("{}", to_json(&registry.names())?);
        } else {
            for name in registry.names() {
                println!("{}", name);
            }
        }
        return Ok(());
    }

    setup_logging(&cli.verbosity, &cli.log_format).map_err(DumpError::Config)?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Transformers => unreachable!(), // Handled above
        Commands::Dump {
            output_dir,
            database,
            no_atomic,
            escape_values,
        } => {
            // Apply overrides
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            if let Some(db) = database {
                config.source.database = db;
            }
            if no_atomic {
                config.output.atomic_write = false;
            }
            if escape_values {
                config.output.escape_values = true;
            }
            config.validate()?;

            // Everything that does not need the database is checked first
            if !config.output.directory.is_dir() {
                return Err(DumpError::Config(format!(
                    "invalid directory: {}",
                    config.output.directory.display()
                )));
            }
            let obfuscation = config.obfuscation(&TransformerRegistry::with_builtins())?;

            let reader = MysqlReader::new(&config.source).await?;
            let mut dumper = Dumper::new(reader, config.dump_options())?;
            let outcome = dumper.dump(&obfuscation).await;
            dumper.close().await?;
            let result = outcome?;

            if cli.output_json {
                println!("{}", to_json(&result)?);
            } else {
                println!("\nDump completed!");
                println!("  File: {}", result.path.display());
                println!("  Tables: {}", result.tables);
                println!("  Bytes: {}", result.bytes);
                println!("  Duration: {:.2}s", result.duration_seconds);
            }
        }

        Commands::Tables => {
            let reader = MysqlReader::new(&config.source).await?;
            let listed = CatalogEnumerator::new(&reader).list_tables().await;
            reader.close().await;
            let tables = listed?;

            if cli.output_json {
                println!("{}", to_json(&tables)?);
            } else {
                for table in &tables {
                    println!("{}", table);
                }
            }
        }

        Commands::HealthCheck => {
            let (result, failure) = health_check(&config).await;

            if cli.output_json {
                println!("{}", to_json(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (MySQL): {} ({}ms)",
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref version) = result.server_version {
                    println!("    Server version: {}", version);
                }
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            if let Some(e) = failure {
                return Err(e);
            }
        }
    }

    Ok(())
}

async fn health_check(config: &Config) -> (HealthCheckResult, Option<DumpError>) {
    let mut result = HealthCheckResult {
        connected: false,
        latency_ms: 0,
        server_version: None,
        error: None,
    };

    let reader = match MysqlReader::new(&config.source).await {
        Ok(reader) => reader,
        Err(e) => {
            result.error = Some(e.to_string());
            return (result, Some(e));
        }
    };

    let failure = match reader.test_connection().await {
        Ok(latency) => {
            result.connected = true;
            result.latency_ms = latency.as_millis() as u64;
            match CatalogEnumerator::new(&reader).server_version().await {
                Ok(version) => {
                    result.server_version = Some(version);
                    None
                }
                Err(e) => {
                    result.error = Some(e.to_string());
                    Some(e)
                }
            }
        }
        Err(e) => {
            result.error = Some(e.to_string());
            Some(e)
        }
    };

    reader.close().await;
    (result, failure)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DumpError> {
    serde_json::to_string_pretty(value).map_err(|e| DumpError::Render(e.to_string()))
}

/// Logs go to stderr so stdout carries only the command result.
fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format: {}", other)),
    }

    Ok(())
}
