use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use actix_web::web;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::budget::DashboardConfig;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::{ConfigService, DEFAULT_CONFIG_FILE};
use crate::infrastructure::storage;
use crate::interfaces::cli::{self, OutputFormat};
use crate::interfaces::http::{self, DashboardState};

#[derive(Parser)]
#[command(name = "loa-dashboard")]
#[command(about = "Municipal budget (LOA) and execution dashboard")]
struct Cli {
    /// TOML configuration file; `LOA_*` environment variables override it
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTML dashboard and JSON API (default)
    Serve,
    /// Print a LOA summary, or the execution summary with --execution
    Report {
        #[arg(long)]
        execution: bool,
        #[arg(long)]
        json: bool,
    },
    /// Check the raw CSV exports for parsing problems
    Diagnose {
        #[arg(long)]
        json: bool,
    },
}

fn format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

pub fn run() -> ExitCode {
    let _ = dotenvy::dotenv();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let cli = Cli::parse();
    let config = match ConfigService::with_path(&cli.config).load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config),
        Command::Report { execution, json } => {
            let today = Local::now().date_naive();
            cli::run_report(&config, execution, today, format(json)).map(|out| print!("{}", out))
        }
        Command::Diagnose { json } => {
            cli::run_diagnose(&config, format(json)).map(|out| print!("{}", out))
        }
    };

    match output {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn serve(config: DashboardConfig) -> Result<()> {
    let missing = storage::missing_files(&config);
    for path in &missing {
        error!(path = %path.display(), "Data file not found");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let state = web::Data::new(DashboardState::load(config, logs.clone()));
        http::add_log(
            &logs,
            "INFO",
            "System",
            &format!(
                "Dashboard starting on {}:{} ({} missing data files)",
                state.config.server.host,
                state.config.server.port,
                missing.len()
            ),
        );

        let server = http::start_server(state)?;
        info!("Press Ctrl+C to stop");
        server
            .await
            .map_err(|e| AppError::Internal(format!("Dashboard server failed: {}", e)))?;
        Ok::<(), AppError>(())
    })
}
