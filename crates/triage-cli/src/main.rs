//! Triage CLI: scan a file, archive or stdin stream and print the verdict.
//!
//! Configuration comes from `TRIAGE_*` variables (a `.env` file is honored).
//! The token may also be given as TRIAGE_TOKEN.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use triage_core::{ErrorKind, TriageConfig};
use triage_infra::{init_telemetry, shutdown_telemetry, ErrorResponse, LogFormat};
use triage_services::{IntakeRequest, ScanService};

const MB: u64 = 1024 * 1024;

/// Exit code when the request itself failed.
const EXIT_REQUEST_ERROR: u8 = 1;
/// Exit code when the service could not start.
const EXIT_STARTUP_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "triage", about = "Classify files and archives for explicit content")]
struct Cli {
    /// Log format on stderr: pretty or json
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a file on disk, or bytes read from stdin
    Check {
        /// File or archive to scan
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,
        /// Read the content from stdin instead of a path
        #[arg(long, conflicts_with = "path", requires = "name")]
        stdin: bool,
        /// Name to report; defaults to the file name for path input
        #[arg(long)]
        name: Option<String>,
        /// Declared content type of stdin input
        #[arg(long)]
        content_type: Option<String>,
        /// Authentication token
        #[arg(long)]
        token: Option<String>,
        /// Size budget for this request, capped by TRIAGE_MAX_FILE_SIZE_MB
        #[arg(long)]
        max_size_mb: Option<u64>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn load_config() -> anyhow::Result<TriageConfig> {
    let config = TriageConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Cancel `token` on Ctrl+C so an interrupted scan still cleans up.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C signal, cancelling scan");
                token.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to install Ctrl+C handler"),
        }
    });
}

async fn build_request(
    path: Option<PathBuf>,
    stdin: bool,
    name: Option<String>,
    content_type: Option<String>,
) -> anyhow::Result<IntakeRequest> {
    if stdin {
        let name = name.context("--name is required with --stdin")?;
        let mut data = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut data)
            .await
            .context("Failed to read stdin")?;
        let mut request = IntakeRequest::upload(data, name);
        if let Some(content_type) = content_type {
            request = request.with_content_type(content_type);
        }
        return Ok(request);
    }

    let path = path.context("a path or --stdin is required")?;
    let mut request = IntakeRequest::path(path);
    if let Some(name) = name {
        request = request.with_name(name);
    }
    Ok(request)
}

async fn check(config: TriageConfig, command: Commands) -> anyhow::Result<ExitCode> {
    let Commands::Check {
        path,
        stdin,
        name,
        content_type,
        token,
        max_size_mb,
    } = command;

    let service = ScanService::from_config(config)
        .await
        .context("Failed to start scan service")?;

    let mut request = build_request(path, stdin, name, content_type).await?;
    if let Some(token) = token.or_else(|| std::env::var("TRIAGE_TOKEN").ok()) {
        request = request.with_token(token);
    }
    if let Some(max_size_mb) = max_size_mb {
        request = request.with_max_size(max_size_mb.saturating_mul(MB));
    }

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    match service.scan(request, &cancel).await {
        Ok(envelope) => {
            print_json(&envelope)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            print_json(&ErrorResponse::from(&e))?;
            Ok(ExitCode::from(EXIT_REQUEST_ERROR))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            let response = ErrorResponse::new(ErrorKind::ConfigError, format!("{:#}", e));
            println!("{}", response.to_json());
            return ExitCode::from(EXIT_STARTUP_ERROR);
        }
    };

    if let Err(e) = init_telemetry(cli.log_format, &config.environment) {
        eprintln!("Failed to initialize tracing: {}", e);
    }

    let code = match check(config, cli.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Scan could not run");
            let response = ErrorResponse::new(ErrorKind::InvalidRequest, format!("{:#}", e));
            println!("{}", response.to_json());
            ExitCode::from(EXIT_STARTUP_ERROR)
        }
    };

    shutdown_telemetry().await;
    code
}
