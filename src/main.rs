// Entrypoint for the CLI application.
// - Resolves configuration (file, environment, flags) and sets up logging.
// - With a FILE argument, uploads it once and exits non-zero on failure;
//   without one, hands the client to the interactive loop.

use clap::Parser;
use imgdrop_cli::file::PathInput;
use imgdrop_cli::ui::{main_menu, upload_with_spinner};
use imgdrop_cli::{TransportMode, UploadClient, UploadConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Upload an image to an HTTP endpoint as multipart or base64 JSON.
#[derive(Parser, Debug)]
#[command(name = "imgdrop")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to upload; omit to start the interactive prompt
    file: Option<PathBuf>,

    /// Upload endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Transport mode: multipart or base64-json
    #[arg(short, long)]
    mode: Option<TransportMode>,

    /// Multipart field name expected by the server
    #[arg(long)]
    field: Option<String>,

    /// Header carrying the filename in base64-json mode
    #[arg(long)]
    filename_header: Option<String>,

    /// Allowed MIME type (repeatable); replaces the configured allow-list
    #[arg(long = "allow", value_name = "MIME")]
    allow: Vec<String>,

    /// Skip the MIME type check
    #[arg(long, conflicts_with = "allow")]
    no_type_check: bool,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn apply(&self, config: &mut UploadConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(field) = &self.field {
            config.file_field = field.clone();
        }
        if let Some(header) = &self.filename_header {
            config.filename_header = header.clone();
        }
        if self.no_type_check {
            config.allowed_mime_types = None;
        } else if !self.allow.is_empty() {
            config.allowed_mime_types = Some(self.allow.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only status lines.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = UploadConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    info!(endpoint = %config.endpoint, mode = %config.mode, "configuration loaded");

    let client = UploadClient::new(config)?;

    match &args.file {
        Some(path) => {
            let input = PathInput::new(Some(path.clone()));
            let result = upload_with_spinner(&client, &input).await;
            Ok(if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        None => {
            main_menu(client).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
