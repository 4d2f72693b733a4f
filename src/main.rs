mod config;
mod routes;
mod services;
mod state;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use canvas::doc::Document;
use canvas::export::{ExportError, OutputFormat, SourceError, flatten};
use clap::{Args, Parser, Subcommand};

use crate::config::{AppConfig, ConfigError, DEFAULT_JPEG_QUALITY};
use crate::services::fonts::load_font_dir;
use crate::services::sources::{FsSource, HttpSource, RouterSource};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid project document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("image source: {0}")]
    Source(#[from] SourceError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("server: {0}")]
    Server(std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "photolayers", about = "Layered photo composition service and flatten tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP export service (default).
    Serve,
    /// Flatten a project document into one image file.
    Flatten(FlattenArgs),
}

#[derive(Args, Debug)]
struct FlattenArgs {
    /// Project document JSON.
    project: PathBuf,

    /// Output image path.
    #[arg(short, long)]
    output: PathBuf,

    /// Height in px of the editor surface the project was composed at.
    #[arg(long)]
    reference_height: f64,

    /// `png` or `jpeg`; inferred from the output extension when omitted.
    #[arg(long)]
    format: Option<String>,

    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// Directory relative image references resolve against. Defaults to the
    /// project file's directory.
    #[arg(long, env = "ASSET_ROOT")]
    asset_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Flatten(args) => flatten_file(args).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "photolayers failed");
            ExitCode::FAILURE
        }
    }
}

fn build_sources(config: &AppConfig, asset_root: PathBuf) -> Result<RouterSource, CliError> {
    let http = HttpSource::new(config.allowed_image_hosts.clone(), config.http_timeout_secs)?;
    Ok(RouterSource { fs: FsSource::new(asset_root), http })
}

async fn serve() -> Result<(), CliError> {
    let config = AppConfig::from_env()?;
    let sources = build_sources(&config, config.asset_root.clone())?;
    let fonts = config.font_dir.as_deref().map(load_font_dir).unwrap_or_default();
    let port = config.port;
    let state = state::AppState::new(config, Arc::new(sources), fonts);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(CliError::Server)?;

    tracing::info!(%port, "photolayers listening");
    axum::serve(listener, app).await.map_err(CliError::Server)
}

/// Output format from an explicit flag, else from the output extension.
fn resolve_format(flag: Option<&str>, output: &Path, quality: u8) -> Result<OutputFormat, ConfigError> {
    let by_extension = output
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg"));
    config::parse_format(flag.or(by_extension), quality)
}

async fn flatten_file(args: FlattenArgs) -> Result<(), CliError> {
    let config = AppConfig::from_env()?;
    let format = resolve_format(args.format.as_deref(), &args.output, args.quality)?;

    let raw = tokio::fs::read_to_string(&args.project)
        .await
        .map_err(|source| CliError::Io { path: args.project.clone(), source })?;
    let document = Document::from_json(&raw)?;

    let asset_root = args
        .asset_root
        .or_else(|| args.project.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let sources = build_sources(&config, asset_root)?;
    let fonts = config.font_dir.as_deref().map(load_font_dir).unwrap_or_default();

    let bytes = flatten(&document, args.reference_height, &sources, &fonts, format).await?;
    tokio::fs::write(&args.output, &bytes)
        .await
        .map_err(|source| CliError::Io { path: args.output.clone(), source })?;
    tracing::info!(output = %args.output.display(), bytes = bytes.len(), "flattened");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
