//! jawn-loader
//!
//! Ingests Markdown articles (and the images they reference) into the
//! content table and image container.

mod load;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

/// Load Markdown tips into Azure Table Storage.
#[derive(Parser, Debug)]
#[command(name = "jawn-loader", version, about)]
pub struct Cli {
    /// Markdown file, or directory walked recursively for `*.md` files.
    path: PathBuf,

    /// Azure Storage connection string.
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,

    /// Skip image upload and leave image references untouched.
    #[arg(long)]
    no_images: bool,

    /// Blob container for uploaded images.
    #[arg(long, default_value = "content-images")]
    container: String,

    /// CDN endpoint used when building image URLs.
    #[arg(long, env = "JAWN_CDN_ENDPOINT")]
    cdn_endpoint: Option<String>,

    /// Entra ID tenant for the image upload service principal.
    #[arg(long, env = "AZURE_TENANT_ID")]
    tenant_id: Option<String>,

    /// Client ID for the image upload service principal.
    #[arg(long, env = "AZURE_CLIENT_ID")]
    client_id: Option<String>,

    /// Client secret for the image upload service principal.
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match load::run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
