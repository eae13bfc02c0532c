use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use jawn_azure::{AzureBaseConfig, AzureBlobStore, AzureContentTable, StorageConnection};
use jawn_images::ImageUrls;
use jawn_ingest::{IngestReport, ImageUploader, Ingester, UploadStatus};
use tracing::info;

use crate::{Cli, OutputFormat};

/// Run the loader. Returns `Ok(false)` when any file failed.
pub async fn run(cli: &Cli) -> anyhow::Result<bool> {
    if !cli.path.exists() {
        bail!("path not found: {}", cli.path.display());
    }
    let connection_string = cli
        .connection_string
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .context("AZURE_STORAGE_CONNECTION_STRING is not set")?;
    let connection =
        StorageConnection::parse(connection_string).context("invalid storage connection string")?;

    let blob_endpoint = connection.blob_endpoint.clone();
    let table = AzureContentTable::new(connection)?;
    let mut ingester = Ingester::new(Arc::new(table));

    if !cli.no_images {
        let mut azure = AzureBaseConfig::default();
        azure.tenant_id.clone_from(&cli.tenant_id);
        azure.client_id.clone_from(&cli.client_id);
        azure.client_credential.clone_from(&cli.client_secret);
        let store = AzureBlobStore::new(&blob_endpoint, &azure)
            .await
            .context("failed to create blob client")?;
        info!(endpoint = %store.endpoint(), container = %cli.container, "image upload enabled");
        let urls = ImageUrls::new(cli.cdn_endpoint.clone(), cli.container.clone());
        ingester = ingester.with_images(ImageUploader::new(Arc::new(store), urls));
    }

    let report = load(&ingester, &cli.path).await?;
    print!("{}", render_report(&report, &cli.format)?);
    Ok(report.failed() == 0)
}

/// Ingest `path` with an already configured ingester.
async fn load(ingester: &Ingester, path: &Path) -> anyhow::Result<IngestReport> {
    ingester
        .ingest_path(path)
        .await
        .with_context(|| format!("failed to ingest {}", path.display()))
}

fn render_report(report: &IngestReport, format: &OutputFormat) -> anyhow::Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let files: Vec<_> = report
                .results
                .iter()
                .map(|(path, status)| {
                    serde_json::json!({
                        "path": path.display().to_string(),
                        "status": status.to_string(),
                    })
                })
                .collect();
            let summary = serde_json::json!({
                "files": files,
                "added": report.added(),
                "updated": report.updated(),
                "unchanged": report.unchanged(),
                "failed": report.failed(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
        OutputFormat::Text => {
            for (path, status) in &report.results {
                let marker = match status {
                    UploadStatus::Added | UploadStatus::Updated => "+",
                    UploadStatus::Unchanged => "=",
                    UploadStatus::Failed(_) => "!",
                };
                writeln!(out, "  {marker} {} ({status})", path.display())?;
            }
            writeln!(
                out,
                "{} succeeded ({} added, {} updated), {} unchanged, {} failed",
                report.succeeded(),
                report.added(),
                report.updated(),
                report.unchanged(),
                report.failed(),
            )?;
        }
    }
    Ok(out)
}
