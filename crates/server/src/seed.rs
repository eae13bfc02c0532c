use std::path::Path;
use std::sync::Arc;

use jawn_blob::BlobStore;
use jawn_images::ImageUrls;
use jawn_ingest::{ImageUploader, Ingester};
use jawn_state::ContentTable;
use tracing::{info, warn};

use crate::error::ServerError;

/// Ingest every Markdown file under `dir` into `table`, uploading the images
/// they reference. Used to populate the in-memory backend at startup.
///
/// Individual file failures are logged and skipped.
pub async fn seed_content(
    dir: &Path,
    table: Arc<dyn ContentTable>,
    images: Arc<dyn BlobStore>,
    urls: ImageUrls,
) -> Result<(), ServerError> {
    let ingester = Ingester::new(table).with_images(ImageUploader::new(images, urls));
    let report = ingester
        .ingest_dir(dir)
        .await
        .map_err(|e| ServerError::Config(format!("failed to seed {}: {e}", dir.display())))?;

    for (path, status) in &report.results {
        if status.is_failure() {
            warn!(path = %path.display(), status = %status, "seed file skipped");
        }
    }
    info!(
        dir = %dir.display(),
        added = report.added(),
        failed = report.failed(),
        "seed content loaded"
    );
    Ok(())
}
