use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use jawn_core::{Article, content_hash, parse_article};
use jawn_state::{ContentEntity, ContentTable};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::error::IngestError;
use crate::images::ImageUploader;
use crate::status::UploadStatus;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Per-file outcomes of a directory run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub results: Vec<(PathBuf, UploadStatus)>,
}

impl IngestReport {
    fn count(&self, pred: impl Fn(&UploadStatus) -> bool) -> usize {
        self.results.iter().filter(|(_, s)| pred(s)).count()
    }

    pub fn added(&self) -> usize {
        self.count(|s| *s == UploadStatus::Added)
    }

    pub fn updated(&self) -> usize {
        self.count(|s| *s == UploadStatus::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| *s == UploadStatus::Unchanged)
    }

    pub fn failed(&self) -> usize {
        self.count(UploadStatus::is_failure)
    }

    /// Files written or already current.
    pub fn succeeded(&self) -> usize {
        self.results.len() - self.failed()
    }
}

/// Loads Markdown articles into a [`ContentTable`].
pub struct Ingester {
    table: Arc<dyn ContentTable>,
    images: Option<ImageUploader>,
    clock: Clock,
    table_ready: AtomicBool,
}

impl std::fmt::Debug for Ingester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingester")
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}

impl Ingester {
    pub fn new(table: Arc<dyn ContentTable>) -> Self {
        Self {
            table,
            images: None,
            clock: Arc::new(Utc::now),
            table_ready: AtomicBool::new(false),
        }
    }

    /// Upload referenced images through `uploader`.
    #[must_use]
    pub fn with_images(mut self, uploader: ImageUploader) -> Self {
        self.images = Some(uploader);
        self
    }

    /// Replace the clock used for default publish dates and upload times.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    async fn ensure_table(&self) -> Result<(), IngestError> {
        if !self.table_ready.load(Ordering::Acquire) {
            self.table.ensure_table().await?;
            self.table_ready.store(true, Ordering::Release);
        }
        Ok(())
    }

    /// Parse `path` into an article, uploading and rewriting its images.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files, bad front matter or image upload errors.
    pub async fn load_article(&self, path: &Path) -> Result<Article, IngestError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let now = (self.clock)();
        let mut article = parse_article(&source, file_name, now)?;

        if let Some(uploader) = &self.images {
            let (body, images) = uploader
                .upload_referenced(&article.content, path, now)
                .await?;
            if !images.is_empty() {
                article.content = body;
                article.images = images;
                article.content_hash = content_hash(&article);
            }
        }
        Ok(article)
    }

    /// Ingest one file, propagating any failure.
    ///
    /// # Errors
    ///
    /// See [`Ingester::load_article`]; table errors also propagate.
    #[instrument(skip(self), fields(file = %path.display()))]
    pub async fn try_ingest_file(&self, path: &Path) -> Result<UploadStatus, IngestError> {
        self.ensure_table().await?;
        let article = self.load_article(path).await?;
        let entity = ContentEntity::from_article(&article)?;

        let existing = self
            .table
            .get(&entity.partition_key, &entity.row_key)
            .await?;
        let status = match existing {
            Some(stored) if stored.content_hash == entity.content_hash => {
                debug!(slug = %article.url_slug, "content hash unchanged, skipping write");
                return Ok(UploadStatus::Unchanged);
            }
            Some(_) => UploadStatus::Updated,
            None => UploadStatus::Added,
        };
        self.table.upsert(&entity).await?;
        info!(slug = %article.url_slug, %status, "article stored");
        Ok(status)
    }

    /// Ingest one file, folding any failure into [`UploadStatus::Failed`].
    pub async fn ingest_file(&self, path: &Path) -> UploadStatus {
        match self.try_ingest_file(path).await {
            Ok(status) => status,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "ingestion failed");
                UploadStatus::Failed(e.to_string())
            }
        }
    }

    /// Walk `dir` for `*.md` files and ingest each one. Files are visited in
    /// name order so reports are stable.
    ///
    /// # Errors
    ///
    /// Only fails when the table cannot be created; per-file failures are
    /// reported in the returned [`IngestReport`].
    pub async fn ingest_dir(&self, dir: &Path) -> Result<IngestReport, IngestError> {
        self.ensure_table().await?;
        let mut report = IngestReport::default();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                    report
                        .results
                        .push((path, UploadStatus::Failed(e.to_string())));
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }
            let status = self.ingest_file(entry.path()).await;
            report.results.push((entry.path().to_path_buf(), status));
        }
        info!(
            total = report.results.len(),
            added = report.added(),
            updated = report.updated(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            "directory ingestion complete"
        );
        Ok(report)
    }

    /// Ingest `path`, a Markdown file or a directory of them.
    ///
    /// # Errors
    ///
    /// A single file propagates its failure; see also [`Ingester::ingest_dir`].
    pub async fn ingest_path(&self, path: &Path) -> Result<IngestReport, IngestError> {
        if path.is_dir() {
            return self.ingest_dir(path).await;
        }
        if !path.is_file() || !is_markdown(path) {
            return Err(IngestError::NotMarkdown(path.to_path_buf()));
        }
        let status = self.try_ingest_file(path).await?;
        Ok(IngestReport {
            results: vec![(path.to_path_buf(), status)],
        })
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}
