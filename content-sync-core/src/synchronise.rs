//! High-level pipeline: orchestrates discover → read → validate → publish for a content root.
//!
//! This module provides the top-level orchestration for "synchronising" a local
//! content tree into an object-storage bucket. It:
//!   - Discovers every data file under the configured root (see [`crate::discover`])
//!   - Reads and validates each file, never publishing one that fails validation
//!   - Publishes valid files through a [`Publisher`] with upsert semantics
//!   - Aggregates a [`SyncReport`] with one [`UploadResult`] per discovered file
//!
//! # Responsibilities
//! - Per-file isolation: a read, validation or transport failure is recorded and
//!   the run moves on to the next file
//! - Only fatal conditions (missing root, unwalkable tree, bad concurrency) return `Err`
//! - Bounded concurrency: at most `concurrency` files are in flight, and the report
//!   is built only after every one of them has finished
//! - Cancellation: once the token fires no new file is started; files never
//!   started are reported as [`UploadOutcome::Cancelled`]
//!
//! # Navigation
//! - Main entrypoints: [`synchronise`], [`synchronise_with_cancel`], [`check`]
//! - Supporting types: [`SyncConfig`], [`SyncReport`].

use std::future::Future;
use std::path::PathBuf;

use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::contract::{PublishRequest, Publisher, JSON_CONTENT_TYPE};
use crate::discover::{discover, ContentFile, DEFAULT_SUFFIX};
use crate::error::SyncError;
use crate::report::{SyncReport, UploadOutcome, UploadResult};
use crate::validate::validate;

/// Everything a run needs to know about its input side.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub content_root: PathBuf,
    /// File-name suffix selecting data files, e.g. `.json`.
    pub suffix: String,
    /// Maximum number of files processed at once. Must be at least 1.
    pub concurrency: usize,
}

impl SyncConfig {
    /// Sequential run over `.json` files under `content_root`.
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        SyncConfig {
            content_root: content_root.into(),
            suffix: DEFAULT_SUFFIX.to_string(),
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

/// Synchronise the content root into the bucket behind `publisher`.
pub async fn synchronise<P>(config: &SyncConfig, publisher: &P) -> Result<SyncReport, SyncError>
where
    P: Publisher + ?Sized,
{
    synchronise_with_cancel(config, publisher, &CancellationToken::new()).await
}

/// Like [`synchronise`], stopping early (but accounting for every file) once `cancel` fires.
pub async fn synchronise_with_cancel<P>(
    config: &SyncConfig,
    publisher: &P,
    cancel: &CancellationToken,
) -> Result<SyncReport, SyncError>
where
    P: Publisher + ?Sized,
{
    let files = prepare(config)?;
    info!(
        root = %config.content_root.display(),
        total = files.len(),
        concurrency = config.concurrency,
        "[SYNC] Starting synchronisation"
    );

    let results = run_files(files, config.concurrency, cancel, move |file| {
        sync_file(publisher, file)
    })
    .await;

    let report = SyncReport::from_results(results);
    info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.failed,
        "[SYNC] Synchronisation finished"
    );
    Ok(report)
}

/// Dry run: discover, read and validate every file without publishing anything.
pub async fn check(config: &SyncConfig) -> Result<SyncReport, SyncError> {
    let files = prepare(config)?;
    info!(
        root = %config.content_root.display(),
        total = files.len(),
        "[CHECK] Validating content files"
    );

    let results = run_files(files, config.concurrency, &CancellationToken::new(), check_file).await;

    let report = SyncReport::from_results(results);
    info!(
        total = report.total,
        valid = report.succeeded,
        invalid = report.failed,
        "[CHECK] Validation finished"
    );
    Ok(report)
}

fn prepare(config: &SyncConfig) -> Result<Vec<ContentFile>, SyncError> {
    if config.concurrency == 0 {
        return Err(SyncError::InvalidConcurrency(config.concurrency));
    }
    discover(&config.content_root, &config.suffix)
}

/// Runs `op` over every file with at most `concurrency` in flight, keeping
/// results in discovery order.
async fn run_files<F, Fut>(
    files: Vec<ContentFile>,
    concurrency: usize,
    cancel: &CancellationToken,
    op: F,
) -> Vec<UploadResult>
where
    F: Fn(ContentFile) -> Fut,
    Fut: Future<Output = UploadResult>,
{
    stream::iter(files)
        .map(move |file| {
            let key = file.key.clone();
            let work = op(file);
            async move {
                // Checked when the buffer picks the file up, not when it was queued.
                if cancel.is_cancelled() {
                    warn!(key = %key, "[SYNC] Run cancelled, not starting file");
                    return UploadResult::cancelled(key);
                }
                work.await
            }
        })
        .buffered(concurrency)
        .collect()
        .await
}

/// A file that was read and passed validation.
struct Payload {
    content: Vec<u8>,
    sha256: String,
}

async fn load(file: &ContentFile) -> Result<Payload, UploadResult> {
    let content = match tokio::fs::read(&file.path).await {
        Ok(content) => content,
        Err(e) => {
            error!(path = %file.path.display(), error = ?e, "[SYNC][ERROR] Failed to read content file");
            return Err(UploadResult::failed(
                file.key.clone(),
                UploadOutcome::FailedRead,
                format!("failed to read {}: {e}", file.path.display()),
            ));
        }
    };

    let sha256 = {
        let mut hasher = Sha256::new();
        hasher.update(&content);
        format!("{:x}", hasher.finalize())
    };
    let bytes = content.len() as u64;

    if let Err(e) = validate(&content) {
        error!(key = %file.key, line = e.line, column = e.column, error = %e.message, "[SYNC][ERROR] Validation failed");
        return Err(
            UploadResult::failed(file.key.clone(), UploadOutcome::FailedValidation, e.to_string())
                .with_payload(bytes, sha256),
        );
    }

    Ok(Payload { content, sha256 })
}

async fn sync_file<P>(publisher: &P, file: ContentFile) -> UploadResult
where
    P: Publisher + ?Sized,
{
    let payload = match load(&file).await {
        Ok(payload) => payload,
        Err(result) => return result,
    };
    let bytes = payload.content.len() as u64;

    let req = PublishRequest {
        key: file.key.as_str(),
        content: &payload.content,
        content_type: JSON_CONTENT_TYPE,
    };
    debug!(key = %file.key, bytes, "[SYNC][UPLOAD] Publishing");
    match publisher.publish(req).await {
        Ok(published) => {
            info!(key = %file.key, stored_as = %published.key, bytes, "[SYNC][UPLOAD] Uploaded");
            UploadResult::succeeded(file.key, bytes, payload.sha256)
        }
        Err(e) => {
            error!(key = %file.key, error = %e, "[SYNC][ERROR][UPLOAD] Publish failed");
            UploadResult::failed(file.key, UploadOutcome::FailedTransport, e.to_string())
                .with_payload(bytes, payload.sha256)
        }
    }
}

async fn check_file(file: ContentFile) -> UploadResult {
    match load(&file).await {
        Ok(payload) => {
            debug!(key = %file.key, "[CHECK] Valid");
            UploadResult::succeeded(file.key, payload.content.len() as u64, payload.sha256)
        }
        Err(result) => result,
    }
}
