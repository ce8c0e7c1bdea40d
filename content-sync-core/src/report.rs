//! Per-file results and the aggregate report of a run.

use std::fmt;

use serde::Serialize;

use crate::key::StorageKey;

/// How processing of a single file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    Succeeded,
    /// The file was discovered but could not be read.
    FailedRead,
    FailedValidation,
    FailedTransport,
    /// The run was cancelled before this file was started.
    Cancelled,
}

impl UploadOutcome {
    pub fn is_success(self) -> bool {
        self == UploadOutcome::Succeeded
    }

    /// Same spelling as the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            UploadOutcome::Succeeded => "succeeded",
            UploadOutcome::FailedRead => "failed_read",
            UploadOutcome::FailedValidation => "failed_validation",
            UploadOutcome::FailedTransport => "failed_transport",
            UploadOutcome::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result for one content file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub key: StorageKey,
    pub outcome: UploadOutcome,
    /// Diagnostic for failures; `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload size, known once the file has been read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    /// Hex SHA-256 of the payload, known once the file has been read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl UploadResult {
    pub fn succeeded(key: StorageKey, bytes: u64, sha256: String) -> Self {
        UploadResult {
            key,
            outcome: UploadOutcome::Succeeded,
            message: None,
            bytes: Some(bytes),
            sha256: Some(sha256),
        }
    }

    pub fn failed(key: StorageKey, outcome: UploadOutcome, message: impl Into<String>) -> Self {
        UploadResult {
            key,
            outcome,
            message: Some(message.into()),
            bytes: None,
            sha256: None,
        }
    }

    pub fn cancelled(key: StorageKey) -> Self {
        Self::failed(key, UploadOutcome::Cancelled, "run cancelled before this file was started")
    }

    pub(crate) fn with_payload(mut self, bytes: u64, sha256: String) -> Self {
        self.bytes = Some(bytes);
        self.sha256 = Some(sha256);
        self
    }
}

/// Outcome of a whole run, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    pub results: Vec<UploadResult>,
}

impl SyncReport {
    pub fn from_results(results: Vec<UploadResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
        let total = results.len();
        SyncReport {
            succeeded,
            failed: total - succeeded,
            total,
            results,
        }
    }

    /// True when every discovered file succeeded (vacuously true for an empty root).
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadResult> {
        self.results.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn keys(&self) -> impl Iterator<Item = &StorageKey> {
        self.results.iter().map(|r| &r.key)
    }
}
