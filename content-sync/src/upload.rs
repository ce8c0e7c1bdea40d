#![doc = "Supabase Storage client: implements the core `Publisher` trait over the Storage REST API."]
//
//! # Supabase Storage integration
//!
//! [`SupabaseStorage`] uploads objects with
//! `POST {url}/storage/v1/object/{bucket}/{key}` and the `x-upsert: true`
//! header, so an existing object at the same key is overwritten.
//!
//! - Construct it from a resolved [`StorageConfig`] (URL, bucket, service key).
//! - Every failure, whether connection-level or a non-2xx status, comes back
//!   as a boxed error carrying the server's message when one was sent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Url;
use serde::Deserialize;

use content_sync_core::contract::{PublishError, PublishRequest, PublishedObject, Publisher};

use crate::load_config::StorageConfig;

const UPSERT_HEADER: &str = "x-upsert";
const API_KEY_HEADER: &str = "apikey";
const DEFAULT_CACHE_CONTROL: &str = "max-age=3600";

pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: Url,
    bucket: String,
    service_key: String,
}

/// Success body: `{"Key": "<bucket>/<key>", "Id": "..."}`.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

/// Error body: `{"statusCode": "403", "error": "Unauthorized", "message": "..."}`.
#[derive(Debug, Deserialize)]
struct StorageErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl SupabaseStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, PublishError> {
        let base_url = Url::parse(&config.url)?;
        if base_url.cannot_be_a_base() {
            return Err(format!("storage URL cannot be used as a base: {}", config.url).into());
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        tracing::info!(
            url = %base_url,
            bucket = %config.bucket,
            "Initialized Supabase storage client"
        );
        Ok(SupabaseStorage {
            client,
            base_url,
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
        })
    }

    /// Upload endpoint for `key`; every key segment is percent-encoded on its own.
    pub fn object_url(&self, key: &str) -> Result<Url, PublishError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| format!("storage URL cannot be used as a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["storage", "v1", "object", self.bucket.as_str()])
            .extend(key.split('/'));
        Ok(url)
    }

    /// Base URL under which published objects are publicly readable.
    pub fn public_base_url(&self) -> String {
        public_base_url(self.base_url.as_str(), &self.bucket)
    }
}

/// `{url}/storage/v1/object/public/{bucket}/`
pub fn public_base_url(url: &str, bucket: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/",
        url.trim_end_matches('/'),
        bucket
    )
}

#[async_trait]
impl Publisher for SupabaseStorage {
    async fn publish<'a>(&self, req: PublishRequest<'a>) -> Result<PublishedObject, PublishError> {
        if req.key.is_empty() {
            return Err("storage key must not be empty".into());
        }
        let url = self.object_url(req.key)?;
        tracing::debug!(url = %url, bytes = req.content.len(), "Uploading object");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header(API_KEY_HEADER, &self.service_key)
            .header(UPSERT_HEADER, "true")
            .header(CONTENT_TYPE, req.content_type)
            .header(CACHE_CONTROL, DEFAULT_CACHE_CONTROL)
            .body(req.content.to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, key = req.key, "Request to storage failed");
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<StorageErrorBody>(&body) {
                Ok(StorageErrorBody {
                    message: Some(message),
                    ..
                }) => message,
                Ok(StorageErrorBody {
                    error: Some(error), ..
                }) => error,
                _ => body,
            };
            tracing::error!(status = %status, key = req.key, detail = %detail, "Storage rejected upload");
            return Err(format!("HTTP {status}: {detail}").into());
        }

        let stored_as = serde_json::from_str::<UploadResponse>(&body)
            .ok()
            .and_then(|r| r.key)
            .unwrap_or_else(|| req.key.to_string());
        tracing::info!(key = req.key, stored_as = %stored_as, "Successfully uploaded object");
        Ok(PublishedObject { key: stored_as })
    }
}
