/// `load_config` module: loads the static YAML config and injects the storage secret from the environment.
///
/// This module is the only place where user-supplied YAML is parsed and mapped
/// to the strongly-typed structs the core crate and the storage client expect.
///
/// # Responsibilities
/// - Parse the YAML file into [`FileConfig`]
/// - Read `SUPABASE_SERVICE_ROLE_KEY` for the storage credential; it is never read from the file
/// - Produce clear diagnostics: every failure names the file, field or variable at fault
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary as configuration errors.
use anyhow::{bail, Context, Result};
use content_sync_core::discover::DEFAULT_SUFFIX;
use content_sync_core::SyncConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable holding the service-role key used for uploads.
pub const SERVICE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Content root used when neither the file nor the command line names one.
pub const DEFAULT_CONTENT_ROOT: &str = "./supabase_content";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub storage: Option<StorageSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Project URL, e.g. `https://<project>.supabase.co`.
    pub url: String,
    pub bucket: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Storage section merged with the secret from the environment.
#[derive(Clone)]
pub struct StorageConfig {
    pub url: String,
    pub bucket: String,
    pub service_key: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url)
            .field("bucket", &self.bucket)
            .field("service_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig {
            content_root: default_content_root(),
            suffix: default_suffix(),
            concurrency: default_concurrency(),
            storage: None,
        }
    }
}

impl FileConfig {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(&self.content_root)
            .with_suffix(&self.suffix)
            .with_concurrency(self.concurrency)
    }
}

fn default_content_root() -> PathBuf {
    PathBuf::from(DEFAULT_CONTENT_ROOT)
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: FileConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.suffix.is_empty() {
        bail!("suffix must not be empty");
    }
    Ok(config)
}

/// Resolves the storage section of `config` and injects the service key from the environment.
pub fn storage_config(config: &FileConfig) -> Result<StorageConfig> {
    let section = config
        .storage
        .as_ref()
        .context("config has no `storage` section (url and bucket are required for sync)")?;

    if section.bucket.trim().is_empty() {
        bail!("storage.bucket must not be empty");
    }
    reqwest::Url::parse(&section.url)
        .with_context(|| format!("storage.url is not a valid URL: {}", section.url))?;

    let service_key = match std::env::var(SERVICE_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => {
            info!("{SERVICE_KEY_ENV} found in env");
            key
        }
        Ok(_) => {
            error!("{SERVICE_KEY_ENV} is empty");
            bail!("{SERVICE_KEY_ENV} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{SERVICE_KEY_ENV} environment variable not set");
            bail!("{SERVICE_KEY_ENV} environment variable not set: {e}");
        }
    };

    info!(url = %section.url, bucket = %section.bucket, "Storage config resolved");
    Ok(StorageConfig {
        url: section.url.clone(),
        bucket: section.bucket.clone(),
        service_key,
        timeout_secs: section.timeout_secs,
    })
}
