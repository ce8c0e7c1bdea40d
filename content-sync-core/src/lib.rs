#![doc = "content-sync-core: core logic library for content-sync."]

//! This crate holds the data model and pipeline that publish a local tree of
//! JSON lesson and manifest files into an object-storage bucket.
//! It contains no network code: storage backends plug in through
//! [`contract::Publisher`].
//!
//! # Usage
//! Build a [`synchronise::SyncConfig`], hand it a publisher, and inspect the
//! returned [`report::SyncReport`].

pub mod contract;
pub mod discover;
pub mod error;
pub mod key;
pub mod memory;
pub mod report;
pub mod synchronise;
pub mod validate;

pub use contract::{PublishError, PublishRequest, PublishedObject, Publisher};
pub use error::SyncError;
pub use key::StorageKey;
pub use report::{SyncReport, UploadOutcome, UploadResult};
pub use synchronise::{check, synchronise, synchronise_with_cancel, SyncConfig};
