//! # contract: the storage capability used by the synchroniser
//!
//! This module defines the single trait ([`Publisher`]) through which the
//! synchroniser talks to object storage, plus the plain data types that cross
//! that seam.
//!
//! ## Interface & Extensibility
//! - Implement [`Publisher`] for a new storage backend (Supabase Storage, S3, local disk).
//! - The one method is async and returns a boxed error so backends can surface
//!   whatever detail their transport produces.
//! - Implementors must give `publish` upsert semantics: an existing object at the
//!   same key is overwritten, never appended to or versioned alongside.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so `MockPublisher` is available to
//!   tests in this crate and (through the default `test-export-mocks` feature)
//!   to dependents.
//! - For state-based tests prefer [`crate::memory::InMemoryPublisher`].

use async_trait::async_trait;

use mockall::automock;

/// Content type declared for every published object.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Error type returned by publishers (transport, auth, quota, ...).
pub type PublishError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a backend needs to store one object.
pub struct PublishRequest<'a> {
    /// Storage key: relative path with forward slashes, never empty.
    pub key: &'a str,
    /// The validated payload.
    pub content: &'a [u8],
    /// MIME type to declare to the backend.
    pub content_type: &'a str,
}

/// What a backend reports back after a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedObject {
    /// Key the object was stored under. Backends may echo a bucket-qualified form.
    pub key: String,
}

/// Trait for publishing validated content into an object-storage bucket.
///
/// The trait is `Send` + `Sync` so the synchroniser can drive several publishes
/// concurrently from one shared reference.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create or overwrite the object at `req.key`.
    async fn publish<'a>(&self, req: PublishRequest<'a>) -> Result<PublishedObject, PublishError>;
}
