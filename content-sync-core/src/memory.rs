use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::contract::{PublishError, PublishRequest, PublishedObject, Publisher};

/// A bucket held in memory, with upsert semantics.
///
/// Keys registered through [`InMemoryPublisher::fail_on`] reject every publish
/// with a transport-style error, which lets tests exercise partial failures.
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failing: Mutex<HashSet<String>>,
    publish_calls: Mutex<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content: Vec<u8>,
    pub content_type: String,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish to `key` fail.
    pub fn fail_on(&self, key: impl Into<String>) {
        lock(&self.failing).insert(key.into());
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(key).cloned()
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    /// Every key `publish` was called with, in call order, including failures.
    pub fn publish_calls(&self) -> Vec<String> {
        lock(&self.publish_calls).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish<'a>(&self, req: PublishRequest<'a>) -> Result<PublishedObject, PublishError> {
        lock(&self.publish_calls).push(req.key.to_string());
        if lock(&self.failing).contains(req.key) {
            return Err(format!("simulated transport failure for {}", req.key).into());
        }
        lock(&self.objects).insert(
            req.key.to_string(),
            StoredObject {
                content: req.content.to_vec(),
                content_type: req.content_type.to_string(),
            },
        );
        Ok(PublishedObject {
            key: req.key.to_string(),
        })
    }
}
