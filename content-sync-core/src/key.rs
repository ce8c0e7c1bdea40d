use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Address of an object inside the bucket: the file's path relative to the
/// content root, joined with `/` whatever the host separator is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Maps a root-relative path to its key.
    ///
    /// Returns `None` when the path cannot be mapped without renaming: it is
    /// empty, absolute, climbs out with `..`, or has a component that is not
    /// valid UTF-8.
    pub fn from_relative(relative: &Path) -> Option<StorageKey> {
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str()?),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if segments.is_empty() {
            return None;
        }
        Some(StorageKey(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
