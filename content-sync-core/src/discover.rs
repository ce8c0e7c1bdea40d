//! Discovery of content files under a content root.
//!
//! Walks the tree once with `walkdir`, following symbolic links the way a
//! plain `stat` would, and keeps every regular file whose name ends with the
//! configured suffix. Entries are sorted by file name inside each directory so
//! two runs over the same tree see the files in the same order.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::SyncError;
use crate::key::StorageKey;

/// Suffix used when none is configured.
pub const DEFAULT_SUFFIX: &str = ".json";

/// One discovered file and the key it will be published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    pub path: PathBuf,
    pub key: StorageKey,
}

/// Checks that `root` exists and is a directory.
pub fn ensure_content_root(root: &Path) -> Result<(), SyncError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SyncError::ContentRootNotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(SyncError::ContentRootMissing(root.to_path_buf()))
        }
        Err(e) => Err(SyncError::ContentRootUnreadable {
            path: root.to_path_buf(),
            source: e,
        }),
    }
}

/// True for a symlink whose target does not resolve.
fn is_dangling_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
        && std::fs::metadata(path).is_err()
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(suffix))
}

fn content_file(root: &Path, path: &Path) -> Result<ContentFile, SyncError> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let key = StorageKey::from_relative(relative)
        .ok_or_else(|| SyncError::UnmappablePath(path.to_path_buf()))?;
    Ok(ContentFile {
        path: path.to_path_buf(),
        key,
    })
}

/// Lists every file under `root` whose name ends with `suffix`.
///
/// A symlink that loops back to one of its ancestors is skipped with a
/// warning. A dangling symlink is skipped too unless its name carries the
/// suffix, in which case it is returned so the failed read shows up in the
/// report. Any other traversal failure aborts discovery with the offending
/// path attached.
pub fn discover(root: &Path, suffix: &str) -> Result<Vec<ContentFile>, SyncError> {
    ensure_content_root(root)?;
    info!(root = %root.display(), suffix, "[SYNC] Discovering content files");

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                if let Some(ancestor) = e.loop_ancestor() {
                    warn!(
                        path = %path.display(),
                        ancestor = %ancestor.display(),
                        "[SYNC] Skipping symlink cycle"
                    );
                    continue;
                }
                if is_dangling_symlink(&path) {
                    if has_suffix(&path, suffix) {
                        warn!(path = %path.display(), "[SYNC] Content file is a dangling symlink");
                        files.push(content_file(root, &path)?);
                    } else {
                        warn!(path = %path.display(), "[SYNC] Skipping dangling symlink");
                    }
                    continue;
                }
                return Err(SyncError::Walk { path, source: e });
            }
        };

        if !entry.file_type().is_file() || !has_suffix(entry.path(), suffix) {
            continue;
        }

        let file = content_file(root, entry.path())?;
        debug!(path = %file.path.display(), key = %file.key, "[SYNC] Discovered content file");
        files.push(file);
    }

    info!(count = files.len(), "[SYNC] Discovery complete");
    Ok(files)
}
