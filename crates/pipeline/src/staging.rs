//! Staging of uploaded files for URL-based ingestion.
//!
//! The provider ingests by URL, so every upload is written to a directory the
//! HTTP layer serves under [`STAGING_URL_PATH`]. Each staged file is a scoped
//! resource: dropping the [`StagedFile`] removes it from disk.
//!
//! The provider fetches the URL after it has answered the submission, so a
//! file for an accepted asset is handed to [`StagingArea::hold`]. It stays on
//! disk until the asset's ready or errored event releases it, or until the
//! retention period runs out.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tempfile::TempPath;

/// URL path under which the staging directory is served.
pub const STAGING_URL_PATH: &str = "/clips/temp";

/// Longest sanitized original-name component kept in a staged file name.
const MAX_NAME_LEN: usize = 80;

/// Fallback name when the client sent none (or nothing usable).
const DEFAULT_NAME: &str = "upload.mp4";

/// How long a held file waits for its release before it is removed anyway.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Directory plus public base URL that together make staged files reachable.
///
/// Clones share the set of held files.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    public_base_url: String,
    retention: Duration,
    held: Arc<Mutex<HashMap<String, StagedFile>>>,
}

/// A staged upload. The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    url: String,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            retention: DEFAULT_RETENTION,
            held: Arc::default(),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Write `data` to a uniquely named file derived from `original_name`.
    ///
    /// The name is `clip-<random>-<sanitized original>`; the random part is
    /// created with `O_EXCL`, so concurrent uploads of the same file name
    /// never collide. A failed write removes the partial file.
    pub async fn stage(&self, original_name: &str, data: &[u8]) -> io::Result<StagedFile> {
        let suffix = format!("-{}", sanitize_file_name(original_name));
        let file = tempfile::Builder::new()
            .prefix("clip-")
            .suffix(&suffix)
            .tempfile_in(&self.dir)?;
        let path = file.into_temp_path();

        tokio::fs::write(&path, data).await?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = format!("{}{}/{}", self.public_base_url, STAGING_URL_PATH, file_name);

        Ok(StagedFile { path, url })
    }

    /// Keep `file` on disk until [`release`](Self::release) is called with
    /// `key` or the retention period elapses.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn hold(&self, key: &str, file: StagedFile) {
        let path = file.path().to_path_buf();
        lock(&self.held).insert(key.to_string(), file);

        let held = Arc::clone(&self.held);
        let key = key.to_string();
        let retention = self.retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            let expired = {
                let mut held = lock(&held);
                let same_file = held
                    .get(&key)
                    .is_some_and(|file| file.path() == path.as_path());
                if same_file {
                    held.remove(&key)
                } else {
                    None
                }
            };
            if expired.is_some() {
                tracing::info!(
                    key = %key,
                    staged = %path.display(),
                    "Staged upload retention elapsed before release"
                );
            }
        });
    }

    /// Remove the file held under `key`. Returns whether one was held.
    pub fn release(&self, key: &str) -> bool {
        let released = lock(&self.held).remove(key);
        match released {
            Some(file) => {
                tracing::debug!(key, staged = %file.path().display(), "Released staged upload");
                true
            }
            None => false,
        }
    }
}

fn lock(held: &Mutex<HashMap<String, StagedFile>>) -> MutexGuard<'_, HashMap<String, StagedFile>> {
    held.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Public URL the provider fetches the file from.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Reduce a client-supplied file name to a URL- and filesystem-safe form.
///
/// Directory components are dropped, anything outside `[A-Za-z0-9._-]`
/// becomes `_`, and leading dots are stripped so the result can never be a
/// hidden file or a path traversal.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    let start = trimmed.len().saturating_sub(MAX_NAME_LEN);
    let kept = &trimmed[start..];

    if kept.is_empty() || kept.chars().all(|c| c == '_') {
        DEFAULT_NAME.to_string()
    } else {
        kept.to_string()
    }
}
