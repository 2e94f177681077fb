//! Disk-backed poster cache.
//!
//! Files live under one cache directory, named `{imdbID}_poster.<ext>`, at
//! most one file per id. A miss triggers an OMDb lookup and download; the
//! fetched image is persisted before it is served, so every successful fetch
//! is a permanent cache entry. Concurrent fetches for the same id are
//! serialized through a per-id lock so only one upstream request runs;
//! followers find the file on disk once the leader is done.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{ApiError, ApiResult};
use crate::omdb::OmdbClient;

const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

pub struct PosterCache {
    dir: PathBuf,
    omdb: OmdbClient,
    fetch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PosterCache {
    /// Creates the cache directory if it does not exist yet.
    pub fn new(dir: PathBuf, omdb: OmdbClient) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            omdb,
            fetch_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Cache-or-fetch. Returns the image bytes and their content type.
    pub async fn get(&self, imdb_id: &str) -> ApiResult<(Vec<u8>, &'static str)> {
        validate_imdb_id(imdb_id)?;

        if let Some(hit) = self.read_cached(imdb_id).await? {
            tracing::debug!("Poster cache hit for {}", imdb_id);
            return Ok(hit);
        }

        let lock = self.fetch_lock(imdb_id).await;
        let guard = lock.lock().await;
        let result = self.fetch_and_store(imdb_id).await;
        drop(guard);

        self.release_fetch_lock(imdb_id).await;
        result
    }

    async fn fetch_and_store(&self, imdb_id: &str) -> ApiResult<(Vec<u8>, &'static str)> {
        // Another request may have finished the fetch while we waited on the
        // per-id lock.
        if let Some(hit) = self.read_cached(imdb_id).await? {
            return Ok(hit);
        }

        let url = self
            .omdb
            .poster_url(imdb_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Poster not found in OMDb.".to_string()))?;

        tracing::info!("Fetching poster for {} from {}", imdb_id, url);
        let bytes = self.omdb.download(&url).await?;

        let path = self.dir.join(format!("{}_poster.png", imdb_id));
        tokio::fs::write(&path, &bytes).await?;

        Ok((bytes, "image/png"))
    }

    /// Explicit upload. Overwrites any cached file for the id, whatever its
    /// extension, and returns the new file name.
    pub async fn put(&self, imdb_id: &str, extension: &str, bytes: &[u8]) -> ApiResult<String> {
        validate_imdb_id(imdb_id)?;

        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        let extension = if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            extension
        } else {
            "png".to_string()
        };

        if let Some(existing) = self.find_cached_path(imdb_id).await? {
            tokio::fs::remove_file(existing).await?;
        }

        let file_name = format!("{}_poster.{}", imdb_id, extension);
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;
        Ok(file_name)
    }

    /// Locate the cached file for an id, if any.
    async fn find_cached_path(&self, imdb_id: &str) -> std::io::Result<Option<PathBuf>> {
        let prefix = format!("{}_poster.", imdb_id);
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(&prefix) {
                    return Ok(Some(entry.path()));
                }
            }
        }
        Ok(None)
    }

    /// Read a cached poster. A zero-length file is treated as a corrupt
    /// partial write: it is deleted and reported as a miss so the caller
    /// refetches.
    async fn read_cached(&self, imdb_id: &str) -> ApiResult<Option<(Vec<u8>, &'static str)>> {
        let Some(path) = self.find_cached_path(imdb_id).await? else {
            return Ok(None);
        };

        let bytes = tokio::fs::read(&path).await?;
        if bytes.is_empty() {
            tracing::warn!("Removing empty cached poster {:?}", path);
            tokio::fs::remove_file(&path).await?;
            return Ok(None);
        }

        Ok(Some((bytes, content_type_for(&path))))
    }

    async fn fetch_lock(&self, imdb_id: &str) -> Arc<Mutex<()>> {
        self.fetch_locks
            .lock()
            .await
            .entry(imdb_id.to_string())
            .or_default()
            .clone()
    }

    /// Drop the map entry once nobody is queued on it. The map itself plus
    /// the caller's own handle account for two references; anything beyond
    /// that is a waiter that must keep joining the same lock.
    async fn release_fetch_lock(&self, imdb_id: &str) {
        let mut locks = self.fetch_locks.lock().await;
        if let Some(lock) = locks.get(imdb_id) {
            if Arc::strong_count(lock) <= 2 {
                locks.remove(imdb_id);
            }
        }
    }
}

fn validate_imdb_id(imdb_id: &str) -> ApiResult<()> {
    if imdb_id.is_empty() || !imdb_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::Validation("Invalid IMDb ID.".to_string()));
    }
    Ok(())
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
