use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::EmbeddingCache;
use crate::domain::value_objects::Sha256Digest;

#[derive(Serialize, Deserialize)]
struct CachedEmbedding {
    embedding: Vec<f32>,
}

/// Embedding cache backed by one JSON file per key, fanned out into
/// subdirectories by the first two hex characters of the digest.
pub struct DiskEmbeddingCache {
    base_path: PathBuf,
}

impl DiskEmbeddingCache {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn get_file_path(&self, key: &Sha256Digest) -> PathBuf {
        let key = key.as_str();
        self.base_path.join(&key[..2]).join(format!("{}.json", key))
    }
}

#[async_trait]
impl EmbeddingCache for DiskEmbeddingCache {
    async fn get(&self, key: &Sha256Digest) -> Option<Vec<f32>> {
        let file_path = self.get_file_path(key);
        let raw = fs::read(&file_path).await.ok()?;

        match serde_json::from_slice::<CachedEmbedding>(&raw) {
            Ok(cached) if !cached.embedding.is_empty() => Some(cached.embedding),
            _ => {
                tracing::warn!("Ignoring unreadable embedding cache entry {}", file_path.display());
                None
            }
        }
    }

    async fn put(&self, key: &Sha256Digest, vector: &[f32]) {
        let file_path = self.get_file_path(key);
        let body = match serde_json::to_vec(&CachedEmbedding {
            embedding: vector.to_vec(),
        }) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to encode embedding for cache: {}", e);
                return;
            }
        };

        if let Some(parent) = file_path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                tracing::warn!("Failed to create cache directory {}: {}", parent.display(), e);
                return;
            }
        }

        // Write then rename so concurrent readers never see a partial file.
        let tmp_path = file_path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp_path, body).await {
            tracing::warn!("Failed to write embedding cache entry: {}", e);
            return;
        }
        if let Err(e) = fs::rename(&tmp_path, &file_path).await {
            tracing::warn!("Failed to commit embedding cache entry: {}", e);
            let _ = fs::remove_file(&tmp_path).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get_uses_sharded_layout() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskEmbeddingCache::new(dir.path());
        let key = Sha256Digest::for_embedding("text-embedding-3-small", "hello");

        assert_eq!(cache.get(&key).await, None);
        cache.put(&key, &[0.25, -1.0]).await;
        assert_eq!(cache.get(&key).await, Some(vec![0.25, -1.0]));

        let expected = dir
            .path()
            .join(&key.as_str()[..2])
            .join(format!("{}.json", key.as_str()));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskEmbeddingCache::new(dir.path());
        let key = Sha256Digest::for_embedding("m", "t");

        let path = cache.get_file_path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        assert_eq!(cache.get(&key).await, None);
    }
}
