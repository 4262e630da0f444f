use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::CacheStore;
use crate::domain::errors::RagResult;
use crate::domain::repositories::TopicRepository;

pub const TOPIC_CONTEXTS_PREFIX: &str = "topic_contexts:";
pub const DEFAULT_TOPIC_CONTEXTS_TTL: Duration = Duration::from_secs(5 * 60);

/// Maps topic ids to the union of their associated context ids, cached
/// under `topic_contexts:<sorted,joined ids>`.
pub struct TopicContextResolver {
    topics: Arc<dyn TopicRepository>,
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

fn cache_key(topic_ids: &BTreeSet<i64>) -> String {
    let joined = topic_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}{}", TOPIC_CONTEXTS_PREFIX, joined)
}

fn key_mentions(key: &str, topic_id: i64) -> bool {
    key.strip_prefix(TOPIC_CONTEXTS_PREFIX)
        .map(|ids| {
            ids.split(',')
                .any(|id| id.parse::<i64>().ok() == Some(topic_id))
        })
        .unwrap_or(false)
}

impl TopicContextResolver {
    pub fn new(topics: Arc<dyn TopicRepository>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            topics,
            store,
            ttl: DEFAULT_TOPIC_CONTEXTS_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn resolve(&self, topic_ids: &BTreeSet<i64>) -> RagResult<BTreeSet<i64>> {
        let key = cache_key(topic_ids);

        match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<BTreeSet<i64>>(&raw) {
                Ok(context_ids) => return Ok(context_ids),
                Err(e) => {
                    tracing::warn!("Dropping unreadable cache entry {}: {}", key, e);
                    if let Err(e) = self.store.delete(&key).await {
                        tracing::warn!("Failed to purge {}: {}", key, e);
                    }
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Topic context cache unavailable: {}", e),
        }

        let ids: Vec<i64> = topic_ids.iter().copied().collect();
        let context_ids = self.topics.context_ids_for_topics(&ids).await?;

        match serde_json::to_string(&context_ids) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&key, raw, self.ttl).await {
                    tracing::warn!("Failed to cache {}: {}", key, e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize context ids: {}", e),
        }

        Ok(context_ids)
    }

    /// Drops every cached resolution that includes `topic_id`.
    pub async fn invalidate(&self, topic_id: i64) -> RagResult<usize> {
        let keys = self.store.keys_with_prefix(TOPIC_CONTEXTS_PREFIX).await?;
        let mut removed = 0;

        for key in keys.iter().filter(|key| key_mentions(key, topic_id)) {
            if self.store.delete(key).await? {
                removed += 1;
            }
        }

        tracing::debug!("Invalidated {} topic context entries for topic {}", removed, topic_id);
        Ok(removed)
    }
}
