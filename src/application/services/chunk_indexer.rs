use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::VectorIndex;
use crate::application::ports::vector_index::{PointPayload, VectorPoint};
use crate::application::services::deadline::with_timeout;
use crate::application::services::{EmbeddingService, RetryPolicy};
use crate::domain::entities::{Context, ContextItem};
use crate::domain::errors::{RagError, RagResult};
use crate::domain::repositories::ContextItemRepository;

pub const DEFAULT_UPSERT_TIMEOUT: Duration = Duration::from_secs(10);

const INDEX_STATUS_KEY: &str = "index_status";
const INDEX_ERROR_KEY: &str = "index_error";

/// Result of embedding and indexing a batch of chunks.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub indexed: usize,
    pub failures: Vec<(i64, RagError)>,
}

impl IndexReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Embeds persisted chunks and upserts them into the vector index, one point
/// per ContextItem. Transient failures are retried; a chunk that still fails
/// is marked in its metadata and the batch continues.
pub struct ChunkIndexer {
    embeddings: Arc<EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    items: Arc<dyn ContextItemRepository>,
    collection: String,
    retry: RetryPolicy,
    upsert_timeout: Duration,
}

impl ChunkIndexer {
    pub fn new(
        embeddings: Arc<EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        items: Arc<dyn ContextItemRepository>,
        collection: String,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            embeddings,
            index,
            items,
            collection,
            retry,
            upsert_timeout: DEFAULT_UPSERT_TIMEOUT,
        }
    }

    pub fn with_upsert_timeout(mut self, timeout: Duration) -> Self {
        self.upsert_timeout = timeout;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension()
    }

    pub async fn index_items(&self, context: &Context, items: &[ContextItem]) -> IndexReport {
        let mut report = IndexReport::default();

        for item in items {
            match self.index_item(context, item).await {
                Ok(()) => {
                    report.indexed += 1;
                    self.clear_failure_mark(item).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to index item {} of context {}: {}",
                        item.id(),
                        context.id(),
                        e
                    );
                    self.mark_failure(item, &e).await;
                    report.failures.push((item.id(), e));
                }
            }
        }

        report
    }

    pub async fn index_item(&self, context: &Context, item: &ContextItem) -> RagResult<()> {
        let vector = self
            .retry
            .run("embed chunk", || self.embeddings.embed(item.content()))
            .await?;

        let point = VectorPoint {
            id: item.id(),
            vector,
            payload: PointPayload {
                context_item_id: item.id(),
                context_id: context.id(),
                context_type: context.kind().as_str().to_string(),
                title: item.title().to_string(),
                content: item.content().to_string(),
                chunk_index: item.chunk_index(),
            },
        };

        self.retry
            .run("upsert point", || {
                with_timeout(
                    self.upsert_timeout,
                    "vector upsert",
                    self.index.upsert(&self.collection, point.clone()),
                )
            })
            .await?;

        Ok(())
    }

    async fn mark_failure(&self, item: &ContextItem, error: &RagError) {
        let mut metadata = item.metadata().clone();
        if let Some(map) = metadata.as_object_mut() {
            map.insert(INDEX_STATUS_KEY.to_string(), "failed".into());
            map.insert(INDEX_ERROR_KEY.to_string(), error.kind().to_string().into());
        }
        if let Err(e) = self.items.update_metadata(item.id(), &metadata).await {
            tracing::warn!("Failed to mark item {} as failed: {}", item.id(), e);
        }
    }

    async fn clear_failure_mark(&self, item: &ContextItem) {
        let mut metadata = item.metadata().clone();
        let Some(map) = metadata.as_object_mut() else {
            return;
        };
        if map.remove(INDEX_STATUS_KEY).is_none() {
            return;
        }
        map.remove(INDEX_ERROR_KEY);
        if let Err(e) = self.items.update_metadata(item.id(), &metadata).await {
            tracing::warn!("Failed to clear failure mark on item {}: {}", item.id(), e);
        }
    }
}
