use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::application::ports::vector_index::DistanceMetric;
use crate::application::services::{ChunkIndexer, ContextLocks};
use crate::application::use_cases::BulkOutcome;
use crate::domain::entities::{Context, context_item::sort_by_order};
use crate::domain::errors::{RagError, RagResult};
use crate::domain::repositories::{ContextItemRepository, ContextRepository};

pub const DEFAULT_REINDEX_CONCURRENCY: usize = 4;

/// Re-embeds and re-indexes the existing chunks of a set of contexts.
///
/// Contexts run concurrently up to the configured limit; a failing context
/// is marked FAILED and reported without stopping the others.
pub struct ReindexContextsUseCase {
    contexts: Arc<dyn ContextRepository>,
    items: Arc<dyn ContextItemRepository>,
    indexer: Arc<ChunkIndexer>,
    locks: Arc<ContextLocks>,
    concurrency: usize,
}

impl ReindexContextsUseCase {
    pub fn new(
        contexts: Arc<dyn ContextRepository>,
        items: Arc<dyn ContextItemRepository>,
        indexer: Arc<ChunkIndexer>,
        locks: Arc<ContextLocks>,
    ) -> Self {
        Self {
            contexts,
            items,
            indexer,
            locks,
            concurrency: DEFAULT_REINDEX_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn execute(&self, context_ids: &[i64], reset: bool) -> RagResult<BulkOutcome> {
        if context_ids.is_empty() {
            return Err(RagError::invalid_input("No context ids given"));
        }

        self.prepare_collection(reset).await?;

        let mut ids = context_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let results: Vec<(i64, RagResult<()>)> = stream::iter(ids)
            .map(|id| async move { (id, self.reindex_one(id).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut outcome = BulkOutcome::default();
        for (id, result) in results {
            outcome.record(id, result);
        }
        outcome.sort_failures();

        tracing::info!(
            "Reindex finished: {} succeeded, {} failed",
            outcome.affected_count,
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// Recreates the collection when asked to, or when its dimension no
    /// longer matches the embedding model.
    async fn prepare_collection(&self, reset: bool) -> RagResult<()> {
        let index = self.indexer.index();
        let collection = self.indexer.collection();
        let dimension = self.indexer.embedding_dimension();

        let current = index.collection_dimension(collection).await?;
        match current {
            Some(existing) if !reset && existing == dimension => Ok(()),
            None if !reset => {
                index
                    .ensure_collection(collection, dimension, DistanceMetric::Cosine)
                    .await?;
                Ok(())
            }
            _ => {
                tracing::warn!(
                    "Recreating collection {} (reset: {}, dimension {:?} -> {})",
                    collection,
                    reset,
                    current,
                    dimension
                );
                index
                    .recreate_collection(collection, dimension, DistanceMetric::Cosine)
                    .await?;
                Ok(())
            }
        }
    }

    async fn reindex_one(&self, context_id: i64) -> RagResult<()> {
        let _guard = self.locks.acquire(context_id).await;

        let mut context = self
            .contexts
            .find_by_id(context_id)
            .await?
            .ok_or_else(|| RagError::not_found(format!("Context {}", context_id)))?;

        context.reset_for_reindex().map_err(RagError::InvalidInput)?;
        self.contexts.update(&context).await?;
        context.start_processing().map_err(RagError::InvalidInput)?;
        self.contexts.update(&context).await?;

        match self.rebuild(&mut context).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if context.fail_processing(None).is_ok() {
                    if let Err(update_error) = self.contexts.update(&context).await {
                        tracing::error!(
                            "Failed to persist FAILED for context {}: {}",
                            context_id,
                            update_error
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn rebuild(&self, context: &mut Context) -> RagResult<()> {
        let mut items = self.items.find_by_context_id(context.id()).await?;
        sort_by_order(&mut items);

        self.indexer
            .index()
            .delete_by_context(self.indexer.collection(), context.id())
            .await?;

        let report = self.indexer.index_items(context, &items).await;
        let chunk_count = items.len() as i32;

        if let Some((item_id, error)) = report.failures.into_iter().next() {
            context
                .fail_processing(Some(chunk_count))
                .map_err(RagError::InvalidInput)?;
            self.contexts.update(context).await?;
            tracing::warn!("Context {} left FAILED by item {}", context.id(), item_id);
            return Err(error);
        }

        context
            .complete_processing(chunk_count)
            .map_err(RagError::InvalidInput)?;
        self.contexts.update(context).await?;
        Ok(())
    }
}
