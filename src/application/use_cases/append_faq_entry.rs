use serde_json::json;
use std::sync::Arc;

use crate::application::services::{ChunkIndexer, ContextLocks};
use crate::domain::entities::{ContextItem, NewContextItem};
use crate::domain::errors::{RagError, RagResult};
use crate::domain::repositories::{ContextItemRepository, ContextRepository};
use crate::domain::value_objects::ContextKind;

/// Appends a single Q&A pair to an FAQ context and indexes it immediately.
pub struct AppendFaqEntryUseCase {
    contexts: Arc<dyn ContextRepository>,
    items: Arc<dyn ContextItemRepository>,
    indexer: Arc<ChunkIndexer>,
    locks: Arc<ContextLocks>,
}

impl AppendFaqEntryUseCase {
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
        }
    }

    pub async fn execute(
        &self,
        context_id: i64,
        question: &str,
        answer: &str,
    ) -> RagResult<ContextItem> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() || answer.is_empty() {
            return Err(RagError::invalid_input("Question and answer are required"));
        }

        let _guard = self.locks.acquire(context_id).await;

        let mut context = self
            .contexts
            .find_by_id(context_id)
            .await?
            .ok_or_else(|| RagError::not_found(format!("Context {}", context_id)))?;

        if context.kind() != ContextKind::Faq {
            return Err(RagError::invalid_input(format!(
                "Context {} is not an FAQ context",
                context_id
            )));
        }

        let existing = self.items.count_by_context_id(context_id).await?;
        let position = existing + 1;

        let item = self
            .items
            .append(&NewContextItem {
                context_id,
                title: format!("{} - Q&A {}", context.name(), position),
                content: format!("Q: {}\nA: {}", question, answer),
                order_index: Some(existing as i32),
                metadata: json!({
                    "chunk_index": existing,
                    "source": "faq_append",
                }),
                file_path: None,
            })
            .await?;

        context.set_chunk_count(position as i32);
        self.contexts.update(&context).await?;

        let report = self
            .indexer
            .index_items(&context, std::slice::from_ref(&item))
            .await;
        if let Some((_, error)) = report.failures.into_iter().next() {
            return Err(error);
        }

        tracing::info!("Appended Q&A {} to context {}", position, context_id);
        Ok(item)
    }
}
