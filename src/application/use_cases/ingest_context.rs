use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::DocumentParser;
use crate::application::services::{ChunkIndexer, ContextLocks, RetryPolicy, TextChunker};
use crate::domain::entities::{Context, NewContextItem};
use crate::domain::errors::{RagError, RagResult};
use crate::domain::repositories::{ContextItemRepository, ContextRepository};
use crate::domain::value_objects::{ContextKind, ProcessingStatus};

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub context_id: i64,
    pub path: PathBuf,
    pub title: String,
    /// Recorded in every chunk's metadata. Background jobs pass their job id.
    pub task_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub context_id: i64,
    pub task_id: Uuid,
    pub chunk_count: usize,
    pub indexed_count: usize,
    pub failed_item_ids: Vec<i64>,
    pub status: ProcessingStatus,
}

/// Parse, chunk, persist, embed and index one context.
pub struct IngestContextUseCase {
    contexts: Arc<dyn ContextRepository>,
    items: Arc<dyn ContextItemRepository>,
    parser: Arc<dyn DocumentParser>,
    chunker: TextChunker,
    indexer: Arc<ChunkIndexer>,
    locks: Arc<ContextLocks>,
    retry: RetryPolicy,
}

impl IngestContextUseCase {
    pub fn new(
        contexts: Arc<dyn ContextRepository>,
        items: Arc<dyn ContextItemRepository>,
        parser: Arc<dyn DocumentParser>,
        indexer: Arc<ChunkIndexer>,
        locks: Arc<ContextLocks>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            contexts,
            items,
            parser,
            chunker: TextChunker::default(),
            indexer,
            locks,
            retry,
        }
    }

    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub async fn ingest_pdf(&self, context_id: i64, path: &Path, title: &str) -> RagResult<IngestOutcome> {
        self.ingest_kind(ContextKind::Pdf, context_id, path, title).await
    }

    pub async fn ingest_markdown(
        &self,
        context_id: i64,
        path: &Path,
        title: &str,
    ) -> RagResult<IngestOutcome> {
        self.ingest_kind(ContextKind::Markdown, context_id, path, title)
            .await
    }

    pub async fn ingest_faq(&self, context_id: i64, path: &Path, title: &str) -> RagResult<IngestOutcome> {
        self.ingest_kind(ContextKind::Faq, context_id, path, title).await
    }

    async fn ingest_kind(
        &self,
        kind: ContextKind,
        context_id: i64,
        path: &Path,
        title: &str,
    ) -> RagResult<IngestOutcome> {
        let request = IngestRequest {
            context_id,
            path: path.to_path_buf(),
            title: title.to_string(),
            task_id: None,
        };
        self.run(Some(kind), request).await
    }

    /// Ingests using the parser matching the context's own kind.
    pub async fn execute(&self, request: IngestRequest) -> RagResult<IngestOutcome> {
        self.run(None, request).await
    }

    async fn run(&self, expected: Option<ContextKind>, request: IngestRequest) -> RagResult<IngestOutcome> {
        if request.title.trim().is_empty() {
            return Err(RagError::invalid_input("Title cannot be empty"));
        }

        let _guard = self.locks.acquire(request.context_id).await;
        let task_id = request.task_id.unwrap_or_else(Uuid::new_v4);

        // Find the context
        let mut context = self
            .contexts
            .find_by_id(request.context_id)
            .await?
            .ok_or_else(|| RagError::not_found(format!("Context {}", request.context_id)))?;

        if let Some(kind) = expected {
            if context.kind() != kind {
                return Err(RagError::invalid_input(format!(
                    "Context {} is {}, not {}",
                    context.id(),
                    context.kind().as_str(),
                    kind.as_str()
                )));
            }
        }

        // A finished or abandoned context goes back through PENDING first
        if !context.processing_status().is_pending() {
            context.reset_for_reindex().map_err(RagError::InvalidInput)?;
            self.contexts.update(&context).await?;
        }
        context.start_processing().map_err(RagError::InvalidInput)?;
        self.contexts.update(&context).await?;

        tracing::info!(
            "Ingesting context {} ({}) from {} [task {}]",
            context.id(),
            context.kind().as_str(),
            request.path.display(),
            task_id
        );

        match self.process(&mut context, &request, task_id).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!("Ingest of context {} failed: {}", context.id(), e);
                self.mark_failed(&mut context).await;
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        context: &mut Context,
        request: &IngestRequest,
        task_id: Uuid,
    ) -> RagResult<IngestOutcome> {
        // Parse
        let text = self.parser.parse(context.kind(), &request.path).await?;
        context.set_original_content(text.clone());

        if text.trim().is_empty() {
            self.items.replace_for_context(context.id(), &[]).await?;
            self.clear_index(context.id()).await?;
            context
                .complete_processing(0)
                .map_err(RagError::InvalidInput)?;
            self.contexts.update(context).await?;
            return Ok(outcome(context, task_id, 0, 0, Vec::new()));
        }

        // Chunk and persist atomically before any embedding call
        let chunks = self.chunker.chunk(&text);
        let total = chunks.len();
        let source_path = request.path.display().to_string();
        let new_items: Vec<NewContextItem> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, content)| NewContextItem {
                context_id: context.id(),
                title: format!("{} - Chunk {}", request.title, i + 1),
                metadata: json!({
                    "chunk_index": i,
                    "total_chunks": total,
                    "chunk_size": content.chars().count(),
                    "task_id": task_id.to_string(),
                    "source_path": source_path,
                }),
                content,
                order_index: Some(i as i32),
                file_path: Some(source_path.clone()),
            })
            .collect();

        let persisted = self.items.replace_for_context(context.id(), &new_items).await?;
        context.set_chunk_count(persisted.len() as i32);
        self.contexts.update(context).await?;

        // Embed and index
        self.clear_index(context.id()).await?;
        let report = self.indexer.index_items(context, &persisted).await;

        let chunk_count = persisted.len() as i32;
        if report.is_complete() {
            context
                .complete_processing(chunk_count)
                .map_err(RagError::InvalidInput)?;
        } else {
            context
                .fail_processing(Some(chunk_count))
                .map_err(RagError::InvalidInput)?;
        }
        self.contexts.update(context).await?;

        tracing::info!(
            "Context {} ingested: {} chunks, {} indexed, {} failed",
            context.id(),
            chunk_count,
            report.indexed,
            report.failures.len()
        );

        let failed = report.failures.iter().map(|(id, _)| *id).collect();
        Ok(outcome(context, task_id, persisted.len(), report.indexed, failed))
    }

    async fn clear_index(&self, context_id: i64) -> RagResult<()> {
        let index = self.indexer.index();
        let collection = self.indexer.collection();
        self.retry
            .run("delete context points", || async {
                index
                    .delete_by_context(collection, context_id)
                    .await
                    .map_err(RagError::from)
            })
            .await
    }

    async fn mark_failed(&self, context: &mut Context) {
        if context.fail_processing(None).is_err() {
            return;
        }
        if let Err(e) = self.contexts.update(context).await {
            tracing::error!("Failed to persist FAILED for context {}: {}", context.id(), e);
        }
    }
}

fn outcome(
    context: &Context,
    task_id: Uuid,
    chunk_count: usize,
    indexed_count: usize,
    failed_item_ids: Vec<i64>,
) -> IngestOutcome {
    IngestOutcome {
        context_id: context.id(),
        task_id,
        chunk_count,
        indexed_count,
        failed_item_ids,
        status: context.processing_status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[tokio::test]
    async fn test_single_chunk_pdf() {
        let harness = Harness::new();
        harness.contexts.add_context(5, ContextKind::Pdf);
        harness.parser.set_text("doc.pdf", "Hello.");

        let outcome = harness
            .ingest
            .ingest_pdf(5, Path::new("doc.pdf"), "Doc")
            .await
            .unwrap();

        assert_eq!(outcome.chunk_count, 1);
        assert_eq!(outcome.status, ProcessingStatus::Completed);

        let context = harness.contexts.get(5).unwrap();
        assert_eq!(context.chunk_count(), 1);
        assert_eq!(context.processing_status(), ProcessingStatus::Completed);
        assert_eq!(context.original_content(), Some("Hello."));

        let points = harness.index.points("context_items");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].payload.context_id, 5);
        assert_eq!(points[0].payload.title, "Doc - Chunk 1");
        assert_eq!(points[0].payload.context_type, "PDF");
    }

    #[tokio::test]
    async fn test_reingest_does_not_accumulate_points() {
        let harness = Harness::new();
        harness.contexts.add_context(5, ContextKind::Markdown);
        let text = "Sentence number one is here. ".repeat(100);
        harness.parser.set_text("notes.md", &text);

        let first = harness
            .ingest
            .ingest_markdown(5, Path::new("notes.md"), "Notes")
            .await
            .unwrap();
        let second = harness
            .ingest
            .ingest_markdown(5, Path::new("notes.md"), "Notes")
            .await
            .unwrap();

        assert!(first.chunk_count > 1);
        assert_eq!(first.chunk_count, second.chunk_count);

        let items = harness.items.items_for(5);
        let points = harness.index.points("context_items");
        assert_eq!(items.len(), second.chunk_count);
        assert_eq!(points.len(), items.len());
        for item in &items {
            assert!(points.iter().any(|p| p.id == item.id()));
        }
    }

    #[tokio::test]
    async fn test_transient_embedding_failures_are_retried() {
        let harness = Harness::new();
        harness.contexts.add_context(9, ContextKind::Faq);
        let text = "First question and answer. Second question and answer. Third question and answer.";
        harness.parser.set_text("faq.txt", text);
        let ingest = harness.ingest_with_chunker(TextChunker::new(30, 0).unwrap());

        let chunks = TextChunker::new(30, 0).unwrap().chunk(text);
        assert_eq!(chunks.len(), 3);
        harness.embedder.fail_text_transient(&chunks[1], 2);

        let outcome = ingest
            .ingest_faq(9, Path::new("faq.txt"), "FAQ")
            .await
            .unwrap();

        assert_eq!(outcome.status, ProcessingStatus::Completed);
        assert_eq!(harness.index.points("context_items").len(), 3);
        assert_eq!(harness.monitor.snapshot().embeddings.calls, 3);
        assert_eq!(harness.embedder.calls(), 5);
    }

    #[tokio::test]
    async fn test_permanent_chunk_failure_marks_context_failed() {
        let harness = Harness::new();
        harness.contexts.add_context(9, ContextKind::Markdown);
        let text = "Alpha alpha alpha alpha. Beta beta beta beta beta. Gamma gamma gamma.";
        harness.parser.set_text("a.md", text);
        let ingest = harness.ingest_with_chunker(TextChunker::new(30, 0).unwrap());
        let chunks = TextChunker::new(30, 0).unwrap().chunk(text);
        harness.embedder.fail_text_permanent(&chunks[0]);

        let outcome = ingest
            .ingest_markdown(9, Path::new("a.md"), "A")
            .await
            .unwrap();

        assert_eq!(outcome.status, ProcessingStatus::Failed);
        assert_eq!(outcome.failed_item_ids.len(), 1);
        assert_eq!(outcome.indexed_count, chunks.len() - 1);

        let context = harness.contexts.get(9).unwrap();
        assert_eq!(context.processing_status(), ProcessingStatus::Failed);
        assert_eq!(context.chunk_count() as usize, chunks.len());

        let failed = harness
            .items
            .items_for(9)
            .into_iter()
            .find(|item| item.id() == outcome.failed_item_ids[0])
            .unwrap();
        assert_eq!(failed.metadata()["index_status"], "failed");
        assert_eq!(failed.metadata()["index_error"], "permanent_external");
    }

    #[tokio::test]
    async fn test_parse_failure_sets_failed() {
        let harness = Harness::new();
        harness.contexts.add_context(3, ContextKind::Pdf);

        let err = harness
            .ingest
            .ingest_pdf(3, Path::new("missing.pdf"), "Missing")
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::NotFound(_)));
        assert_eq!(
            harness.contexts.get(3).unwrap().processing_status(),
            ProcessingStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_empty_text_completes_with_zero_chunks() {
        let harness = Harness::new();
        harness.contexts.add_context(4, ContextKind::Markdown);
        harness.parser.set_text("empty.md", "   ");

        let outcome = harness
            .ingest
            .ingest_markdown(4, Path::new("empty.md"), "Empty")
            .await
            .unwrap();

        assert_eq!(outcome.chunk_count, 0);
        assert_eq!(harness.embedder.calls(), 0);
        assert_eq!(
            harness.contexts.get(4).unwrap().processing_status(),
            ProcessingStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_missing_context_and_kind_mismatch() {
        let harness = Harness::new();
        let missing = harness
            .ingest
            .ingest_pdf(99, Path::new("x.pdf"), "X")
            .await;
        assert!(matches!(missing, Err(RagError::NotFound(_))));

        harness.contexts.add_context(1, ContextKind::Faq);
        let mismatch = harness.ingest.ingest_pdf(1, Path::new("x.pdf"), "X").await;
        assert!(matches!(mismatch, Err(RagError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_status_history_goes_through_pending() {
        let harness = Harness::new();
        harness.contexts.add_context(5, ContextKind::Pdf);
        harness.parser.set_text("doc.pdf", "Hello.");

        harness.ingest.ingest_pdf(5, Path::new("doc.pdf"), "Doc").await.unwrap();
        harness.ingest.ingest_pdf(5, Path::new("doc.pdf"), "Doc").await.unwrap();

        use ProcessingStatus::*;
        let history = harness.contexts.status_history(5);
        assert_eq!(
            history,
            vec![Processing, Completed, Pending, Processing, Completed]
        );
    }
}
