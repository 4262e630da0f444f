//! Fakes and in-memory repositories shared by the unit tests.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::ports::chat_provider::{ChatCompletion, ChatRequest};
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingRequest, EmbeddingResponse,
};
use crate::application::ports::cache_store::CacheStoreError;
use crate::application::ports::vector_index::{PointPayload, SearchHit, VectorPoint};
use crate::application::ports::{
    CacheStore, ChatProvider, CrossEncoder, DocumentParser, EmbeddingProvider, ModelProviderError,
    VectorIndex,
};
use crate::application::services::{
    AnswerGenerator, ChunkIndexer, ContextLocks, EmbeddingService, PriceTable, QueryCache,
    RateLimits, RerankService, RetryPolicy, TextChunker, TopicContextResolver, UsageMonitor,
};
use crate::application::use_cases::{
    AnswerQuestionUseCase, AppendFaqEntryUseCase, IngestContextUseCase, ManageTopicsUseCase,
    QuerySettings, ReindexContextsUseCase,
};
use crate::domain::entities::{
    Context, ContextItem, NewContextItem, NewQuestionHistory, QuestionHistory, Topic,
};
use crate::domain::errors::{RagError, RagResult};
use crate::domain::repositories::{
    ContextItemRepository, ContextRepository, QuestionHistoryRepository, RepositoryError,
    TopicRepository,
};
use crate::domain::value_objects::{ContextKind, ProcessingStatus};
use crate::infrastructure::cache::InMemoryCacheStore;
use crate::infrastructure::vector_store::InMemoryVectorIndex;

pub const TEST_DIMENSION: usize = 4;
pub const TEST_COLLECTION: &str = "context_items";

pub fn hit(id: i64, score: f32, content: &str) -> SearchHit {
    SearchHit {
        id,
        score,
        payload: PointPayload {
            context_item_id: id,
            context_id: 1,
            context_type: "MARKDOWN".to_string(),
            title: format!("Item {}", id),
            content: content.to_string(),
            chunk_index: Some(0),
        },
        rerank_score: None,
    }
}

// Embeddings

#[derive(Default)]
struct EmbeddingFailures {
    next_transient: usize,
    transient_by_text: HashMap<String, usize>,
    permanent_texts: BTreeSet<String>,
}

/// Deterministic embeddings derived from the text bytes.
pub struct FakeEmbeddingProvider {
    dimension: usize,
    output_dimension: usize,
    calls: AtomicUsize,
    last_batch: Mutex<Vec<String>>,
    failures: Mutex<EmbeddingFailures>,
}

impl FakeEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            output_dimension: dimension,
            calls: AtomicUsize::new(0),
            last_batch: Mutex::new(Vec::new()),
            failures: Mutex::new(EmbeddingFailures::default()),
        }
    }

    /// Returns vectors of a different length than the advertised dimension.
    pub fn with_output_dimension(mut self, dimension: usize) -> Self {
        self.output_dimension = dimension;
        self
    }

    pub fn fail_next_transient(&self, count: usize) {
        self.failures.lock().unwrap().next_transient = count;
    }

    pub fn fail_text_transient(&self, text: &str, count: usize) {
        self.failures
            .lock()
            .unwrap()
            .transient_by_text
            .insert(text.to_string(), count);
    }

    pub fn fail_text_permanent(&self, text: &str) {
        self.failures
            .lock()
            .unwrap()
            .permanent_texts
            .insert(text.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_batch(&self) -> Vec<String> {
        self.last_batch.lock().unwrap().clone()
    }

    pub fn vector_for(text: &str, dimension: usize) -> Vec<f32> {
        let mut vector = vec![0.0f32; dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % dimension] += byte as f32 * (1.0 + (i / dimension) as f32 * 0.01);
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn check_failures(&self, texts: &[String]) -> Result<(), ModelProviderError> {
        let mut failures = self.failures.lock().unwrap();
        if failures.next_transient > 0 {
            failures.next_transient -= 1;
            return Err(ModelProviderError::ServiceUnavailable("fake outage".to_string()));
        }
        if texts.iter().any(|t| failures.permanent_texts.contains(t)) {
            return Err(ModelProviderError::ApiError {
                status: 400,
                message: "rejected input".to_string(),
            });
        }
        for text in texts {
            if let Some(remaining) = failures.transient_by_text.get_mut(text) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ModelProviderError::Timeout("fake timeout".to_string()));
                }
            }
        }
        Ok(())
    }

    fn token_count(texts: &[String]) -> u32 {
        texts
            .iter()
            .map(|t| t.split_whitespace().count() as u32)
            .sum()
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ModelProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let texts = vec![request.text];
        self.check_failures(&texts)?;

        Ok(EmbeddingResponse {
            embedding: Self::vector_for(&texts[0], self.output_dimension),
            model_name: self.model_name().to_string(),
            token_count: Some(Self::token_count(&texts)),
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, ModelProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock().unwrap() = request.texts.clone();
        self.check_failures(&request.texts)?;

        Ok(BatchEmbeddingResponse {
            embeddings: request
                .texts
                .iter()
                .map(|t| Self::vector_for(t, self.output_dimension))
                .collect(),
            model_name: self.model_name().to_string(),
            total_tokens: Some(Self::token_count(&request.texts)),
        })
    }

    fn model_name(&self) -> &str {
        "fake-embedding"
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}

// Chat

pub struct FakeChatProvider {
    answer: String,
    calls: AtomicUsize,
    fail_next: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
}

impl FakeChatProvider {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
            fail_next: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn fail_next_transient(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for FakeChatProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, ModelProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone();
        *self.last_request.lock().unwrap() = Some(request);

        let pending = self.fail_next.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next.store(pending - 1, Ordering::SeqCst);
            return Err(ModelProviderError::RateLimitExceeded);
        }

        Ok(ChatCompletion {
            content: self.answer.clone(),
            model,
            prompt_tokens: 120,
            completion_tokens: 30,
        })
    }
}

// Cross-encoder

/// Scores passages from a fixed table; unknown passages score zero.
pub struct FakeCrossEncoder {
    scores: Mutex<HashMap<String, f32>>,
    calls: AtomicUsize,
}

impl FakeCrossEncoder {
    pub fn with_scores(scores: &[(&str, f32)]) -> Self {
        let encoder = Self {
            scores: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        };
        encoder.set_scores(scores);
        encoder
    }

    pub fn set_scores(&self, scores: &[(&str, f32)]) {
        let mut table = self.scores.lock().unwrap();
        for (text, score) in scores {
            table.insert(text.to_string(), *score);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CrossEncoder for FakeCrossEncoder {
    async fn score(&self, _query: &str, passages: &[String]) -> Result<Vec<f32>, ModelProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let table = self.scores.lock().unwrap();
        Ok(passages
            .iter()
            .map(|p| table.get(p).copied().unwrap_or(0.0))
            .collect())
    }

    fn model_name(&self) -> &str {
        "fake-cross-encoder"
    }
}

// Parser

#[derive(Default)]
pub struct FakeDocumentParser {
    texts: Mutex<HashMap<PathBuf, String>>,
}

impl FakeDocumentParser {
    pub fn set_text(&self, path: &str, text: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), text.to_string());
    }
}

#[async_trait]
impl DocumentParser for FakeDocumentParser {
    async fn parse(&self, _kind: ContextKind, path: &Path) -> RagResult<String> {
        self.texts
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| RagError::not_found(format!("Source file {}", path.display())))
    }
}

// Repositories

#[derive(Default)]
struct TopicRow {
    system_prompt: Option<String>,
    contexts: BTreeSet<i64>,
}

#[derive(Default)]
pub struct InMemoryTopicRepository {
    topics: Mutex<BTreeMap<i64, TopicRow>>,
}

impl InMemoryTopicRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the topic or replaces its system prompt, keeping its links.
    pub fn add_topic(&self, id: i64, system_prompt: Option<&str>) {
        self.topics.lock().unwrap().entry(id).or_default().system_prompt =
            system_prompt.map(str::to_string);
    }

    fn ensure_topic(&self, id: i64) {
        self.topics.lock().unwrap().entry(id).or_default();
    }

    pub fn link(&self, topic_id: i64, context_ids: &[i64]) {
        let mut topics = self.topics.lock().unwrap();
        let row = topics.entry(topic_id).or_default();
        row.contexts.extend(context_ids.iter().copied());
    }

    pub fn system_prompt(&self, id: i64) -> Option<String> {
        self.topics
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|row| row.system_prompt.clone())
    }
}

#[async_trait]
impl TopicRepository for InMemoryTopicRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Topic>, RepositoryError> {
        let now = Utc::now();
        Ok(self.topics.lock().unwrap().get(&id).map(|row| {
            Topic::from_database(
                id,
                format!("Topic {}", id),
                String::new(),
                row.system_prompt.clone(),
                now,
                now,
            )
        }))
    }

    async fn context_ids_for_topics(
        &self,
        topic_ids: &[i64],
    ) -> Result<BTreeSet<i64>, RepositoryError> {
        let topics = self.topics.lock().unwrap();
        Ok(topic_ids
            .iter()
            .filter_map(|id| topics.get(id))
            .flat_map(|row| row.contexts.iter().copied())
            .collect())
    }

    async fn assign_contexts(
        &self,
        topic_id: i64,
        context_ids: &[i64],
    ) -> Result<usize, RepositoryError> {
        let mut topics = self.topics.lock().unwrap();
        let row = topics
            .get_mut(&topic_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Topic {}", topic_id)))?;
        Ok(context_ids
            .iter()
            .filter(|id| row.contexts.insert(**id))
            .count())
    }

    async fn update_system_prompt(
        &self,
        topic_id: i64,
        system_prompt: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        match self.topics.lock().unwrap().get_mut(&topic_id) {
            Some(row) => {
                row.system_prompt = system_prompt.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryContextRepository {
    contexts: Mutex<BTreeMap<i64, Context>>,
    history: Mutex<BTreeMap<i64, Vec<ProcessingStatus>>>,
}

impl InMemoryContextRepository {
    pub fn add_context(&self, id: i64, kind: ContextKind) {
        self.add_named_context(id, &format!("Context {}", id), kind);
    }

    pub fn add_named_context(&self, id: i64, name: &str, kind: ContextKind) {
        self.insert(id, name, kind, ProcessingStatus::Pending, 0);
    }

    fn insert(&self, id: i64, name: &str, kind: ContextKind, status: ProcessingStatus, chunks: i32) {
        let now = Utc::now();
        let context = Context::from_database(
            id,
            name.to_string(),
            String::new(),
            kind,
            None,
            chunks,
            status,
            now,
            now,
        );
        self.contexts.lock().unwrap().insert(id, context);
    }

    pub fn get(&self, id: i64) -> Option<Context> {
        self.contexts.lock().unwrap().get(&id).cloned()
    }

    /// Statuses written through `update`, with consecutive repeats collapsed.
    pub fn status_history(&self, id: i64) -> Vec<ProcessingStatus> {
        self.history
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContextRepository for InMemoryContextRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Context>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn update(&self, context: &Context) -> Result<(), RepositoryError> {
        let mut contexts = self.contexts.lock().unwrap();
        if !contexts.contains_key(&context.id()) {
            return Err(RepositoryError::NotFound(format!("Context {}", context.id())));
        }
        contexts.insert(context.id(), context.clone());

        let mut history = self.history.lock().unwrap();
        let statuses = history.entry(context.id()).or_default();
        if statuses.last() != Some(&context.processing_status()) {
            statuses.push(context.processing_status());
        }
        Ok(())
    }
}

pub struct InMemoryContextItemRepository {
    items: Mutex<Vec<ContextItem>>,
    next_id: AtomicI64,
}

impl Default for InMemoryContextItemRepository {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryContextItemRepository {
    pub fn items_for(&self, context_id: i64) -> Vec<ContextItem> {
        let mut items: Vec<ContextItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.context_id() == context_id)
            .cloned()
            .collect();
        crate::domain::entities::context_item::sort_by_order(&mut items);
        items
    }

    fn build(&self, item: &NewContextItem) -> ContextItem {
        let now = Utc::now();
        ContextItem::from_database(
            self.next_id.fetch_add(1, Ordering::SeqCst),
            item.context_id,
            item.title.clone(),
            item.content.clone(),
            item.order_index,
            item.metadata.clone(),
            item.file_path.clone(),
            now,
            now,
        )
    }
}

#[async_trait]
impl ContextItemRepository for InMemoryContextItemRepository {
    async fn replace_for_context(
        &self,
        context_id: i64,
        items: &[NewContextItem],
    ) -> Result<Vec<ContextItem>, RepositoryError> {
        let stored: Vec<ContextItem> = items.iter().map(|item| self.build(item)).collect();
        let mut all = self.items.lock().unwrap();
        all.retain(|item| item.context_id() != context_id);
        all.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn append(&self, item: &NewContextItem) -> Result<ContextItem, RepositoryError> {
        let stored = self.build(item);
        self.items.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_context_id(
        &self,
        context_id: i64,
    ) -> Result<Vec<ContextItem>, RepositoryError> {
        Ok(self.items_for(context_id))
    }

    async fn update_metadata(
        &self,
        id: i64,
        metadata: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let mut items = self.items.lock().unwrap();
        let position = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Context item {}", id)))?;
        let item = &items[position];
        items[position] = ContextItem::from_database(
            item.id(),
            item.context_id(),
            item.title().to_string(),
            item.content().to_string(),
            item.order_index(),
            metadata.clone(),
            item.file_path().map(str::to_string),
            item.created_at(),
            Utc::now(),
        );
        Ok(())
    }

    async fn count_by_context_id(&self, context_id: i64) -> Result<i64, RepositoryError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.context_id() == context_id)
            .count() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryQuestionHistoryRepository {
    entries: Mutex<Vec<QuestionHistory>>,
}

impl InMemoryQuestionHistoryRepository {
    pub fn entries(&self) -> Vec<QuestionHistory> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionHistoryRepository for InMemoryQuestionHistoryRepository {
    async fn save(&self, entry: &NewQuestionHistory) -> Result<QuestionHistory, RepositoryError> {
        let mut entries = self.entries.lock().unwrap();
        let saved = QuestionHistory {
            id: entries.len() as i64 + 1,
            topic_id: entry.topic_id,
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            session_id: entry.session_id.clone(),
            is_favorited: false,
            feedback_score: 0,
            feedback_comment: None,
            created_at: Utc::now(),
        };
        entries.push(saved.clone());
        Ok(saved)
    }
}

// Cache store

/// In-memory cache whose deletes and key listings can be switched to fail.
#[derive(Default)]
pub struct FlakyCacheStore {
    inner: InMemoryCacheStore,
    fail_deletes: AtomicBool,
    fail_key_listing: AtomicBool,
}

impl FlakyCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_key_listing(&self, fail: bool) {
        self.fail_key_listing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for FlakyCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        self.inner.get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: std::time::Duration,
    ) -> Result<(), CacheStoreError> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CacheStoreError::ConnectionError("delete refused".to_string()));
        }
        self.inner.delete(key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheStoreError> {
        if self.fail_key_listing.load(Ordering::SeqCst) {
            return Err(CacheStoreError::ConnectionError("scan refused".to_string()));
        }
        self.inner.keys_with_prefix(prefix).await
    }
}

// Harness

/// Every use case wired to fakes and in-memory stores.
pub struct Harness {
    pub topics: Arc<InMemoryTopicRepository>,
    pub contexts: Arc<InMemoryContextRepository>,
    pub items: Arc<InMemoryContextItemRepository>,
    pub history: Arc<InMemoryQuestionHistoryRepository>,
    pub embedder: Arc<FakeEmbeddingProvider>,
    pub chat: Arc<FakeChatProvider>,
    pub encoder: Arc<FakeCrossEncoder>,
    pub index: Arc<InMemoryVectorIndex>,
    pub store: Arc<InMemoryCacheStore>,
    pub monitor: Arc<UsageMonitor>,
    pub parser: Arc<FakeDocumentParser>,
    pub answer: Arc<AnswerQuestionUseCase>,
    pub ingest: Arc<IngestContextUseCase>,
    pub reindex: Arc<ReindexContextsUseCase>,
    pub faq: Arc<AppendFaqEntryUseCase>,
    pub manage_topics: Arc<ManageTopicsUseCase>,
    indexer: Arc<ChunkIndexer>,
    locks: Arc<ContextLocks>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(true)
    }

    pub fn without_query_cache() -> Self {
        Self::build(false)
    }

    fn build(cache_enabled: bool) -> Self {
        let topics = Arc::new(InMemoryTopicRepository::new());
        let contexts = Arc::new(InMemoryContextRepository::default());
        let items = Arc::new(InMemoryContextItemRepository::default());
        let history = Arc::new(InMemoryQuestionHistoryRepository::default());
        let embedder = Arc::new(FakeEmbeddingProvider::new(TEST_DIMENSION));
        let chat = Arc::new(FakeChatProvider::new("Generated answer."));
        let encoder = Arc::new(FakeCrossEncoder::with_scores(&[]));
        let index = Arc::new(
            InMemoryVectorIndex::new().with_collection(TEST_COLLECTION, TEST_DIMENSION),
        );
        let store = Arc::new(InMemoryCacheStore::new());
        let monitor = Arc::new(UsageMonitor::new(RateLimits::default(), PriceTable::default()));
        let parser = Arc::new(FakeDocumentParser::default());

        let embeddings = Arc::new(EmbeddingService::new(embedder.clone(), monitor.clone()));
        let indexer = Arc::new(ChunkIndexer::new(
            embeddings.clone(),
            index.clone(),
            items.clone(),
            TEST_COLLECTION.to_string(),
            RetryPolicy::immediate(3),
        ));
        let locks = Arc::new(ContextLocks::new());
        let query_cache = Arc::new(QueryCache::new(store.clone(), cache_enabled));
        let resolver = Arc::new(TopicContextResolver::new(topics.clone(), store.clone()));

        let answer = Arc::new(AnswerQuestionUseCase::new(
            embeddings,
            index.clone(),
            Arc::new(RerankService::new(encoder.clone())),
            Arc::new(AnswerGenerator::new(chat.clone(), monitor.clone())),
            resolver.clone(),
            query_cache.clone(),
            topics.clone(),
            history.clone(),
            QuerySettings::default(),
        ));
        let ingest = Arc::new(IngestContextUseCase::new(
            contexts.clone(),
            items.clone(),
            parser.clone(),
            indexer.clone(),
            locks.clone(),
            RetryPolicy::immediate(3),
        ));
        let reindex = Arc::new(ReindexContextsUseCase::new(
            contexts.clone(),
            items.clone(),
            indexer.clone(),
            locks.clone(),
        ));
        let faq = Arc::new(AppendFaqEntryUseCase::new(
            contexts.clone(),
            items.clone(),
            indexer.clone(),
            locks.clone(),
        ));
        let manage_topics = Arc::new(ManageTopicsUseCase::new(
            topics.clone(),
            resolver,
            query_cache,
        ));

        Self {
            topics,
            contexts,
            items,
            history,
            embedder,
            chat,
            encoder,
            index,
            store,
            monitor,
            parser,
            answer,
            ingest,
            reindex,
            faq,
            manage_topics,
            indexer,
            locks,
        }
    }

    /// An ingest use case sharing this harness' stores but chunking differently.
    pub fn ingest_with_chunker(&self, chunker: TextChunker) -> IngestContextUseCase {
        IngestContextUseCase::new(
            self.contexts.clone(),
            self.items.clone(),
            self.parser.clone(),
            self.indexer.clone(),
            self.locks.clone(),
            RetryPolicy::immediate(3),
        )
        .with_chunker(chunker)
    }

    /// Creates a completed markdown context with one item and point per
    /// chunk and links it to the topic. No embedding calls are made.
    pub async fn seed_topic_with_chunks(&self, topic_id: i64, context_id: i64, chunks: &[&str]) {
        self.topics.ensure_topic(topic_id);
        self.contexts.insert(
            context_id,
            &format!("Context {}", context_id),
            ContextKind::Markdown,
            ProcessingStatus::Completed,
            chunks.len() as i32,
        );

        for (i, content) in chunks.iter().enumerate() {
            let item = self
                .items
                .append(&NewContextItem {
                    context_id,
                    title: format!("Context {} - Chunk {}", context_id, i + 1),
                    content: content.to_string(),
                    order_index: Some(i as i32),
                    metadata: json!({ "chunk_index": i }),
                    file_path: None,
                })
                .await
                .unwrap();

            self.index
                .upsert(
                    TEST_COLLECTION,
                    VectorPoint {
                        id: item.id(),
                        vector: FakeEmbeddingProvider::vector_for(content, TEST_DIMENSION),
                        payload: PointPayload {
                            context_item_id: item.id(),
                            context_id,
                            context_type: ContextKind::Markdown.as_str().to_string(),
                            title: item.title().to_string(),
                            content: content.to_string(),
                            chunk_index: Some(i as i64),
                        },
                    },
                )
                .await
                .unwrap();
        }

        self.topics.link(topic_id, &[context_id]);
    }

    /// A point with no backing context item.
    pub async fn insert_orphan_point(&self, id: i64, context_id: i64) {
        self.index
            .upsert(
                TEST_COLLECTION,
                VectorPoint {
                    id,
                    vector: FakeEmbeddingProvider::vector_for("orphan", TEST_DIMENSION),
                    payload: PointPayload {
                        context_item_id: id,
                        context_id,
                        context_type: ContextKind::Markdown.as_str().to_string(),
                        title: "Orphan".to_string(),
                        content: "orphan".to_string(),
                        chunk_index: None,
                    },
                },
            )
            .await
            .unwrap();
    }
}
