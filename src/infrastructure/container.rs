use std::sync::Arc;

use crate::{
    application::{
        ports::{
            CacheStore, ChatProvider, CrossEncoder, DocumentParser, EmbeddingProvider, JobQueue,
            VectorIndex, vector_index::DistanceMetric,
        },
        services::{
            AnswerGenerator, ChunkIndexer, ContextLocks, EmbeddingService, GenerationOptions,
            QueryCache, RerankService, TopicContextResolver, UsageMonitor,
        },
        use_cases::{
            AnswerQuestionUseCase, AppendFaqEntryUseCase, IngestContextUseCase,
            ManageTopicsUseCase, QuerySettings, ReindexContextsUseCase,
        },
    },
    domain::{
        errors::RagResult,
        repositories::{
            ContextItemRepository, ContextRepository, QuestionHistoryRepository, TopicRepository,
        },
    },
    infrastructure::{
        cache::InMemoryCacheStore,
        config::{AppConfig, VectorBackend},
        database::{
            DbPool,
            repositories::{
                PostgresContextItemRepository, PostgresContextRepository,
                PostgresQuestionHistoryRepository, PostgresTopicRepository,
            },
        },
        external_services::{
            CompositeDocumentParser, CrossEncoderConfig, HttpCrossEncoder, OpenAiClient,
            OpenAiConfig,
        },
        file_system::DiskEmbeddingCache,
        messaging::{BackgroundProcessor, MpscJobQueue},
        vector_store::{InMemoryVectorIndex, PgVectorIndex, QdrantConfig, QdrantVectorIndex},
    },
    presentation::http::handlers::{AdminHandler, RagHandler},
};

pub struct AppContainer {
    pub config: AppConfig,

    // Shared infrastructure
    pub vector_index: Arc<dyn VectorIndex>,
    pub cache_store: Arc<dyn CacheStore>,
    pub usage_monitor: Arc<UsageMonitor>,

    // Job Queue and Background Processing
    pub job_queue: Arc<dyn JobQueue>,
    pub background_processor: Arc<BackgroundProcessor>,

    // Use Cases
    pub answer_question: Arc<AnswerQuestionUseCase>,
    pub ingest_context: Arc<IngestContextUseCase>,
    pub reindex_contexts: Arc<ReindexContextsUseCase>,
    pub append_faq_entry: Arc<AppendFaqEntryUseCase>,
    pub manage_topics: Arc<ManageTopicsUseCase>,

    // HTTP Handlers
    pub rag_handler: Arc<RagHandler>,
    pub admin_handler: Arc<AdminHandler>,
}

impl AppContainer {
    pub fn new(config: AppConfig, db_pool: DbPool) -> Result<Self, Box<dyn std::error::Error>> {
        // Repositories
        let topics: Arc<dyn TopicRepository> =
            Arc::new(PostgresTopicRepository::new(db_pool.clone()));
        let contexts: Arc<dyn ContextRepository> =
            Arc::new(PostgresContextRepository::new(db_pool.clone()));
        let items: Arc<dyn ContextItemRepository> =
            Arc::new(PostgresContextItemRepository::new(db_pool.clone()));
        let history: Arc<dyn QuestionHistoryRepository> =
            Arc::new(PostgresQuestionHistoryRepository::new(db_pool.clone()));

        // External services
        let openai = Arc::new(OpenAiClient::new(OpenAiConfig {
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimension: config.embedding_dimension,
            timeout_secs: config.timeouts.generate.as_secs().max(1),
        })?);
        let embedding_provider: Arc<dyn EmbeddingProvider> = openai.clone();
        let chat_provider: Arc<dyn ChatProvider> = openai;
        let cross_encoder: Arc<dyn CrossEncoder> =
            Arc::new(HttpCrossEncoder::new(CrossEncoderConfig {
                service_url: config.reranker_url.clone(),
                model_name: config.reranker_model.clone(),
                timeout_secs: config.timeouts.rerank.as_secs().max(1),
            })?);
        let parser: Arc<dyn DocumentParser> = Arc::new(CompositeDocumentParser::new());

        let vector_index: Arc<dyn VectorIndex> = match config.vector_backend {
            VectorBackend::Qdrant => Arc::new(QdrantVectorIndex::new(QdrantConfig::new(
                &config.vector_host,
                config.vector_port,
            ))?),
            VectorBackend::PgVector => Arc::new(PgVectorIndex::new(db_pool)),
            VectorBackend::Memory => Arc::new(InMemoryVectorIndex::new()),
        };

        // Caches and accounting
        let cache_store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let usage_monitor = Arc::new(
            UsageMonitor::new(config.rate_limits, config.prices.clone())
                .with_store(cache_store.clone()),
        );
        let query_cache = Arc::new(QueryCache::new(cache_store.clone(), config.cache_enabled));
        let resolver = Arc::new(TopicContextResolver::new(topics.clone(), cache_store.clone()));

        // Application services
        let mut embedding_service =
            EmbeddingService::new(embedding_provider, usage_monitor.clone())
                .with_timeout(config.timeouts.embed);
        if let Some(dir) = &config.embedding_cache_dir {
            tracing::info!("Embedding cache enabled at {}", dir.display());
            embedding_service = embedding_service.with_cache(Arc::new(DiskEmbeddingCache::new(dir)));
        }
        let embedding_service = Arc::new(embedding_service);
        let rerank_service =
            Arc::new(RerankService::new(cross_encoder).with_timeout(config.timeouts.rerank));
        let answer_generator = Arc::new(
            AnswerGenerator::new(chat_provider, usage_monitor.clone())
                .with_timeout(config.timeouts.generate),
        );
        let indexer = Arc::new(ChunkIndexer::new(
            embedding_service.clone(),
            vector_index.clone(),
            items.clone(),
            config.vector_collection.clone(),
            config.ingest_retry,
        ));
        let locks = Arc::new(ContextLocks::new());

        // Use cases
        let answer_question = Arc::new(AnswerQuestionUseCase::new(
            embedding_service,
            vector_index.clone(),
            rerank_service,
            answer_generator,
            resolver.clone(),
            query_cache.clone(),
            topics.clone(),
            history,
            QuerySettings {
                collection: config.vector_collection.clone(),
                search_limit: config.search_limit,
                rerank_top_k: config.rerank_top_k,
                search_timeout: config.timeouts.search,
                generation: GenerationOptions {
                    model: config.chat_model.clone(),
                    temperature: config.chat_temperature,
                    max_output_tokens: config.chat_max_tokens,
                    system_prompt: None,
                },
            },
        ));
        let ingest_context = Arc::new(IngestContextUseCase::new(
            contexts.clone(),
            items.clone(),
            parser,
            indexer.clone(),
            locks.clone(),
            config.ingest_retry,
        ));
        let reindex_contexts = Arc::new(
            ReindexContextsUseCase::new(contexts.clone(), items.clone(), indexer.clone(), locks.clone())
                .with_concurrency(config.reindex_concurrency),
        );
        let append_faq_entry = Arc::new(AppendFaqEntryUseCase::new(
            contexts.clone(),
            items,
            indexer,
            locks,
        ));
        let manage_topics = Arc::new(ManageTopicsUseCase::new(topics, resolver, query_cache));

        // Job queue and background processor
        let (job_queue, job_receiver) = MpscJobQueue::create_pair();
        let job_queue: Arc<dyn JobQueue> = Arc::new(job_queue);
        let background_processor = Arc::new(
            BackgroundProcessor::new(
                Arc::new(job_receiver),
                ingest_context.clone(),
                reindex_contexts.clone(),
            )
            .with_worker_count(config.ingest_workers),
        );

        // HTTP handlers
        let rag_handler = Arc::new(RagHandler::new(answer_question.clone()));
        let admin_handler = Arc::new(AdminHandler::new(
            contexts,
            job_queue.clone(),
            append_faq_entry.clone(),
            manage_topics.clone(),
            usage_monitor.clone(),
        ));

        Ok(Self {
            config,
            vector_index,
            cache_store,
            usage_monitor,
            job_queue,
            background_processor,
            answer_question,
            ingest_context,
            reindex_contexts,
            append_faq_entry,
            manage_topics,
            rag_handler,
            admin_handler,
        })
    }

    /// Creates the configured collection when missing. A collection with a
    /// different dimension is an error: reindex with reset to rebuild it.
    pub async fn ensure_collection(&self) -> RagResult<()> {
        self.vector_index
            .ensure_collection(
                &self.config.vector_collection,
                self.config.embedding_dimension,
                DistanceMetric::Cosine,
            )
            .await?;
        Ok(())
    }
}
