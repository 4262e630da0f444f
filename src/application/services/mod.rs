pub mod answer_generator;
pub mod chunk_indexer;
pub mod context_locks;
pub mod deadline;
pub mod embedding_service;
pub mod query_cache;
pub mod rerank_service;
pub mod retry;
pub mod text_chunker;
pub mod topic_context_resolver;
pub mod usage_monitor;

pub use answer_generator::{AnswerGenerator, GenerationOptions, NO_RELEVANT_INFORMATION};
pub use chunk_indexer::{ChunkIndexer, IndexReport};
pub use context_locks::ContextLocks;
pub use embedding_service::EmbeddingService;
pub use query_cache::QueryCache;
pub use rerank_service::RerankService;
pub use retry::RetryPolicy;
pub use text_chunker::TextChunker;
pub use topic_context_resolver::TopicContextResolver;
pub use usage_monitor::{PriceTable, RateLimits, UsageMonitor};
