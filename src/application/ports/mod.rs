pub mod cache_store;
pub mod chat_provider;
pub mod cross_encoder;
pub mod document_parser;
pub mod embedding_cache;
pub mod embedding_provider;
pub mod job_queue;
pub mod provider_error;
pub mod vector_index;

pub use cache_store::CacheStore;
pub use chat_provider::ChatProvider;
pub use cross_encoder::CrossEncoder;
pub use document_parser::DocumentParser;
pub use embedding_cache::EmbeddingCache;
pub use embedding_provider::EmbeddingProvider;
pub use job_queue::JobQueue;
pub use provider_error::ModelProviderError;
pub use vector_index::VectorIndex;
