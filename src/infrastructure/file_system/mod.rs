pub mod disk_embedding_cache;

pub use disk_embedding_cache::DiskEmbeddingCache;
