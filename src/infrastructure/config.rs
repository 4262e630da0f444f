use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::application::services::{PriceTable, RateLimits, RetryPolicy};
use crate::infrastructure::external_services::openai_client::{
    DEFAULT_OPENAI_BASE_URL, default_dimension_for,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    Qdrant,
    PgVector,
    Memory,
}

impl FromStr for VectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "qdrant" => Ok(VectorBackend::Qdrant),
            "pgvector" => Ok(VectorBackend::PgVector),
            "memory" => Ok(VectorBackend::Memory),
            other => Err(format!("unknown vector backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Timeouts {
    pub embed: Duration,
    pub search: Duration,
    pub rerank: Duration,
    pub generate: Duration,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_port: u16,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub chat_model: String,
    pub chat_temperature: f32,
    pub chat_max_tokens: u32,

    pub search_limit: usize,
    pub rerank_top_k: usize,
    pub reranker_url: String,
    pub reranker_model: String,

    pub vector_backend: VectorBackend,
    pub vector_collection: String,
    pub vector_host: String,
    pub vector_port: u16,

    pub cache_enabled: bool,
    pub embedding_cache_dir: Option<PathBuf>,

    pub rate_limits: RateLimits,
    pub prices: PriceTable,

    pub ingest_retry: RetryPolicy,
    pub ingest_workers: usize,
    pub reindex_concurrency: usize,
    pub timeouts: Timeouts,
}

struct Lookup<F> {
    get: F,
}

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.get)(name).filter(|value| !value.trim().is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.raw(name).ok_or(ConfigError::Missing(name))
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.raw(name) {
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// Base URLs are validated here and stored without a trailing slash.
    fn url(&self, name: &'static str, default: &str) -> Result<String, ConfigError> {
        let raw = self.string(name, default);
        let parsed = url::Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(raw.trim().trim_end_matches('/').to_string())
    }

    fn secs(&self, name: &'static str, default: u64) -> Result<Duration, ConfigError> {
        Ok(Duration::from_secs(self.parse(name, default)?))
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup { get };

        let embedding_model = env.string("EMBEDDING_MODEL", "text-embedding-3-small");
        let embedding_dimension = match env.raw("EMBEDDING_DIMENSION") {
            Some(_) => env.parse("EMBEDDING_DIMENSION", 0usize)?,
            None => default_dimension_for(&embedding_model).ok_or(ConfigError::Invalid {
                name: "EMBEDDING_DIMENSION",
                reason: format!("cannot infer dimension of model '{}'", embedding_model),
            })?,
        };
        if embedding_dimension == 0 {
            return Err(ConfigError::Invalid {
                name: "EMBEDDING_DIMENSION",
                reason: "must be positive".to_string(),
            });
        }

        let prices = match env.raw("MODEL_PRICES_JSON") {
            Some(raw) => PriceTable::from_json(&raw).map_err(|e| ConfigError::Invalid {
                name: "MODEL_PRICES_JSON",
                reason: e.to_string(),
            })?,
            None => PriceTable::default(),
        };

        let vector_backend = match env.raw("VECTOR_BACKEND") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: "VECTOR_BACKEND",
                reason,
            })?,
            None => VectorBackend::Qdrant,
        };

        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            server_port: env.parse("SERVER_PORT", 3000)?,

            openai_api_key: env.string("OPENAI_API_KEY", ""),
            openai_base_url: env.url("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)?,
            embedding_model,
            embedding_dimension,
            chat_model: env.string("CHAT_MODEL", "gpt-4o-mini"),
            chat_temperature: env.parse("CHAT_TEMPERATURE", 0.3)?,
            chat_max_tokens: env.parse("CHAT_MAX_TOKENS", 1000)?,

            search_limit: env.parse("RAG_SEARCH_LIMIT", 10)?,
            rerank_top_k: env.parse("RAG_RERANK_TOP_K", 5)?,
            reranker_url: env.url("RERANKER_URL", "http://localhost:8080")?,
            reranker_model: env.string("RERANKER_MODEL", "BAAI/bge-reranker-base"),

            vector_backend,
            vector_collection: env.string("VECTOR_COLLECTION_NAME", "context_items"),
            vector_host: env.string("VECTOR_HOST", "localhost"),
            vector_port: env.parse("VECTOR_PORT", 6333)?,

            cache_enabled: env.parse("CACHE_ENABLED", true)?,
            embedding_cache_dir: env.raw("EMBEDDING_CACHE_DIR").map(PathBuf::from),

            rate_limits: RateLimits {
                embeddings_per_minute: env.parse("EMBEDDINGS_RATE_LIMIT_PER_MIN", 3000)?,
                chat_per_minute: env.parse("CHAT_RATE_LIMIT_PER_MIN", 10000)?,
            },
            prices,

            ingest_retry: RetryPolicy::new(
                env.parse("INGEST_MAX_RETRIES", 3)?,
                env.secs("INGEST_RETRY_BASE_SECS", 60)?,
            ),
            ingest_workers: env.parse("INGEST_WORKERS", 3)?,
            reindex_concurrency: env.parse("REINDEX_CONCURRENCY", 4)?,
            timeouts: Timeouts {
                embed: env.secs("EMBED_TIMEOUT_SECS", 10)?,
                search: env.secs("SEARCH_TIMEOUT_SECS", 2)?,
                rerank: env.secs("RERANK_TIMEOUT_SECS", 5)?,
                generate: env.secs("GENERATE_TIMEOUT_SECS", 30)?,
            },
        })
    }
}
