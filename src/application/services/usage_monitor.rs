use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::application::ports::CacheStore;
use crate::domain::errors::{RagError, RagResult};

const RATE_WINDOW: Duration = Duration::from_secs(60);
const RATE_WARNING_RATIO: f64 = 0.8;
const SNAPSHOT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

const HIGH_EMBEDDING_CALLS: u64 = 50;
const HIGH_AVG_PROMPT_TOKENS: f64 = 1500.0;
const HIGH_CHAT_CALLS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    Embeddings,
    ChatCompletions,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::Embeddings => "embeddings",
            ApiType::ChatCompletions => "chat_completions",
        }
    }
}

/// Counters for one API type inside the current hour window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiUsage {
    pub calls: u64,
    /// `total` for embeddings, `prompt` and `completion` for chat.
    pub tokens: BTreeMap<String, u64>,
    pub models: BTreeMap<String, u64>,
}

impl ApiUsage {
    fn record(&mut self, model: &str, tokens: &[(&str, u32)]) {
        self.calls += 1;
        for (kind, count) in tokens {
            *self.tokens.entry(kind.to_string()).or_insert(0) += u64::from(*count);
        }
        *self.models.entry(model.to_string()).or_insert(0) += 1;
    }

    pub fn token_count(&self, kind: &str) -> u64 {
        self.tokens.get(kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub window_start: DateTime<Utc>,
    pub embeddings: ApiUsage,
    pub chat_completions: ApiUsage,
    pub requests_last_minute: BTreeMap<String, usize>,
}

/// USD per 1K tokens. Embedding models only use `prompt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub prompt: f64,
    #[serde(default)]
    pub completion: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    prices: BTreeMap<String, ModelPrice>,
}

impl Default for PriceTable {
    fn default() -> Self {
        let entries = [
            ("text-embedding-3-small", 0.00002, 0.0),
            ("text-embedding-3-large", 0.00013, 0.0),
            ("text-embedding-ada-002", 0.0001, 0.0),
            ("gpt-4o-mini", 0.00015, 0.0006),
            ("gpt-4o", 0.0025, 0.01),
            ("gpt-3.5-turbo", 0.0005, 0.0015),
        ];
        Self {
            prices: entries
                .into_iter()
                .map(|(model, prompt, completion)| {
                    (model.to_string(), ModelPrice { prompt, completion })
                })
                .collect(),
        }
    }
}

impl PriceTable {
    pub fn new(prices: BTreeMap<String, ModelPrice>) -> Self {
        Self { prices }
    }

    /// Parses `{"model": {"prompt": 0.001, "completion": 0.002}, ...}`.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn price(&self, model: &str) -> Option<&ModelPrice> {
        self.prices.get(model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimits {
    pub embeddings_per_minute: u32,
    pub chat_per_minute: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            embeddings_per_minute: 3000,
            chat_per_minute: 10000,
        }
    }
}

impl RateLimits {
    fn ceiling(&self, api: ApiType) -> u32 {
        match api {
            ApiType::Embeddings => self.embeddings_per_minute,
            ApiType::ChatCompletions => self.chat_per_minute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub embeddings: f64,
    pub chat_completions: f64,
    pub total: f64,
}

struct UsageState {
    window_start: DateTime<Utc>,
    embeddings: ApiUsage,
    chat: ApiUsage,
    embedding_requests: VecDeque<Instant>,
    chat_requests: VecDeque<Instant>,
}

impl UsageState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            window_start: now,
            embeddings: ApiUsage::default(),
            chat: ApiUsage::default(),
            embedding_requests: VecDeque::new(),
            chat_requests: VecDeque::new(),
        }
    }

    fn roll_window(&mut self, now: DateTime<Utc>) {
        if now - self.window_start >= ChronoDuration::hours(1) {
            self.window_start = now;
            self.embeddings = ApiUsage::default();
            self.chat = ApiUsage::default();
        }
    }

    fn requests_mut(&mut self, api: ApiType) -> &mut VecDeque<Instant> {
        match api {
            ApiType::Embeddings => &mut self.embedding_requests,
            ApiType::ChatCompletions => &mut self.chat_requests,
        }
    }

    fn recent_requests(&mut self, api: ApiType, now: Instant) -> usize {
        let requests = self.requests_mut(api);
        while let Some(oldest) = requests.front() {
            if now.duration_since(*oldest) >= RATE_WINDOW {
                requests.pop_front();
            } else {
                break;
            }
        }
        requests.len()
    }
}

/// Process-wide usage counters for the remote model APIs.
///
/// Totals cover the current hour and reset when it elapses. Rate checks use a
/// sliding one-minute list of request timestamps per API type. Only
/// successful calls are tracked.
pub struct UsageMonitor {
    state: Mutex<UsageState>,
    limits: RateLimits,
    prices: PriceTable,
    store: Option<Arc<dyn CacheStore>>,
}

impl UsageMonitor {
    pub fn new(limits: RateLimits, prices: PriceTable) -> Self {
        Self {
            state: Mutex::new(UsageState::new(Utc::now())),
            limits,
            prices,
            store: None,
        }
    }

    /// Snapshots are written to `store` by [`UsageMonitor::publish`].
    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn lock(&self) -> MutexGuard<'_, UsageState> {
        // Counters stay usable after a panicking holder; they are approximate anyway.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn track_embedding(&self, tokens: u32, model: &str) {
        self.track_embedding_at(tokens, model, Utc::now(), Instant::now());
    }

    pub fn track_chat(&self, prompt_tokens: u32, completion_tokens: u32, model: &str) {
        self.track_chat_at(
            prompt_tokens,
            completion_tokens,
            model,
            Utc::now(),
            Instant::now(),
        );
    }

    fn track_embedding_at(&self, tokens: u32, model: &str, now: DateTime<Utc>, at: Instant) {
        let mut state = self.lock();
        state.roll_window(now);
        state.embeddings.record(model, &[("total", tokens)]);
        state.embedding_requests.push_back(at);
    }

    fn track_chat_at(
        &self,
        prompt_tokens: u32,
        completion_tokens: u32,
        model: &str,
        now: DateTime<Utc>,
        at: Instant,
    ) {
        let mut state = self.lock();
        state.roll_window(now);
        state.chat.record(
            model,
            &[("prompt", prompt_tokens), ("completion", completion_tokens)],
        );
        state.chat_requests.push_back(at);
    }

    /// True when any API type used more than 80% of its per-minute ceiling.
    pub fn check_rate_limits(&self) -> bool {
        self.check_rate_limits_at(Instant::now())
    }

    fn check_rate_limits_at(&self, now: Instant) -> bool {
        let mut state = self.lock();
        [ApiType::Embeddings, ApiType::ChatCompletions]
            .into_iter()
            .any(|api| {
                let recent = state.recent_requests(api, now) as f64;
                recent > f64::from(self.limits.ceiling(api)) * RATE_WARNING_RATIO
            })
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let now = Instant::now();
        let mut state = self.lock();
        state.roll_window(Utc::now());

        let mut requests_last_minute = BTreeMap::new();
        for api in [ApiType::Embeddings, ApiType::ChatCompletions] {
            requests_last_minute.insert(api.as_str().to_string(), state.recent_requests(api, now));
        }

        UsageSnapshot {
            window_start: state.window_start,
            embeddings: state.embeddings.clone(),
            chat_completions: state.chat.clone(),
            requests_last_minute,
        }
    }

    /// Linear roll-up of the current window. Unknown models cost nothing.
    ///
    /// Token counts are only kept per API type, so each model's share is
    /// apportioned by its call count.
    pub fn cost_estimate(&self) -> CostEstimate {
        let state = self.lock();

        let embeddings = self.apportioned_cost(&state.embeddings, |price, usage, share| {
            price.prompt * usage.token_count("total") as f64 * share / 1000.0
        });
        let chat_completions = self.apportioned_cost(&state.chat, |price, usage, share| {
            (price.prompt * usage.token_count("prompt") as f64
                + price.completion * usage.token_count("completion") as f64)
                * share
                / 1000.0
        });

        CostEstimate {
            embeddings,
            chat_completions,
            total: embeddings + chat_completions,
        }
    }

    fn apportioned_cost(
        &self,
        usage: &ApiUsage,
        cost: impl Fn(&ModelPrice, &ApiUsage, f64) -> f64,
    ) -> f64 {
        if usage.calls == 0 {
            return 0.0;
        }
        usage
            .models
            .iter()
            .filter_map(|(model, calls)| {
                let share = *calls as f64 / usage.calls as f64;
                self.prices.price(model).map(|price| cost(price, usage, share))
            })
            .sum()
    }

    pub fn recommendations(&self) -> Vec<String> {
        let near_limit = self.check_rate_limits();
        let state = self.lock();
        let mut hints = Vec::new();

        if state.embeddings.calls > HIGH_EMBEDDING_CALLS {
            hints.push(
                "High embedding volume: enable the embedding cache to avoid recomputing vectors"
                    .to_string(),
            );
        }

        if state.chat.calls > 0 {
            let avg_prompt = state.chat.token_count("prompt") as f64 / state.chat.calls as f64;
            if avg_prompt > HIGH_AVG_PROMPT_TOKENS {
                hints.push(format!(
                    "Average prompt is {:.0} tokens: shorten prompts or lower the rerank top_k",
                    avg_prompt
                ));
            }
        }

        if state.chat.calls > HIGH_CHAT_CALLS {
            hints.push(
                "High chat volume: keep the query cache enabled for repeated questions".to_string(),
            );
        }

        if near_limit {
            hints.push("Request rate is above 80% of the per-minute ceiling".to_string());
        }

        hints
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        *state = UsageState::new(Utc::now());
    }

    /// Writes the current snapshot under `openai_usage:<YYYYMMDDHH>`.
    pub async fn publish(&self) -> RagResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let snapshot = self.snapshot();
        let key = format!("openai_usage:{}", Utc::now().format("%Y%m%d%H"));
        let value = serde_json::to_string(&snapshot)
            .map_err(|e| RagError::storage(e.to_string()))?;

        store.set(&key, value, SNAPSHOT_TTL).await?;
        tracing::debug!("Published usage snapshot to {}", key);
        Ok(())
    }
}
