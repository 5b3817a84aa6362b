use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub youtube: Youtube,
	#[serde(default)]
	pub llm_budget: LlmBudget,
	#[serde(default)]
	pub session: Session,
	#[serde(default)]
	pub cache: CacheConfig,
	#[serde(default)]
	pub security: Security,
	#[serde(default)]
	pub features: Features,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub llm: LlmProviderConfig,
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Youtube {
	pub api_base: String,
	pub api_keys: Vec<String>,
	#[serde(default = "default_daily_quota")]
	pub daily_quota: i64,
	#[serde(default = "default_downgrade_threshold")]
	pub downgrade_threshold: f64,
	#[serde(default = "default_max_queries_per_search")]
	pub max_queries_per_search: u32,
	#[serde(default = "default_max_results_per_query")]
	pub max_results_per_query: u32,
	#[serde(default = "default_youtube_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LlmBudget {
	pub daily_token_budget: i64,
	pub per_request_budget: i64,
	pub fallback_threshold: f64,
}
impl Default for LlmBudget {
	fn default() -> Self {
		Self { daily_token_budget: 1_000_000, per_request_budget: 2_000, fallback_threshold: 0.9 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
	pub ttl_minutes: i64,
	pub sliding_expiration: bool,
}
impl Default for Session {
	fn default() -> Self {
		Self { ttl_minutes: 30, sliding_expiration: true }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
	pub l2_ttl_hours: i64,
}
impl Default for CacheConfig {
	fn default() -> Self {
		Self { l2_ttl_hours: 24 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}

/// Optional enrichment integrations. Each feature activates only when its
/// credentials are present AND its flag is true.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Features {
	pub reddit_enrichment: FeatureToggle,
	pub instagram_enrichment: FeatureToggle,
	pub twitter_enrichment: FeatureToggle,
	pub twitch_enrichment: FeatureToggle,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeatureToggle {
	pub enabled: bool,
	pub client_id: Option<String>,
	pub client_secret: Option<String>,
	pub access_token: Option<String>,
	pub bearer_token: Option<String>,
}
impl FeatureToggle {
	pub fn has_credentials(&self) -> bool {
		let present = |value: &Option<String>| {
			value.as_deref().map(|raw| !raw.trim().is_empty()).unwrap_or(false)
		};

		present(&self.client_id) && present(&self.client_secret)
			|| present(&self.access_token)
			|| present(&self.bearer_token)
	}
}

fn default_daily_quota() -> i64 {
	10_000
}

fn default_downgrade_threshold() -> f64 {
	0.8
}

fn default_max_queries_per_search() -> u32 {
	5
}

fn default_max_results_per_query() -> u32 {
	50
}

fn default_youtube_timeout_ms() -> u64 {
	15_000
}
