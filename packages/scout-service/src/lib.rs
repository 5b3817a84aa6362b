pub mod admin;
pub mod cache;
pub mod expansion;
pub mod features;
pub mod governor;
pub mod grading;
pub mod ingest;
pub mod platform;
pub mod query_cache;
pub mod search;
pub mod session;
pub mod time_serde;
pub mod view;

mod error;

pub use self::{
	admin::{AdminStats, CacheClearReport},
	cache::{CacheStats, TtlCache},
	error::{Error, Result},
	expansion::GeneratedQueries,
	features::{FeatureFlag, FeatureRegistry, FeatureState, FeatureSummary},
	governor::{
		BudgetAction, BudgetDecision, QuotaAction, QuotaDecision, QuotaGovernor, QuotaStats,
		TokenGovernor, TokenStats,
	},
	grading::GradingCriteria,
	ingest::IngestReport,
	platform::{CreatorProfile, PlatformSearchOutcome},
	query_cache::CachedExpansion,
	search::{QueryChannelCount, QueryInfo, SearchRequest, SearchResponse},
	session::SESSION_SWEEP_INTERVAL_SECONDS,
	view::{FilterCriteria, SessionPage, SessionResultItem, SessionView},
};

use std::{
	future::Future,
	pin::Pin,
	sync::{Arc, atomic::AtomicUsize},
	time::Duration,
};

use time::OffsetDateTime;
use uuid::Uuid;

use scout_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, Youtube};
use scout_providers::{
	llm::ChatCompletion,
	youtube::{ChannelDetail, SearchHit},
};
use scout_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const EXPANSION_L1_CAPACITY: usize = 1_000;
const EXPANSION_L1_TTL: Duration = Duration::from_secs(300);
const SESSION_L1_CAPACITY: usize = 1_000;
const SESSION_L1_TTL: Duration = Duration::from_secs(300);
const CHANNEL_CACHE_CAPACITY: usize = 2_000;
const CHANNEL_CACHE_TTL: Duration = Duration::from_secs(3_600);

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<ChatCompletion>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// Platform calls return the provider error type unmapped: the adapter needs
/// the quota shape of a failure to drive credential rotation.
pub trait PlatformProvider
where
	Self: Send + Sync,
{
	fn search_channels<'a>(
		&'a self,
		cfg: &'a Youtube,
		api_key: &'a str,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, scout_providers::Result<Vec<SearchHit>>>;

	fn list_channels<'a>(
		&'a self,
		cfg: &'a Youtube,
		api_key: &'a str,
		channel_ids: &'a [String],
	) -> BoxFuture<'a, scout_providers::Result<Vec<ChannelDetail>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub llm: Arc<dyn LlmProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub platform: Arc<dyn PlatformProvider>,
}
impl Providers {
	pub fn new(
		llm: Arc<dyn LlmProvider>,
		embedding: Arc<dyn EmbeddingProvider>,
		platform: Arc<dyn PlatformProvider>,
	) -> Self {
		Self { llm, embedding, platform }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { llm: provider.clone(), embedding: provider.clone(), platform: provider }
	}
}

pub struct ScoutService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
	pub token_governor: TokenGovernor,
	pub quota_governor: QuotaGovernor,
	pub features: FeatureRegistry,
	pub(crate) expansion_l1: TtlCache<String, CachedExpansion>,
	pub(crate) session_l1: TtlCache<(String, String), Uuid>,
	pub(crate) channel_cache: TtlCache<String, ChannelDetail>,
	pub(crate) credential_index: AtomicUsize,
}
impl ScoutService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_providers(cfg, db, Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		let now = OffsetDateTime::now_utc();
		let token_governor = TokenGovernor::new(&cfg.llm_budget, now);
		let quota_governor = QuotaGovernor::new(&cfg.youtube, now);
		let features = FeatureRegistry::from_config(&cfg.features);

		Self {
			cfg,
			db,
			providers,
			token_governor,
			quota_governor,
			features,
			expansion_l1: TtlCache::new(EXPANSION_L1_CAPACITY, EXPANSION_L1_TTL),
			session_l1: TtlCache::new(SESSION_L1_CAPACITY, SESSION_L1_TTL),
			channel_cache: TtlCache::new(CHANNEL_CACHE_CAPACITY, CHANNEL_CACHE_TTL),
			credential_index: AtomicUsize::new(0),
		}
	}
}

struct DefaultProviders;
impl LlmProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<ChatCompletion>> {
		Box::pin(async move {
			scout_providers::llm::complete(cfg, prompt)
				.await
				.map_err(|err| Error::Provider { message: err.to_string() })
		})
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			scout_providers::embedding::embed(cfg, texts)
				.await
				.map_err(|err| Error::Provider { message: err.to_string() })
		})
	}
}

impl PlatformProvider for DefaultProviders {
	fn search_channels<'a>(
		&'a self,
		cfg: &'a Youtube,
		api_key: &'a str,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, scout_providers::Result<Vec<SearchHit>>> {
		Box::pin(scout_providers::youtube::search_channels(cfg, api_key, query, max_results))
	}

	fn list_channels<'a>(
		&'a self,
		cfg: &'a Youtube,
		api_key: &'a str,
		channel_ids: &'a [String],
	) -> BoxFuture<'a, scout_providers::Result<Vec<ChannelDetail>>> {
		Box::pin(scout_providers::youtube::list_channels(cfg, api_key, channel_ids))
	}
}
