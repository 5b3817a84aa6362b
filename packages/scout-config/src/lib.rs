mod types;

use std::{fs, path::Path};

use color_eyre::eyre;

pub use types::{
	CacheConfig, Config, EmbeddingProviderConfig, FeatureToggle, Features, LlmBudget,
	LlmProviderConfig, Postgres, Providers, Security, Service, Session, Storage, Youtube,
};

pub fn load(path: &Path) -> color_eyre::Result<Config> {
	let raw = fs::read_to_string(path)?;

	let mut cfg: Config = toml::from_str(&raw)?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

fn normalize(cfg: &mut Config) {
	cfg.youtube.api_keys.retain(|key| !key.trim().is_empty());

	for key in &mut cfg.youtube.api_keys {
		*key = key.trim().to_string();
	}
}

pub fn validate(cfg: &Config) -> color_eyre::Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(eyre::eyre!("service.http_bind must be non-empty."));
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(eyre::eyre!("service.admin_bind must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(eyre::eyre!("storage.postgres.pool_max_conns must be greater than zero."));
	}

	if cfg.youtube.api_keys.is_empty() {
		return Err(eyre::eyre!("youtube.api_keys must contain at least one credential."));
	}
	if cfg.youtube.daily_quota <= 0 {
		return Err(eyre::eyre!("youtube.daily_quota must be greater than zero."));
	}
	if !(0.0..=1.0).contains(&cfg.youtube.downgrade_threshold) {
		return Err(eyre::eyre!("youtube.downgrade_threshold must be in the range 0.0-1.0."));
	}
	if cfg.youtube.max_queries_per_search == 0 {
		return Err(eyre::eyre!("youtube.max_queries_per_search must be greater than zero."));
	}
	if cfg.youtube.max_results_per_query == 0 || cfg.youtube.max_results_per_query > 50 {
		return Err(eyre::eyre!("youtube.max_results_per_query must be in the range 1-50."));
	}

	if cfg.llm_budget.daily_token_budget <= 0 {
		return Err(eyre::eyre!("llm_budget.daily_token_budget must be greater than zero."));
	}
	if cfg.llm_budget.per_request_budget <= 0 {
		return Err(eyre::eyre!("llm_budget.per_request_budget must be greater than zero."));
	}
	if !(0.0..=1.0).contains(&cfg.llm_budget.fallback_threshold) {
		return Err(eyre::eyre!("llm_budget.fallback_threshold must be in the range 0.0-1.0."));
	}

	if cfg.session.ttl_minutes <= 0 {
		return Err(eyre::eyre!("session.ttl_minutes must be greater than zero."));
	}
	if cfg.cache.l2_ttl_hours <= 0 {
		return Err(eyre::eyre!("cache.l2_ttl_hours must be greater than zero."));
	}

	if cfg.providers.embedding.dimensions == 0 {
		return Err(eyre::eyre!("providers.embedding.dimensions must be greater than zero."));
	}
	if !cfg.providers.llm.temperature.is_finite() || cfg.providers.llm.temperature < 0.0 {
		return Err(eyre::eyre!("providers.llm.temperature must be a finite non-negative number."));
	}

	for (label, key) in [
		("llm", &cfg.providers.llm.api_key),
		("embedding", &cfg.providers.embedding.api_key),
	] {
		if key.trim().is_empty() {
			return Err(eyre::eyre!("Provider {label} api_key must be non-empty."));
		}
	}

	Ok(())
}
