//! Platform search adapter: quota-gated, cache-partitioned, credential-
//! rotating channel discovery. Higher layers never see credentials or
//! rotation; they get profiles and a quota bill.

use std::{collections::HashMap, sync::atomic::Ordering};

use time::OffsetDateTime;

use crate::{
	Result, ScoutService,
	governor::{CHANNELS_LIST_COST_PER_CALL, QuotaGovernor, SEARCH_LIST_COST},
};
use scout_domain::scoring::VideoSample;
use scout_providers::youtube::{ChannelDetail, SearchHit};

/// In-memory channel view handed to the scorers. Immutable within a single
/// search.
#[derive(Clone, Debug)]
pub struct CreatorProfile {
	pub channel_id: String,
	pub handle: Option<String>,
	pub display_name: String,
	pub bio: String,
	pub image_url: String,
	pub subscribers: i64,
	pub videos: i64,
	pub views: i64,
	pub country: Option<String>,
	pub published_at: Option<OffsetDateTime>,
	pub last_video_date: Option<OffsetDateTime>,
	pub video_samples: Vec<VideoSample>,
}

#[derive(Debug, Default)]
pub struct PlatformSearchOutcome {
	/// Ordered `(query, profiles)` pairs; the order matches the expansion
	/// query list so downstream ranking is deterministic.
	pub results: Vec<(String, Vec<CreatorProfile>)>,
	pub quota_used: i64,
}

impl ScoutService {
	pub async fn search_platform_channels(
		&self,
		queries: &[String],
		max_results_per_query: u32,
	) -> Result<PlatformSearchOutcome> {
		if queries.is_empty() {
			return Ok(PlatformSearchOutcome::default());
		}

		let now = OffsetDateTime::now_utc();
		let estimated =
			QuotaGovernor::estimate_cost(queries.len() as i64, max_results_per_query as i64);
		let decision = self.quota_governor.check_quota(estimated, now);

		if !decision.is_allowed() {
			tracing::warn!("Platform quota exhausted; returning empty results.");

			return Ok(PlatformSearchOutcome::default());
		}

		let max_queries = decision
			.max_queries()
			.min(self.cfg.youtube.max_queries_per_search as usize);
		let max_results = max_results_per_query
			.min(decision.max_results())
			.min(self.cfg.youtube.max_results_per_query)
			.min(50);
		let unique_queries: Vec<String> =
			dedupe_queries(queries).into_iter().take(max_queries).collect();

		tracing::info!(
			requested = queries.len(),
			executing = unique_queries.len(),
			max_results,
			"Executing platform channel searches."
		);

		let mut results = Vec::with_capacity(unique_queries.len());
		let mut quota_used = 0_i64;
		let mut credentials_exhausted = false;

		for query in unique_queries {
			let (profiles, spent, exhausted) = self.search_one_query(&query, max_results).await;

			quota_used += spent;

			results.push((query, profiles));

			if exhausted {
				credentials_exhausted = true;

				break;
			}
		}

		if credentials_exhausted {
			tracing::error!("All platform credentials exhausted; aborting remaining queries.");
		}

		self.quota_governor.record_usage(quota_used, now);

		Ok(PlatformSearchOutcome { results, quota_used })
	}

	/// One `search.list` with rotation, then a single batched
	/// `channels.list` for the ids missing from the metadata cache.
	/// Returns `(profiles, quota spent, credentials exhausted)`.
	async fn search_one_query(
		&self,
		query: &str,
		max_results: u32,
	) -> (Vec<CreatorProfile>, i64, bool) {
		let hits = match self.search_with_rotation(query, max_results).await {
			RotationOutcome::Hits(hits) => hits,
			RotationOutcome::Failed => return (Vec::new(), 0, false),
			RotationOutcome::Exhausted => return (Vec::new(), 0, true),
		};
		let mut quota_used = SEARCH_LIST_COST;
		let mut ordered_ids = Vec::with_capacity(hits.len());
		let mut hit_dates: HashMap<String, Option<OffsetDateTime>> = HashMap::new();

		for hit in hits {
			if !hit_dates.contains_key(&hit.channel_id) {
				ordered_ids.push(hit.channel_id.clone());
				hit_dates.insert(hit.channel_id, hit.published_at);
			}
		}

		if ordered_ids.is_empty() {
			return (Vec::new(), quota_used, false);
		}

		let mut details: HashMap<String, ChannelDetail> = HashMap::new();
		let mut misses = Vec::new();

		for id in &ordered_ids {
			match self.channel_cache.get(id) {
				Some(detail) => {
					details.insert(id.clone(), detail);
				},
				None => misses.push(id.clone()),
			}
		}

		if !misses.is_empty() {
			match self.fetch_channels_with_rotation(&misses).await {
				RotationOutcome::Hits(fetched) => {
					quota_used += CHANNELS_LIST_COST_PER_CALL;

					for detail in fetched {
						self.channel_cache.insert(detail.channel_id.clone(), detail.clone());
						details.insert(detail.channel_id.clone(), detail);
					}
				},
				RotationOutcome::Failed => {},
				RotationOutcome::Exhausted => return (Vec::new(), quota_used, true),
			}
		}

		let profiles = ordered_ids
			.into_iter()
			.filter_map(|id| {
				let detail = details.remove(&id)?;
				let last_video_date = hit_dates.get(&detail.channel_id).copied().flatten();

				Some(profile_from_detail(detail, last_video_date))
			})
			.collect();

		(profiles, quota_used, false)
	}

	async fn search_with_rotation(&self, query: &str, max_results: u32) -> RotationOutcome<SearchHit> {
		let attempts = self.cfg.youtube.api_keys.len();

		for _ in 0..attempts {
			let api_key = self.current_api_key();

			match self
				.providers
				.platform
				.search_channels(&self.cfg.youtube, &api_key, query, max_results)
				.await
			{
				Ok(hits) => return RotationOutcome::Hits(hits),
				Err(err) if err.is_quota_shaped() => {
					tracing::warn!(query, "Quota-shaped platform failure; rotating credential.");
					self.rotate_credential();
				},
				Err(err) => {
					tracing::error!(error = %err, query, "Platform search failed.");

					return RotationOutcome::Failed;
				},
			}
		}

		RotationOutcome::Exhausted
	}

	async fn fetch_channels_with_rotation(
		&self,
		channel_ids: &[String],
	) -> RotationOutcome<ChannelDetail> {
		let attempts = self.cfg.youtube.api_keys.len();

		for _ in 0..attempts {
			let api_key = self.current_api_key();

			match self
				.providers
				.platform
				.list_channels(&self.cfg.youtube, &api_key, channel_ids)
				.await
			{
				Ok(channels) => return RotationOutcome::Hits(channels),
				Err(err) if err.is_quota_shaped() => {
					tracing::warn!("Quota-shaped channels failure; rotating credential.");
					self.rotate_credential();
				},
				Err(err) => {
					tracing::error!(error = %err, "Channel metadata fetch failed.");

					return RotationOutcome::Failed;
				},
			}
		}

		RotationOutcome::Exhausted
	}

	fn current_api_key(&self) -> String {
		let keys = &self.cfg.youtube.api_keys;
		let index = self.credential_index.load(Ordering::Relaxed) % keys.len();

		keys[index].clone()
	}

	fn rotate_credential(&self) {
		self.credential_index.fetch_add(1, Ordering::Relaxed);
	}

	pub fn channel_cache_stats(&self) -> crate::CacheStats {
		self.channel_cache.stats()
	}

	pub fn clear_channel_cache(&self) -> usize {
		self.channel_cache.clear()
	}
}

enum RotationOutcome<T> {
	Hits(Vec<T>),
	Failed,
	Exhausted,
}

/// Case-insensitive dedupe preserving first-occurrence order.
fn dedupe_queries(queries: &[String]) -> Vec<String> {
	let mut seen = Vec::new();
	let mut unique = Vec::new();

	for query in queries {
		let normalized = query.trim().to_lowercase();

		if normalized.is_empty() || seen.contains(&normalized) {
			continue;
		}

		seen.push(normalized);
		unique.push(query.clone());
	}

	unique
}

fn profile_from_detail(
	detail: ChannelDetail,
	last_video_date: Option<OffsetDateTime>,
) -> CreatorProfile {
	CreatorProfile {
		channel_id: detail.channel_id,
		handle: detail.handle,
		display_name: detail.title,
		bio: detail.description,
		image_url: detail.thumbnail_url,
		subscribers: detail.subscribers,
		videos: detail.videos,
		views: detail.views,
		country: detail.country,
		published_at: detail.published_at,
		last_video_date,
		video_samples: Vec::new(),
	}
}
