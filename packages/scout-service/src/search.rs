//! Search orchestration. Warm path: digest lookup, materialized page, zero
//! external calls. Fresh path: expansion, platform fan-out, persistence,
//! grading, ranking, materialization, first page, then detached ingestion.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result, ScoutService,
	grading::{self, GradingCriteria},
	view::{SessionPage, SessionView},
};
use scout_domain::{ranking, sort::SortKey};

const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
	pub genre: String,
	#[serde(default)]
	pub platform: Option<String>,
	#[serde(default)]
	pub page: Option<u32>,
	#[serde(default)]
	pub page_size: Option<u32>,
	#[serde(default)]
	pub filters: Option<HashMap<String, String>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
	pub normalized: String,
	pub queries: Vec<String>,
	pub count: usize,
	pub token_cost: i32,
	pub from_cache: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryChannelCount {
	pub query: String,
	pub channels: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub session_id: Option<Uuid>,
	pub results: Vec<crate::view::SessionResultItem>,
	pub total_results: i64,
	pub total_pages: i64,
	pub current_page: u32,
	pub page_size: u32,
	pub from_cache: bool,
	pub external_units_used: i64,
	pub query_info: Option<QueryInfo>,
	pub channel_results: Vec<QueryChannelCount>,
}
impl SearchResponse {
	fn empty(page: u32, page_size: u32) -> Self {
		Self {
			session_id: None,
			results: Vec::new(),
			total_results: 0,
			total_pages: 0,
			current_page: page,
			page_size,
			from_cache: false,
			external_units_used: 0,
			query_info: None,
			channel_results: Vec::new(),
		}
	}

	fn from_page(
		page: SessionPage,
		from_cache: bool,
		external_units_used: i64,
		query_info: Option<QueryInfo>,
		channel_results: Vec<QueryChannelCount>,
	) -> Self {
		Self {
			session_id: Some(page.session_id),
			results: page.results,
			total_results: page.total_results,
			total_pages: page.total_pages,
			current_page: page.current_page,
			page_size: page.page_size,
			from_cache,
			external_units_used,
			query_info,
			channel_results,
		}
	}
}

impl ScoutService {
	pub async fn perform_search(self: &Arc<Self>, req: SearchRequest) -> Result<SearchResponse> {
		let genre = req.genre.trim().to_string();

		if genre.is_empty() {
			return Err(Error::InvalidRequest { message: "genre must be non-empty.".to_string() });
		}

		let platform = req.platform.clone().unwrap_or_else(|| "youtube".to_string());
		let page = req.page.unwrap_or(0);
		let page_size = req.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

		// Warm path: an existing valid session serves the page with zero
		// external calls.
		if let Some(session) = self.find_valid_session(&genre, &platform).await? {
			let view =
				self.paginate(session.session_id, page, page_size, SortKey::FinalScore).await?;

			if let SessionView::Page(page) = view {
				return Ok(SearchResponse::from_page(page, true, 0, None, Vec::new()));
			}
			// The session vanished between lookup and pagination; run the
			// fresh path below.
		}

		self.execute_fresh_search(&genre, &platform, page, page_size, req.filters.as_ref()).await
	}

	async fn execute_fresh_search(
		self: &Arc<Self>,
		genre: &str,
		platform: &str,
		page: u32,
		page_size: u32,
		filters: Option<&HashMap<String, String>>,
	) -> Result<SearchResponse> {
		let now = OffsetDateTime::now_utc();
		let generated = self.generate_queries(genre).await?;
		let outcome = self
			.search_platform_channels(&generated.queries, self.cfg.youtube.max_results_per_query)
			.await?;

		self.persist_discovered(&outcome.results, genre, now).await?;

		let criteria = GradingCriteria::from_filters(genre, filters);
		let graded: Vec<(String, Vec<ranking::ScoredCreator>)> = outcome
			.results
			.iter()
			.map(|(query, profiles)| {
				(
					query.clone(),
					grading::grade_profiles(query, profiles, &criteria, Some(now), now),
				)
			})
			.collect();
		let ranked = ranking::merge_and_rank(graded);
		let session = self.create_session(genre, platform, &ranked, outcome.quota_used).await?;
		let channel_results: Vec<QueryChannelCount> = outcome
			.results
			.iter()
			.map(|(query, profiles)| QueryChannelCount {
				query: query.clone(),
				channels: profiles.len(),
			})
			.collect();
		let ingestion_batch: Vec<(String, crate::CreatorProfile)> = outcome
			.results
			.iter()
			.flat_map(|(query, profiles)| {
				profiles.iter().map(move |profile| (query.clone(), profile.clone()))
			})
			.collect();

		// Ingestion never blocks the response.
		self.spawn_ingestion(ingestion_batch, genre.to_string());

		let query_info = QueryInfo {
			normalized: generated.normalized,
			queries: generated.queries,
			count: generated.count,
			token_cost: generated.token_cost,
			from_cache: generated.from_cache,
		};
		let view = self.paginate(session.session_id, page, page_size, SortKey::FinalScore).await?;

		match view {
			SessionView::Page(page) => Ok(SearchResponse::from_page(
				page,
				false,
				outcome.quota_used,
				Some(query_info),
				channel_results,
			)),
			_ => Ok(SearchResponse::empty(page, page_size)),
		}
	}

	/// Synchronous persistence of every discovered profile: new identities
	/// are inserted, known ones get `last_seen_at` and the origin query
	/// refreshed.
	async fn persist_discovered(
		&self,
		results: &[(String, Vec<crate::CreatorProfile>)],
		base_genre: &str,
		now: OffsetDateTime,
	) -> Result<usize> {
		let mut persisted = 0;

		for (origin_query, profiles) in results {
			for profile in profiles {
				let upsert = scout_storage::creators::upsert_discovered(
					&self.db.pool,
					scout_storage::creators::NewCreator {
						creator_id: Uuid::new_v4(),
						platform: "youtube",
						channel_id: &profile.channel_id,
						display_name: &profile.display_name,
						description: Some(profile.bio.chars().take(2_000).collect::<String>())
							.filter(|text| !text.is_empty())
							.as_deref(),
						profile_image_url: Some(profile.image_url.as_str())
							.filter(|url| !url.is_empty()),
						base_genre,
						origin_query,
						country: profile.country.as_deref(),
						now,
					},
				)
				.await;

				match upsert {
					Ok(()) => persisted += 1,
					Err(err) if err.is_unique_violation() => {},
					Err(err) => return Err(err.into()),
				}
			}
		}

		tracing::info!(persisted, genre = base_genre, "Persisted discovered creators.");

		Ok(persisted)
	}
}
