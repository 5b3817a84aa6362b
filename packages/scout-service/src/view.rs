//! Read-time view over a materialized session: filter, sort, paginate.
//!
//! Hard invariants: no LLM call, no platform call, no score recomputation,
//! no ranking recomputation. Everything here is a pure read over stored
//! rows plus the sliding-expiration touch.

use std::cmp::Ordering;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, ScoutService};
use scout_domain::{buckets, scoring, sort::SortKey};
use scout_storage::{models::SearchSessionResult, sessions};

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResultItem {
	pub rank: i32,
	pub channel_id: String,
	pub channel_name: String,
	pub description: Option<String>,
	pub image_url: Option<String>,
	pub score: f64,
	pub genre_relevance: f64,
	pub audience_fit: f64,
	pub engagement_quality: f64,
	pub activity_consistency: f64,
	pub freshness: f64,
	pub competitiveness_score: f64,
	pub competitiveness_tier: String,
	pub subscriber_count: i64,
	#[serde(with = "crate::time_serde::option")]
	pub last_video_date: Option<OffsetDateTime>,
	pub labels: Vec<String>,
}
impl SessionResultItem {
	fn from_row(row: &SearchSessionResult) -> Self {
		Self {
			rank: row.rank,
			channel_id: row.channel_id.clone(),
			channel_name: row.channel_name.clone(),
			description: row.description.clone(),
			image_url: row.image_url.clone(),
			score: row.score,
			genre_relevance: row.genre_relevance,
			audience_fit: row.audience_fit,
			engagement_quality: row.engagement_quality,
			activity_consistency: row.activity_consistency,
			freshness: row.freshness,
			competitiveness_score: row.competitiveness_score,
			// The tier string is derived at read time; the score itself is
			// frozen at materialization.
			competitiveness_tier: scoring::competitiveness_tier(row.competitiveness_score)
				.to_string(),
			subscriber_count: row.subscriber_count,
			last_video_date: row.last_video_date,
			labels: row.label_strings(),
		}
	}
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPage {
	pub session_id: Uuid,
	pub query: String,
	pub results: Vec<SessionResultItem>,
	pub total_results: i64,
	pub total_pages: i64,
	pub current_page: u32,
	pub page_size: u32,
	pub sort_key: String,
	pub active_filters: usize,
	#[serde(with = "crate::time_serde")]
	pub expires_at: OffsetDateTime,
}

#[derive(Debug)]
pub enum SessionView {
	Missing,
	Expired { session_id: Uuid },
	Page(SessionPage),
}

/// Multi-select filter criteria. Selections OR within a category; active
/// categories AND together. The platform filter is accepted but passes
/// unconditionally: platform is a session attribute, not a per-result
/// column.
#[derive(Clone, Debug, Default)]
pub struct FilterCriteria {
	pub audience: Vec<String>,
	pub engagement: Vec<String>,
	pub competitiveness: Vec<String>,
	pub activity: Vec<String>,
	pub platform: Vec<String>,
	pub genres: Vec<String>,
}
impl FilterCriteria {
	pub fn is_empty(&self) -> bool {
		self.audience.is_empty()
			&& self.engagement.is_empty()
			&& self.competitiveness.is_empty()
			&& self.activity.is_empty()
			&& self.platform.is_empty()
			&& self.genres.is_empty()
	}

	pub fn active_count(&self) -> usize {
		[
			&self.audience,
			&self.engagement,
			&self.competitiveness,
			&self.activity,
			&self.platform,
			&self.genres,
		]
		.into_iter()
		.filter(|category| !category.is_empty())
		.count()
	}
}

impl ScoutService {
	/// Paginate a session ordered by one whitelisted sort key. Ordering is
	/// pushed down to storage; the tiebreaker is always `rank ASC`.
	pub async fn paginate(
		&self,
		session_id: Uuid,
		page: u32,
		page_size: u32,
		sort_key: SortKey,
	) -> Result<SessionView> {
		let now = OffsetDateTime::now_utc();
		let Some(session) = sessions::find_by_id(&self.db.pool, session_id).await? else {
			return Ok(SessionView::Missing);
		};

		if session.is_expired(now) {
			return Ok(SessionView::Expired { session_id });
		}

		let expires_at = self.touch_session(&session, now).await?;
		let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
		let offset = page as i64 * page_size as i64;
		let rows = sessions::fetch_results_page(
			&self.db.pool,
			session_id,
			sort_key.column(),
			offset,
			page_size as i64,
		)
		.await?;
		let total_results = session.total_results as i64;

		Ok(SessionView::Page(SessionPage {
			session_id,
			query: session.normalized_query,
			results: rows.iter().map(SessionResultItem::from_row).collect(),
			total_results,
			total_pages: page_count(total_results, page_size),
			current_page: page,
			page_size,
			sort_key: sort_key.as_str().to_string(),
			active_filters: 0,
			expires_at,
		}))
	}

	/// Filter, then sort, then paginate. Predicates run over the stored
	/// score columns only; behaviorally identical to a storage-level plan.
	pub async fn paginate_filtered(
		&self,
		session_id: Uuid,
		page: u32,
		page_size: u32,
		sort_key: SortKey,
		filters: &FilterCriteria,
	) -> Result<SessionView> {
		let now = OffsetDateTime::now_utc();
		let Some(session) = sessions::find_by_id(&self.db.pool, session_id).await? else {
			return Ok(SessionView::Missing);
		};

		if session.is_expired(now) {
			return Ok(SessionView::Expired { session_id });
		}

		let expires_at = self.touch_session(&session, now).await?;
		let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
		let mut rows = sessions::fetch_results_by_rank(&self.db.pool, session_id).await?;

		if !filters.is_empty() {
			rows.retain(|row| row_passes(row, filters));
		}

		sort_rows(&mut rows, sort_key);

		let total_filtered = rows.len() as i64;
		let start = page as usize * page_size as usize;
		let page_rows: Vec<SessionResultItem> = rows
			.iter()
			.skip(start)
			.take(page_size as usize)
			.map(SessionResultItem::from_row)
			.collect();

		Ok(SessionView::Page(SessionPage {
			session_id,
			query: session.normalized_query,
			results: page_rows,
			total_results: total_filtered,
			total_pages: page_count(total_filtered, page_size),
			current_page: page,
			page_size,
			sort_key: sort_key.as_str().to_string(),
			active_filters: filters.active_count(),
			expires_at,
		}))
	}
}

fn page_count(total: i64, page_size: u32) -> i64 {
	let page_size = page_size as i64;
	(total + page_size - 1) / page_size
}

/// AND across categories, OR within each. Genre selections match the
/// stored label set case-insensitively.
fn row_passes(row: &SearchSessionResult, filters: &FilterCriteria) -> bool {
	if !buckets::matches_any_audience(row.audience_fit, &filters.audience) {
		return false;
	}
	if !buckets::matches_any_engagement(row.engagement_quality, &filters.engagement) {
		return false;
	}
	if !buckets::matches_any_competitiveness(row.competitiveness_score, &filters.competitiveness) {
		return false;
	}
	if !buckets::matches_any_activity(row.activity_consistency, &filters.activity) {
		return false;
	}
	if !filters.genres.is_empty() {
		let labels = row.label_strings();

		if !labels.iter().any(|label| {
			filters.genres.iter().any(|genre| genre.eq_ignore_ascii_case(label))
		}) {
			return false;
		}
	}

	true
}

fn sort_rows(rows: &mut [SearchSessionResult], sort_key: SortKey) {
	rows.sort_by(|a, b| {
		let primary = match sort_key {
			SortKey::FinalScore => compare_f64(b.score, a.score),
			SortKey::Relevance => compare_f64(b.genre_relevance, a.genre_relevance),
			SortKey::Subscribers => b.subscriber_count.cmp(&a.subscriber_count),
			SortKey::Engagement => compare_f64(b.engagement_quality, a.engagement_quality),
			SortKey::Activity => compare_dates_desc_nulls_last(a.last_video_date, b.last_video_date),
			SortKey::Competitiveness =>
				compare_f64(b.competitiveness_score, a.competitiveness_score),
		};

		primary.then_with(|| a.rank.cmp(&b.rank))
	});
}

fn compare_f64(a: f64, b: f64) -> Ordering {
	a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare_dates_desc_nulls_last(
	a: Option<OffsetDateTime>,
	b: Option<OffsetDateTime>,
) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => b.cmp(&a),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}
