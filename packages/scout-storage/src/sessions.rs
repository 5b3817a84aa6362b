//! Session and materialized-result queries. Materialization is always
//! delete-then-insert inside the caller's transaction so readers see either
//! the prior committed rows or the full new set.

use serde_json::Value;
use sqlx::{PgExecutor, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::{SearchSession, SearchSessionResult}};

pub struct NewSearchSession<'a> {
	pub session_id: Uuid,
	pub query_digest: &'a str,
	pub platform: &'a str,
	pub normalized_query: &'a str,
	pub total_results: i32,
	pub external_units_used: i64,
	pub created_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
}

pub struct NewSessionResult {
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
	pub subscriber_count: i64,
	pub last_video_date: Option<OffsetDateTime>,
	pub labels: Value,
}

pub async fn insert<'e, E>(executor: E, session: NewSearchSession<'_>) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO search_sessions (
	session_id,
	query_digest,
	platform,
	normalized_query,
	total_results,
	external_units_used,
	created_at,
	expires_at,
	last_accessed_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $7)",
	)
	.bind(session.session_id)
	.bind(session.query_digest)
	.bind(session.platform)
	.bind(session.normalized_query)
	.bind(session.total_results)
	.bind(session.external_units_used)
	.bind(session.created_at)
	.bind(session.expires_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn find_by_id<'e, E>(executor: E, session_id: Uuid) -> Result<Option<SearchSession>>
where
	E: PgExecutor<'e>,
{
	let session = sqlx::query_as::<_, SearchSession>(
		"SELECT * FROM search_sessions WHERE session_id = $1",
	)
	.bind(session_id)
	.fetch_optional(executor)
	.await?;

	Ok(session)
}

/// Upsert probe: returns the row regardless of expiry, so a stale session is
/// updated in place instead of violating the `(query_digest, platform)`
/// uniqueness constraint.
pub async fn find_by_digest_and_platform<'e, E>(
	executor: E,
	query_digest: &str,
	platform: &str,
) -> Result<Option<SearchSession>>
where
	E: PgExecutor<'e>,
{
	let session = sqlx::query_as::<_, SearchSession>(
		"SELECT * FROM search_sessions WHERE query_digest = $1 AND platform = $2",
	)
	.bind(query_digest)
	.bind(platform)
	.fetch_optional(executor)
	.await?;

	Ok(session)
}

pub async fn find_valid<'e, E>(
	executor: E,
	query_digest: &str,
	platform: &str,
	now: OffsetDateTime,
) -> Result<Option<SearchSession>>
where
	E: PgExecutor<'e>,
{
	let session = sqlx::query_as::<_, SearchSession>(
		"\
SELECT *
FROM search_sessions
WHERE query_digest = $1
	AND platform = $2
	AND expires_at > $3",
	)
	.bind(query_digest)
	.bind(platform)
	.bind(now)
	.fetch_optional(executor)
	.await?;

	Ok(session)
}

pub async fn update_for_rematerialization<'e, E>(
	executor: E,
	session_id: Uuid,
	total_results: i32,
	external_units_delta: i64,
	expires_at: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE search_sessions
SET
	total_results = $2,
	external_units_used = external_units_used + $3,
	expires_at = $4,
	last_accessed_at = $5
WHERE session_id = $1",
	)
	.bind(session_id)
	.bind(total_results)
	.bind(external_units_delta)
	.bind(expires_at)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(())
}

/// Sliding-expiration touch. Conditional on the session still being alive so
/// an already-expired session is never revived.
pub async fn touch<'e, E>(
	executor: E,
	session_id: Uuid,
	expires_at: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE search_sessions
SET expires_at = $2, last_accessed_at = $3
WHERE session_id = $1
	AND expires_at > $3",
	)
	.bind(session_id)
	.bind(expires_at)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn delete_results<'e, E>(executor: E, session_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM search_session_results WHERE session_id = $1")
		.bind(session_id)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn insert_results<'e, E>(
	executor: E,
	session_id: Uuid,
	results: &[NewSessionResult],
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	if results.is_empty() {
		return Ok(());
	}

	let mut builder = QueryBuilder::new(
		"INSERT INTO search_session_results \
		 (session_id, rank, channel_id, channel_name, description, image_url, score, \
		  genre_relevance, audience_fit, engagement_quality, activity_consistency, freshness, \
		  competitiveness_score, subscriber_count, last_video_date, labels) ",
	);

	builder.push_values(results, |mut b, result| {
		b.push_bind(session_id)
			.push_bind(result.rank)
			.push_bind(&result.channel_id)
			.push_bind(&result.channel_name)
			.push_bind(&result.description)
			.push_bind(&result.image_url)
			.push_bind(result.score)
			.push_bind(result.genre_relevance)
			.push_bind(result.audience_fit)
			.push_bind(result.engagement_quality)
			.push_bind(result.activity_consistency)
			.push_bind(result.freshness)
			.push_bind(result.competitiveness_score)
			.push_bind(result.subscriber_count)
			.push_bind(result.last_video_date)
			.push_bind(&result.labels);
	});
	builder.build().execute(executor).await?;

	Ok(())
}

/// Paginated read ordered by one whitelisted column. `sort_column` must come
/// from the closed `SortKey` set; it is interpolated, never bound, because
/// Postgres cannot parameterize ORDER BY targets.
pub async fn fetch_results_page<'e, E>(
	executor: E,
	session_id: Uuid,
	sort_column: &'static str,
	offset: i64,
	limit: i64,
) -> Result<Vec<SearchSessionResult>>
where
	E: PgExecutor<'e>,
{
	let query = format!(
		"\
SELECT *
FROM search_session_results
WHERE session_id = $1
ORDER BY {sort_column} DESC NULLS LAST, rank ASC
OFFSET $2
LIMIT $3",
	);
	let results = sqlx::query_as::<_, SearchSessionResult>(&query)
		.bind(session_id)
		.bind(offset)
		.bind(limit)
		.fetch_all(executor)
		.await?;

	Ok(results)
}

pub async fn fetch_results_by_rank<'e, E>(
	executor: E,
	session_id: Uuid,
) -> Result<Vec<SearchSessionResult>>
where
	E: PgExecutor<'e>,
{
	let results = sqlx::query_as::<_, SearchSessionResult>(
		"SELECT * FROM search_session_results WHERE session_id = $1 ORDER BY rank ASC",
	)
	.bind(session_id)
	.fetch_all(executor)
	.await?;

	Ok(results)
}

pub async fn count_active<'e, E>(executor: E, now: OffsetDateTime) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let (count,): (i64,) =
		sqlx::query_as("SELECT COUNT(*) FROM search_sessions WHERE expires_at > $1")
			.bind(now)
			.fetch_one(executor)
			.await?;

	Ok(count)
}

pub async fn delete_expired<'e, E>(executor: E, now: OffsetDateTime) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM search_sessions WHERE expires_at <= $1")
		.bind(now)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}
