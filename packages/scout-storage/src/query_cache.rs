//! Durable (L2) query-expansion cache rows.

use serde_json::Value;
use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{Result, models::QueryCacheEntry};

pub struct NewQueryCacheEntry<'a> {
	pub digest_key: &'a str,
	pub normalized_query: &'a str,
	pub response_json: Value,
	pub token_cost: i32,
	pub created_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
}

pub async fn find_valid<'e, E>(
	executor: E,
	digest_key: &str,
	now: OffsetDateTime,
) -> Result<Option<QueryCacheEntry>>
where
	E: PgExecutor<'e>,
{
	let entry = sqlx::query_as::<_, QueryCacheEntry>(
		"SELECT * FROM query_cache WHERE digest_key = $1 AND expires_at > $2",
	)
	.bind(digest_key)
	.bind(now)
	.fetch_optional(executor)
	.await?;

	Ok(entry)
}

pub async fn upsert<'e, E>(executor: E, entry: NewQueryCacheEntry<'_>) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO query_cache (
	digest_key,
	normalized_query,
	response_json,
	token_cost,
	created_at,
	expires_at,
	hit_count
)
VALUES ($1, $2, $3, $4, $5, $6, 0)
ON CONFLICT (digest_key) DO UPDATE
SET
	normalized_query = EXCLUDED.normalized_query,
	response_json = EXCLUDED.response_json,
	token_cost = EXCLUDED.token_cost,
	created_at = EXCLUDED.created_at,
	expires_at = EXCLUDED.expires_at",
	)
	.bind(entry.digest_key)
	.bind(entry.normalized_query)
	.bind(entry.response_json)
	.bind(entry.token_cost)
	.bind(entry.created_at)
	.bind(entry.expires_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Hit counts are monotonically non-decreasing; bumps run off the request
/// path and a lost bump only under-counts.
pub async fn increment_hit_count<'e, E>(executor: E, digest_key: &str) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("UPDATE query_cache SET hit_count = hit_count + 1 WHERE digest_key = $1")
		.bind(digest_key)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn delete_expired<'e, E>(executor: E, now: OffsetDateTime) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM query_cache WHERE expires_at <= $1")
		.bind(now)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}
