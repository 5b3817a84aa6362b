//! Creator row queries. Identity is `(platform, channel_id)`; rediscovery
//! only ever advances `last_seen_at` and the origin query.

use serde_json::Value;
use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::Creator};

pub struct NewCreator<'a> {
	pub creator_id: Uuid,
	pub platform: &'a str,
	pub channel_id: &'a str,
	pub display_name: &'a str,
	pub description: Option<&'a str>,
	pub profile_image_url: Option<&'a str>,
	pub base_genre: &'a str,
	pub origin_query: &'a str,
	pub country: Option<&'a str>,
	pub now: OffsetDateTime,
}

pub struct EmbeddingUpdate<'a> {
	pub profile_embedding: Value,
	pub embedding_model: &'a str,
	pub embedding_created_at: OffsetDateTime,
	pub compressed_bio: &'a str,
	pub content_tags: Value,
}

pub async fn find_by_platform_and_channel<'e, E>(
	executor: E,
	platform: &str,
	channel_id: &str,
) -> Result<Option<Creator>>
where
	E: PgExecutor<'e>,
{
	let creator = sqlx::query_as::<_, Creator>(
		"SELECT * FROM creators WHERE platform = $1 AND channel_id = $2",
	)
	.bind(platform)
	.bind(channel_id)
	.fetch_optional(executor)
	.await?;

	Ok(creator)
}

/// Insert-or-refresh on `(platform, channel_id)`. A concurrent duplicate
/// insert collapses into the update arm instead of erroring.
pub async fn upsert_discovered<'e, E>(executor: E, creator: NewCreator<'_>) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO creators (
	creator_id,
	platform,
	channel_id,
	display_name,
	description,
	profile_image_url,
	base_genre,
	origin_query,
	country,
	discovered_at,
	last_seen_at,
	status,
	source,
	ingestion_status
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, 'ACTIVE', 'API', 'pending')
ON CONFLICT (platform, channel_id) DO UPDATE
SET
	last_seen_at = EXCLUDED.last_seen_at,
	origin_query = EXCLUDED.origin_query,
	profile_image_url = COALESCE(EXCLUDED.profile_image_url, creators.profile_image_url)",
	)
	.bind(creator.creator_id)
	.bind(creator.platform)
	.bind(creator.channel_id)
	.bind(creator.display_name)
	.bind(creator.description)
	.bind(creator.profile_image_url)
	.bind(creator.base_genre)
	.bind(creator.origin_query)
	.bind(creator.country)
	.bind(creator.now)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn touch_last_seen<'e, E>(
	executor: E,
	platform: &str,
	channel_id: &str,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("UPDATE creators SET last_seen_at = $3 WHERE platform = $1 AND channel_id = $2")
		.bind(platform)
		.bind(channel_id)
		.bind(now)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn set_ingestion_status<'e, E>(executor: E, creator_id: Uuid, status: &str) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("UPDATE creators SET ingestion_status = $2 WHERE creator_id = $1")
		.bind(creator_id)
		.bind(status)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn store_embedding<'e, E>(
	executor: E,
	creator_id: Uuid,
	update: EmbeddingUpdate<'_>,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE creators
SET
	profile_embedding = $2,
	embedding_model = $3,
	embedding_created_at = $4,
	compressed_bio = $5,
	content_tags = $6,
	ingestion_status = 'complete'
WHERE creator_id = $1",
	)
	.bind(creator_id)
	.bind(update.profile_embedding)
	.bind(update.embedding_model)
	.bind(update.embedding_created_at)
	.bind(update.compressed_bio)
	.bind(update.content_tags)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn list_by_ingestion_statuses<'e, E>(
	executor: E,
	statuses: &[&str],
	limit: i64,
) -> Result<Vec<Creator>>
where
	E: PgExecutor<'e>,
{
	let statuses: Vec<String> = statuses.iter().map(|status| status.to_string()).collect();
	let creators = sqlx::query_as::<_, Creator>(
		"\
SELECT *
FROM creators
WHERE ingestion_status = ANY($1)
ORDER BY last_seen_at DESC
LIMIT $2",
	)
	.bind(&statuses)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(creators)
}
