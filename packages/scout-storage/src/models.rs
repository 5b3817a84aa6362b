use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Creator {
	pub creator_id: Uuid,
	pub platform: String,
	pub channel_id: String,
	pub display_name: String,
	pub description: Option<String>,
	pub profile_image_url: Option<String>,
	pub base_genre: Option<String>,
	pub origin_query: Option<String>,
	pub country: Option<String>,
	pub discovered_at: OffsetDateTime,
	pub last_seen_at: OffsetDateTime,
	pub status: String,
	pub source: String,
	pub profile_embedding: Option<Value>,
	pub embedding_model: Option<String>,
	pub embedding_created_at: Option<OffsetDateTime>,
	pub compressed_bio: Option<String>,
	pub content_tags: Option<Value>,
	pub ingestion_status: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchSession {
	pub session_id: Uuid,
	pub query_digest: String,
	pub platform: String,
	pub normalized_query: String,
	pub total_results: i32,
	pub external_units_used: i64,
	pub created_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
	pub last_accessed_at: OffsetDateTime,
}
impl SearchSession {
	pub fn is_expired(&self, now: OffsetDateTime) -> bool {
		self.expires_at <= now
	}
}

/// A point-in-time denormalized snapshot: rows never reference the creators
/// table, so later creator mutations cannot retroactively alter a session's
/// ranking.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchSessionResult {
	pub session_id: Uuid,
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
impl SearchSessionResult {
	pub fn label_strings(&self) -> Vec<String> {
		self.labels
			.as_array()
			.map(|labels| {
				labels
					.iter()
					.filter_map(|label| label.as_str())
					.map(|label| label.to_string())
					.collect()
			})
			.unwrap_or_default()
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueryCacheEntry {
	pub digest_key: String,
	pub normalized_query: String,
	pub response_json: Value,
	pub token_cost: i32,
	pub created_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
	pub hit_count: i64,
}
