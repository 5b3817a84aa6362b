//! Two-tier query-expansion cache: a small in-memory L1 over the durable L2
//! table. Within the L1 TTL a hit is served without touching storage; past
//! it, L2 is authoritative.

use time::{Duration, OffsetDateTime};

use crate::{Error, Result, ScoutService};
use scout_domain::normalize;
use scout_storage::query_cache::{self as l2, NewQueryCacheEntry};

#[derive(Clone, Debug)]
pub struct CachedExpansion {
	pub normalized: String,
	pub queries: Vec<String>,
	pub token_cost: i32,
	pub cached_at: OffsetDateTime,
}

impl ScoutService {
	pub(crate) async fn expansion_cache_get(&self, raw: &str) -> Result<Option<CachedExpansion>> {
		let key = normalize::cache_key(raw);

		if let Some(cached) = self.expansion_l1.get(&key) {
			return Ok(Some(cached));
		}

		let now = OffsetDateTime::now_utc();
		let Some(entry) = l2::find_valid(&self.db.pool, &key, now).await? else {
			return Ok(None);
		};
		let queries: Vec<String> =
			serde_json::from_value(entry.response_json.clone()).map_err(|err| Error::Storage {
				message: format!("Invalid cached expansion payload: {err}"),
			})?;

		// Bump the stored hit count off the request path; a lost bump only
		// under-counts.
		let pool = self.db.pool.clone();
		let bump_key = key.clone();

		tokio::spawn(async move {
			if let Err(err) = l2::increment_hit_count(&pool, &bump_key).await {
				tracing::warn!(error = %err, "Failed to bump expansion hit count.");
			}
		});

		let cached = CachedExpansion {
			normalized: entry.normalized_query,
			queries,
			token_cost: entry.token_cost,
			cached_at: entry.created_at,
		};

		self.expansion_l1.insert(key, cached.clone());

		Ok(Some(cached))
	}

	pub(crate) async fn expansion_cache_put(
		&self,
		raw: &str,
		queries: &[String],
		token_cost: i32,
	) -> Result<()> {
		let processed = normalize::process(raw);
		let now = OffsetDateTime::now_utc();
		let expires_at = now + Duration::hours(self.cfg.cache.l2_ttl_hours);
		let cached = CachedExpansion {
			normalized: processed.normalized.clone(),
			queries: queries.to_vec(),
			token_cost,
			cached_at: now,
		};

		self.expansion_l1.insert(processed.digest_key.clone(), cached);

		l2::upsert(
			&self.db.pool,
			NewQueryCacheEntry {
				digest_key: &processed.digest_key,
				normalized_query: &processed.normalized,
				response_json: serde_json::to_value(queries).map_err(|err| Error::Storage {
					message: format!("Failed to encode expansion payload: {err}"),
				})?,
				token_cost,
				created_at: now,
				expires_at,
			},
		)
		.await?;

		Ok(())
	}

	pub async fn purge_expired_expansions(&self) -> Result<u64> {
		let now = OffsetDateTime::now_utc();

		Ok(l2::delete_expired(&self.db.pool, now).await?)
	}
}
