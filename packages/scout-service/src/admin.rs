//! Operator-facing reads: usage counters, cache statistics, feature
//! states, and the cache-clear action.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{CacheStats, FeatureSummary, QuotaStats, Result, ScoutService, TokenStats};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
	pub active_sessions: i64,
	pub l1: CacheStats,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
	pub sessions: SessionStats,
	pub youtube_quota: QuotaStats,
	pub llm_tokens: TokenStats,
	pub channel_cache: CacheStats,
	pub expansion_cache: CacheStats,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearReport {
	pub channels_cleared: usize,
	pub sessions_swept: u64,
}

impl ScoutService {
	pub async fn admin_stats(&self) -> Result<AdminStats> {
		let now = OffsetDateTime::now_utc();

		Ok(AdminStats {
			sessions: SessionStats {
				active_sessions: self.active_session_count().await?,
				l1: self.session_cache_stats(),
			},
			youtube_quota: self.quota_governor.stats(now),
			llm_tokens: self.token_governor.stats(now),
			channel_cache: self.channel_cache_stats(),
			expansion_cache: self.expansion_l1.stats(),
		})
	}

	pub fn feature_summary(&self) -> FeatureSummary {
		self.features.summary()
	}

	/// Drops the channel metadata cache and sweeps expired sessions. Warm
	/// sessions and the durable expansion cache are untouched.
	pub async fn clear_caches(&self) -> Result<CacheClearReport> {
		let channels_cleared = self.clear_channel_cache();
		let sessions_swept = self.sweep_expired_sessions().await?;

		tracing::info!(channels_cleared, sessions_swept, "Caches cleared.");

		Ok(CacheClearReport { channels_cleared, sessions_swept })
	}
}
