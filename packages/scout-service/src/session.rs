//! Session materialization and lifecycle. Creating a session for a
//! `(query digest, platform)` pair that already has one updates the row in
//! place and replaces its results inside the same transaction, so
//! concurrent fresh executions converge on one session and readers only
//! ever see a fully committed result set.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, Result, ScoutService};
use scout_domain::{
	normalize,
	ranking::{self, ScoredCreator},
	scoring,
};
use scout_storage::{
	models::SearchSession,
	sessions::{self, NewSearchSession, NewSessionResult},
};

pub const SESSION_SWEEP_INTERVAL_SECONDS: u64 = 300;

impl ScoutService {
	pub async fn create_session(
		&self,
		genre: &str,
		platform: &str,
		ranked: &[ScoredCreator],
		quota_used: i64,
	) -> Result<SearchSession> {
		let processed = normalize::process(genre);
		let now = OffsetDateTime::now_utc();
		let expires_at = now + Duration::minutes(self.cfg.session.ttl_minutes);
		let rows = materialize_rows(ranked);

		debug_assert!(ranking::ranks_are_dense(
			&rows.iter().map(|row| row.rank).collect::<Vec<_>>()
		));

		let mut tx = self.db.pool.begin().await?;
		let existing =
			sessions::find_by_digest_and_platform(&mut *tx, &processed.digest_key, platform)
				.await?;
		let session_id = match existing {
			Some(session) => {
				tracing::info!(session_id = %session.session_id, "Rematerializing existing session.");

				sessions::update_for_rematerialization(
					&mut *tx,
					session.session_id,
					rows.len() as i32,
					quota_used,
					expires_at,
					now,
				)
				.await?;
				sessions::delete_results(&mut *tx, session.session_id).await?;

				session.session_id
			},
			None => {
				let session_id = Uuid::new_v4();
				let inserted = sessions::insert(
					&mut *tx,
					NewSearchSession {
						session_id,
						query_digest: &processed.digest_key,
						platform,
						normalized_query: &processed.normalized,
						total_results: rows.len() as i32,
						external_units_used: quota_used,
						created_at: now,
						expires_at,
					},
				)
				.await;

				match inserted {
					Ok(()) => session_id,
					// A concurrent fresh execution won the insert. Restart
					// on the update path; the later writer's results win.
					Err(err) if err.is_unique_violation() => {
						tx.rollback().await?;

						tx = self.db.pool.begin().await?;

						let session = sessions::find_by_digest_and_platform(
							&mut *tx,
							&processed.digest_key,
							platform,
						)
						.await?
						.ok_or_else(|| Error::Storage {
							message: "Conflicting session vanished during materialization."
								.to_string(),
						})?;

						sessions::update_for_rematerialization(
							&mut *tx,
							session.session_id,
							rows.len() as i32,
							quota_used,
							expires_at,
							now,
						)
						.await?;
						sessions::delete_results(&mut *tx, session.session_id).await?;

						session.session_id
					},
					Err(err) => return Err(err.into()),
				}
			},
		};

		sessions::insert_results(&mut *tx, session_id, &rows).await?;

		tx.commit().await?;

		self.session_l1.insert((processed.digest_key.clone(), platform.to_string()), session_id);

		let session =
			sessions::find_by_id(&self.db.pool, session_id).await?.ok_or_else(|| Error::Storage {
				message: "Session vanished immediately after materialization.".to_string(),
			})?;

		tracing::info!(
			session_id = %session.session_id,
			results = rows.len(),
			"Materialized session."
		);

		Ok(session)
	}

	/// Probes the session L1, re-verifies against storage, then falls back
	/// to the durable lookup. Every hit sliding-touches the session.
	pub async fn find_valid_session(
		&self,
		genre: &str,
		platform: &str,
	) -> Result<Option<SearchSession>> {
		let digest = normalize::cache_key(genre);
		let cache_key = (digest.clone(), platform.to_string());
		let now = OffsetDateTime::now_utc();

		if let Some(session_id) = self.session_l1.get(&cache_key) {
			match sessions::find_by_id(&self.db.pool, session_id).await? {
				Some(mut session) if !session.is_expired(now) => {
					session.expires_at = self.touch_session(&session, now).await?;

					return Ok(Some(session));
				},
				_ => {
					self.session_l1.invalidate(&cache_key);
				},
			}
		}

		let Some(mut session) =
			sessions::find_valid(&self.db.pool, &digest, platform, now).await?
		else {
			return Ok(None);
		};

		self.session_l1.insert(cache_key, session.session_id);

		session.expires_at = self.touch_session(&session, now).await?;

		Ok(Some(session))
	}

	/// Advances `expires_at` to `now + ttl` when sliding expiration is on.
	/// The update is conditional on the session still being alive, so an
	/// expired session is never revived.
	pub(crate) async fn touch_session(
		&self,
		session: &SearchSession,
		now: OffsetDateTime,
	) -> Result<OffsetDateTime> {
		if !self.cfg.session.sliding_expiration {
			return Ok(session.expires_at);
		}

		let extended = now + Duration::minutes(self.cfg.session.ttl_minutes);

		if sessions::touch(&self.db.pool, session.session_id, extended, now).await? {
			Ok(extended)
		} else {
			Ok(session.expires_at)
		}
	}

	/// Deletes expired sessions; their results cascade. Runs on the sweeper
	/// cadence and from the admin cache-clear path.
	pub async fn sweep_expired_sessions(&self) -> Result<u64> {
		let now = OffsetDateTime::now_utc();
		let swept = sessions::delete_expired(&self.db.pool, now).await?;

		if swept > 0 {
			tracing::info!(count = swept, "Swept expired sessions.");
		}

		Ok(swept)
	}

	pub async fn active_session_count(&self) -> Result<i64> {
		let now = OffsetDateTime::now_utc();

		Ok(sessions::count_active(&self.db.pool, now).await?)
	}

	pub fn session_cache_stats(&self) -> crate::CacheStats {
		self.session_l1.stats()
	}
}

/// Freezes the ranked list into dense-ranked rows. Competitiveness is
/// computed here, once, from the stored sub-scores.
fn materialize_rows(ranked: &[ScoredCreator]) -> Vec<NewSessionResult> {
	ranked
		.iter()
		.enumerate()
		.map(|(index, creator)| NewSessionResult {
			rank: index as i32 + 1,
			channel_id: creator.channel_id.clone(),
			channel_name: creator.channel_name.clone(),
			description: Some(creator.description.clone()).filter(|text| !text.is_empty()),
			image_url: Some(creator.image_url.clone()).filter(|url| !url.is_empty()),
			score: creator.score.final_score,
			genre_relevance: creator.score.genre_relevance,
			audience_fit: creator.score.audience_fit,
			engagement_quality: creator.score.engagement_quality,
			activity_consistency: creator.score.activity_consistency,
			freshness: creator.score.freshness,
			competitiveness_score: scoring::score_competitiveness(
				creator.score.audience_fit,
				creator.score.engagement_quality,
				creator.score.activity_consistency,
			),
			subscriber_count: creator.subscriber_count,
			last_video_date: creator.last_video_date,
			labels: serde_json::json!(creator.labels),
		})
		.collect()
}
