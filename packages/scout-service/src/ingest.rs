//! One-time creator ingestion: embedding + content tags per newly seen
//! channel. Runs off the search path; nothing here ever surfaces an error
//! to a search response.

use std::{collections::HashSet, sync::Arc};

use time::OffsetDateTime;

use crate::{Result, ScoutService, platform::CreatorProfile};
use scout_domain::tags;
use scout_storage::{
	creators::{self, EmbeddingUpdate, NewCreator},
	models::Creator,
};

pub const INGESTION_BATCH_LIMIT: usize = 50;

const EMBEDDING_ESTIMATED_TOKENS: i64 = 500;
const COMPRESSED_BIO_MAX_CHARS: usize = 500;
const EMBEDDING_BIO_MAX_CHARS: usize = 300;
const DESCRIPTION_MAX_CHARS: usize = 2_000;

const STATUS_COMPLETE: &str = "complete";
const STATUS_DEFERRED: &str = "deferred";
const STATUS_FAILED: &str = "failed";
const STATUS_PENDING: &str = "pending";

#[derive(Clone, Copy, Debug, Default)]
pub struct IngestReport {
	pub processed: usize,
	pub ingested: usize,
	pub skipped: usize,
	pub deferred: usize,
	pub failed: usize,
}

enum IngestOutcome {
	Ingested,
	Skipped,
	Deferred,
	Failed,
}

impl ScoutService {
	/// Fire-and-forget batch ingestion. The search response never waits on
	/// this.
	pub fn spawn_ingestion(
		self: &Arc<Self>,
		profiles: Vec<(String, CreatorProfile)>,
		base_genre: String,
	) {
		let service = self.clone();

		tokio::spawn(async move {
			let report = service.ingest_batch(&profiles, &base_genre).await;

			tracing::info!(
				processed = report.processed,
				ingested = report.ingested,
				deferred = report.deferred,
				failed = report.failed,
				"Ingestion batch complete."
			);
		});
	}

	/// Ingests up to 50 distinct profiles, each paired with the query that
	/// discovered it. Per-creator failures are counted, never propagated.
	pub async fn ingest_batch(
		&self,
		profiles: &[(String, CreatorProfile)],
		base_genre: &str,
	) -> IngestReport {
		let mut report = IngestReport::default();
		let mut seen = HashSet::new();

		for (origin_query, profile) in profiles {
			if !seen.insert(profile.channel_id.clone()) {
				continue;
			}
			if report.processed >= INGESTION_BATCH_LIMIT {
				break;
			}

			report.processed += 1;

			match self.ingest_creator(profile, base_genre, origin_query).await {
				Ok(IngestOutcome::Ingested) => report.ingested += 1,
				Ok(IngestOutcome::Skipped) => report.skipped += 1,
				Ok(IngestOutcome::Deferred) => report.deferred += 1,
				Ok(IngestOutcome::Failed) => report.failed += 1,
				Err(err) => {
					report.failed += 1;

					tracing::error!(
						error = %err,
						channel_id = %profile.channel_id,
						"Creator ingestion errored."
					);
				},
			}
		}

		report
	}

	/// Catch-up pass for the worker: re-drives creators stuck in `pending`
	/// or `deferred`, each under its own recorded genre and origin query.
	pub async fn reprocess_pending_ingestions(&self, limit: i64) -> Result<IngestReport> {
		let creators = creators::list_by_ingestion_statuses(
			&self.db.pool,
			&[STATUS_PENDING, STATUS_DEFERRED],
			limit,
		)
		.await?;
		let mut report = IngestReport::default();

		for creator in &creators {
			let profile = profile_from_creator(creator);
			let base_genre = creator.base_genre.clone().unwrap_or_default();
			let origin_query = creator.origin_query.clone().unwrap_or_default();

			report.processed += 1;

			match self.ingest_creator(&profile, &base_genre, &origin_query).await {
				Ok(IngestOutcome::Ingested) => report.ingested += 1,
				Ok(IngestOutcome::Skipped) => report.skipped += 1,
				Ok(IngestOutcome::Deferred) => report.deferred += 1,
				Ok(IngestOutcome::Failed) => report.failed += 1,
				Err(err) => {
					report.failed += 1;

					tracing::error!(
						error = %err,
						channel_id = %creator.channel_id,
						"Creator reprocessing errored."
					);
				},
			}
		}

		Ok(report)
	}

	async fn ingest_creator(
		&self,
		profile: &CreatorProfile,
		base_genre: &str,
		origin_query: &str,
	) -> Result<IngestOutcome> {
		let now = OffsetDateTime::now_utc();
		let platform = "youtube";
		let existing =
			creators::find_by_platform_and_channel(&self.db.pool, platform, &profile.channel_id)
				.await?;

		if let Some(creator) = &existing
			&& creator.profile_embedding.is_some()
			&& creator.ingestion_status == STATUS_COMPLETE
		{
			creators::touch_last_seen(&self.db.pool, platform, &profile.channel_id, now).await?;

			return Ok(IngestOutcome::Skipped);
		}

		let creator = match existing {
			Some(creator) => {
				creators::touch_last_seen(&self.db.pool, platform, &profile.channel_id, now)
					.await?;

				creator
			},
			None => {
				let upsert = creators::upsert_discovered(
					&self.db.pool,
					NewCreator {
						creator_id: uuid::Uuid::new_v4(),
						platform,
						channel_id: &profile.channel_id,
						display_name: &profile.display_name,
						description: Some(truncate_chars(&profile.bio, DESCRIPTION_MAX_CHARS))
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

				// A concurrent writer may have inserted the same identity;
				// that is "already seen", not a failure.
				if let Err(err) = upsert
					&& !err.is_unique_violation()
				{
					return Err(err.into());
				}

				creators::find_by_platform_and_channel(&self.db.pool, platform, &profile.channel_id)
					.await?
					.ok_or_else(|| crate::Error::Storage {
						message: "Creator vanished between upsert and readback.".to_string(),
					})?
			},
		};
		let decision = self.token_governor.check_budget(EMBEDDING_ESTIMATED_TOKENS, now);

		if !decision.is_allowed() {
			tracing::warn!(
				channel_id = %profile.channel_id,
				"Token budget gate closed; deferring ingestion."
			);
			creators::set_ingestion_status(&self.db.pool, creator.creator_id, STATUS_DEFERRED)
				.await?;

			return Ok(IngestOutcome::Deferred);
		}

		let embedding_text = build_embedding_text(
			&profile.display_name,
			&profile.bio,
			profile.subscribers,
			profile.country.as_deref(),
		);

		match self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, std::slice::from_ref(&embedding_text))
			.await
		{
			Ok(vectors) => {
				let Some(vector) = vectors.into_iter().next() else {
					creators::set_ingestion_status(&self.db.pool, creator.creator_id, STATUS_FAILED)
						.await?;

					return Ok(IngestOutcome::Failed);
				};

				self.token_governor.record_usage(EMBEDDING_ESTIMATED_TOKENS, now);

				let content_tags = tags::extract_content_tags(&profile.display_name, &profile.bio);

				creators::store_embedding(
					&self.db.pool,
					creator.creator_id,
					EmbeddingUpdate {
						profile_embedding: serde_json::json!(vector),
						embedding_model: &self.cfg.providers.embedding.model,
						embedding_created_at: now,
						compressed_bio: &truncate_chars(&embedding_text, COMPRESSED_BIO_MAX_CHARS),
						content_tags: serde_json::json!(content_tags),
					},
				)
				.await?;

				tracing::info!(channel = %profile.display_name, "Ingested creator.");

				Ok(IngestOutcome::Ingested)
			},
			Err(err) => {
				tracing::error!(
					error = %err,
					channel_id = %profile.channel_id,
					"Embedding call failed; marking ingestion failed."
				);
				creators::set_ingestion_status(&self.db.pool, creator.creator_id, STATUS_FAILED)
					.await?;

				Ok(IngestOutcome::Failed)
			},
		}
	}
}

/// Embedding input: name, truncated bio, a size label for large channels,
/// and the country.
fn build_embedding_text(
	display_name: &str,
	bio: &str,
	subscribers: i64,
	country: Option<&str>,
) -> String {
	let mut text = format!("{display_name}. ");

	text.push_str(&truncate_chars(bio, EMBEDDING_BIO_MAX_CHARS));
	text.push(' ');

	if subscribers > 1_000_000 {
		text.push_str("Major creator. ");
	} else if subscribers > 100_000 {
		text.push_str("Established creator. ");
	}

	if let Some(country) = country {
		text.push_str(&format!("Based in {country}. "));
	}

	text.trim().to_string()
}

fn truncate_chars(raw: &str, max_chars: usize) -> String {
	raw.chars().take(max_chars).collect()
}

fn profile_from_creator(creator: &Creator) -> CreatorProfile {
	CreatorProfile {
		channel_id: creator.channel_id.clone(),
		handle: None,
		display_name: creator.display_name.clone(),
		bio: creator.description.clone().unwrap_or_default(),
		image_url: creator.profile_image_url.clone().unwrap_or_default(),
		subscribers: 0,
		videos: 0,
		views: 0,
		country: creator.country.clone(),
		published_at: None,
		last_video_date: None,
		video_samples: Vec::new(),
	}
}
