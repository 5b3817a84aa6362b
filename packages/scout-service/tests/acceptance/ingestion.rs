use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

use time::OffsetDateTime;

use scout_service::{CreatorProfile, Providers};

use super::{FailingEmbedding, StubEmbedding, StubLlm, StubPlatform};

fn profile(channel_id: &str, name: &str, subscribers: i64) -> CreatorProfile {
	CreatorProfile {
		channel_id: channel_id.to_string(),
		handle: None,
		display_name: name.to_string(),
		bio: "daily gameplay and tech reviews".to_string(),
		image_url: format!("http://img/{channel_id}.jpg"),
		subscribers,
		videos: 100,
		views: subscribers * 25,
		country: Some("US".to_string()),
		published_at: None,
		last_video_date: None,
		video_samples: Vec::new(),
	}
}

async fn fetch_status(pool: &sqlx::PgPool, channel_id: &str) -> (String, bool) {
	let (status, has_embedding): (String, bool) = sqlx::query_as(
		"\
SELECT ingestion_status, profile_embedding IS NOT NULL
FROM creators
WHERE platform = 'youtube' AND channel_id = $1",
	)
	.bind(channel_id)
	.fetch_one(pool)
	.await
	.expect("Failed to read creator status.");

	(status, has_embedding)
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn ingestion_embeds_once_and_skips_complete_creators() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping ingestion_embeds_once_and_skips_complete_creators; set SCOUT_PG_DSN.");

		return;
	};
	let embed_calls = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(StubLlm { calls: Arc::new(AtomicUsize::new(0)), lines: String::new() }),
		Arc::new(StubEmbedding { calls: embed_calls.clone(), dimensions: 8 }),
		Arc::new(StubPlatform::new(Vec::new())),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;
	let batch = vec![("gaming".to_string(), profile("UC1", "Gaming Central", 2_000_000))];
	let report = service.ingest_batch(&batch, "gaming").await;

	assert_eq!(report.processed, 1);
	assert_eq!(report.ingested, 1);
	assert_eq!(embed_calls.load(Ordering::SeqCst), 1);

	let (status, has_embedding) = fetch_status(&service.db.pool, "UC1").await;

	assert_eq!(status, "complete");
	assert!(has_embedding);

	// A second pass touches last_seen_at only.
	let report = service.ingest_batch(&batch, "gaming").await;

	assert_eq!(report.skipped, 1);
	assert_eq!(embed_calls.load(Ordering::SeqCst), 1, "complete creators are not re-embedded");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn exhausted_budget_defers_and_the_worker_catches_up() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping exhausted_budget_defers_and_the_worker_catches_up; set SCOUT_PG_DSN.");

		return;
	};
	let embed_calls = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(StubLlm { calls: Arc::new(AtomicUsize::new(0)), lines: String::new() }),
		Arc::new(StubEmbedding { calls: embed_calls.clone(), dimensions: 8 }),
		Arc::new(StubPlatform::new(Vec::new())),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;

	// Past the fallback threshold nothing but ALLOW proceeds.
	service.token_governor.record_usage(950_000, OffsetDateTime::now_utc());

	let batch = vec![("gaming".to_string(), profile("UC2", "Deferred Channel", 5_000))];
	let report = service.ingest_batch(&batch, "gaming").await;

	assert_eq!(report.deferred, 1);
	assert_eq!(embed_calls.load(Ordering::SeqCst), 0);

	let (status, has_embedding) = fetch_status(&service.db.pool, "UC2").await;

	assert_eq!(status, "deferred");
	assert!(!has_embedding);

	// Next day the worker's catch-up pass completes the ingestion.
	let tomorrow = OffsetDateTime::now_utc() + time::Duration::days(1);

	service.token_governor.record_usage(0, tomorrow);

	let report = service.reprocess_pending_ingestions(10).await.expect("Reprocess failed.");

	assert_eq!(report.ingested, 1);
	assert_eq!(embed_calls.load(Ordering::SeqCst), 1);

	let (status, has_embedding) = fetch_status(&service.db.pool, "UC2").await;

	assert_eq!(status, "complete");
	assert!(has_embedding);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn embedding_failure_marks_the_creator_failed() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping embedding_failure_marks_the_creator_failed; set SCOUT_PG_DSN.");

		return;
	};
	let providers = Providers::new(
		Arc::new(StubLlm { calls: Arc::new(AtomicUsize::new(0)), lines: String::new() }),
		Arc::new(FailingEmbedding),
		Arc::new(StubPlatform::new(Vec::new())),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;
	let batch = vec![("gaming".to_string(), profile("UC3", "Broken Channel", 5_000))];
	let report = service.ingest_batch(&batch, "gaming").await;

	assert_eq!(report.failed, 1);

	let (status, has_embedding) = fetch_status(&service.db.pool, "UC3").await;

	assert_eq!(status, "failed");
	assert!(!has_embedding);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
