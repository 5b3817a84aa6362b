use std::sync::{Arc, atomic::AtomicUsize};

use time::{Duration, OffsetDateTime};

use scout_domain::{ranking::ScoredCreator, scoring::CreatorScore, sort::SortKey};
use scout_service::{Providers, SessionView};

use super::{StubEmbedding, StubLlm, StubPlatform};

fn creators(count: usize) -> Vec<ScoredCreator> {
	(1..=count)
		.map(|index| ScoredCreator {
			channel_id: format!("UC{index}"),
			channel_name: format!("Creator {index}"),
			description: String::new(),
			image_url: String::new(),
			subscriber_count: 1_000,
			last_video_date: None,
			score: CreatorScore {
				genre_relevance: 0.5,
				audience_fit: 0.5,
				engagement_quality: 0.5,
				activity_consistency: 0.5,
				freshness: 0.5,
				final_score: 1.0 - index as f64 * 0.1,
			},
			labels: Vec::new(),
		})
		.collect()
}

fn stub_providers() -> Providers {
	Providers::new(
		Arc::new(StubLlm { calls: Arc::new(AtomicUsize::new(0)), lines: String::new() }),
		Arc::new(StubEmbedding { calls: Arc::new(AtomicUsize::new(0)), dimensions: 8 }),
		Arc::new(StubPlatform::new(Vec::new())),
	)
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn expired_sessions_return_a_marker_and_get_swept() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping expired_sessions_return_a_marker_and_get_swept; set SCOUT_PG_DSN.");

		return;
	};
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), stub_providers())
			.await;
	let session = service
		.create_session("anime edits", "youtube", &creators(2), 101)
		.await
		.expect("Materialization failed.");
	let expired_at = OffsetDateTime::now_utc() - Duration::seconds(1);

	sqlx::query("UPDATE search_sessions SET expires_at = $1 WHERE session_id = $2")
		.bind(expired_at)
		.bind(session.session_id)
		.execute(&service.db.pool)
		.await
		.expect("Failed to force expiry.");

	let view = service
		.paginate(session.session_id, 0, 10, SortKey::FinalScore)
		.await
		.expect("Pagination failed.");

	assert!(
		matches!(view, SessionView::Expired { session_id } if session_id == session.session_id),
		"an expired session must yield the expired marker"
	);

	// The expired read must not have revived the session.
	let (stored_expiry,): (OffsetDateTime,) =
		sqlx::query_as("SELECT expires_at FROM search_sessions WHERE session_id = $1")
			.bind(session.session_id)
			.fetch_one(&service.db.pool)
			.await
			.expect("Failed to read expiry.");

	assert!(stored_expiry <= OffsetDateTime::now_utc());

	let swept = service.sweep_expired_sessions().await.expect("Sweep failed.");

	assert_eq!(swept, 1);

	let view = service
		.paginate(session.session_id, 0, 10, SortKey::FinalScore)
		.await
		.expect("Post-sweep pagination failed.");

	assert!(matches!(view, SessionView::Missing));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn sliding_expiration_extends_on_read_hit() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping sliding_expiration_extends_on_read_hit; set SCOUT_PG_DSN.");

		return;
	};
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), stub_providers())
			.await;
	let session = service
		.create_session("anime edits", "youtube", &creators(1), 101)
		.await
		.expect("Materialization failed.");
	// Shrink the remaining lifetime so the sliding touch is observable.
	let near_expiry = OffsetDateTime::now_utc() + Duration::minutes(1);

	sqlx::query("UPDATE search_sessions SET expires_at = $1 WHERE session_id = $2")
		.bind(near_expiry)
		.bind(session.session_id)
		.execute(&service.db.pool)
		.await
		.expect("Failed to shrink expiry.");

	let found = service
		.find_valid_session("anime edits", "youtube")
		.await
		.expect("Lookup failed.")
		.expect("Session must be found while valid.");

	assert!(
		found.expires_at > near_expiry,
		"a read hit must advance expires_at by the full TTL"
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn fixed_expiration_leaves_expiry_untouched() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping fixed_expiration_leaves_expiry_untouched; set SCOUT_PG_DSN.");

		return;
	};
	let mut cfg = super::test_config(test_db.dsn().to_string());

	cfg.session.sliding_expiration = false;

	let service = super::build_service(cfg, stub_providers()).await;
	let session = service
		.create_session("anime edits", "youtube", &creators(1), 101)
		.await
		.expect("Materialization failed.");
	let found = service
		.find_valid_session("anime edits", "youtube")
		.await
		.expect("Lookup failed.")
		.expect("Session must be found while valid.");

	assert_eq!(found.expires_at, session.expires_at);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn rematerialization_updates_in_place_and_the_later_writer_wins() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping rematerialization_updates_in_place_and_the_later_writer_wins; set SCOUT_PG_DSN."
		);

		return;
	};
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), stub_providers())
			.await;
	let first = service
		.create_session("anime edits", "youtube", &creators(5), 505)
		.await
		.expect("First materialization failed.");
	let second = service
		.create_session("anime edits", "youtube", &creators(3), 303)
		.await
		.expect("Second materialization failed.");

	assert_eq!(first.session_id, second.session_id, "the session row is reused");
	assert_eq!(second.total_results, 3, "the later writer's results win");
	assert_eq!(second.external_units_used, 808, "external units accumulate across executions");

	let (row_count,): (i64,) =
		sqlx::query_as("SELECT COUNT(*) FROM search_sessions WHERE query_digest = $1")
			.bind(&second.query_digest)
			.fetch_one(&service.db.pool)
			.await
			.expect("Failed to count sessions.");

	assert_eq!(row_count, 1, "exactly one session row per (digest, platform)");

	let view = service
		.paginate(second.session_id, 0, 10, SortKey::FinalScore)
		.await
		.expect("Pagination failed.");
	let SessionView::Page(page) = view else {
		panic!("Expected a page for a live session.");
	};
	let ranks: Vec<i32> = page.results.iter().map(|item| item.rank).collect();

	assert_eq!(ranks, vec![1, 2, 3], "old results are fully replaced with dense ranks");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
