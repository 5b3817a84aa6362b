use std::sync::{Arc, atomic::AtomicUsize};

use scout_domain::{
	ranking::ScoredCreator,
	scoring::CreatorScore,
	sort::SortKey,
};
use scout_service::{FilterCriteria, Providers, SessionView};

use super::{StubEmbedding, StubLlm, StubPlatform};

fn creator(
	index: usize,
	audience_fit: f64,
	engagement_quality: f64,
	subscribers: i64,
	final_score: f64,
) -> ScoredCreator {
	ScoredCreator {
		channel_id: format!("UC{index}"),
		channel_name: format!("Creator {index}"),
		description: String::new(),
		image_url: String::new(),
		subscriber_count: subscribers,
		last_video_date: None,
		score: CreatorScore {
			genre_relevance: 0.5,
			audience_fit,
			engagement_quality,
			activity_consistency: 0.5,
			freshness: 0.5,
			final_score,
		},
		labels: vec!["Good match".to_string()],
	}
}

fn seed_creators() -> Vec<ScoredCreator> {
	vec![
		creator(1, 0.15, 0.85, 10_000, 0.9),
		creator(2, 0.45, 0.55, 20_000, 0.8),
		creator(3, 0.75, 0.25, 30_000, 0.7),
		creator(4, 0.10, 0.20, 10_000, 0.6),
		creator(5, 0.80, 0.90, 50_000, 0.5),
	]
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
async fn multi_select_filters_and_across_categories() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping multi_select_filters_and_across_categories; set SCOUT_PG_DSN.");

		return;
	};
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), stub_providers())
			.await;
	let session = service
		.create_session("anime edits", "youtube", &seed_creators(), 505)
		.await
		.expect("Materialization failed.");
	let filters = FilterCriteria {
		audience: vec!["small".to_string(), "large".to_string()],
		engagement: vec!["high".to_string()],
		..Default::default()
	};
	let view = service
		.paginate_filtered(session.session_id, 0, 10, SortKey::FinalScore, &filters)
		.await
		.expect("Filtered pagination failed.");
	let SessionView::Page(page) = view else {
		panic!("Expected a page for a live session.");
	};
	let ranks: Vec<i32> = page.results.iter().map(|item| item.rank).collect();

	assert_eq!(ranks, vec![1, 5], "audience in {{small,large}} AND engagement high");
	assert_eq!(page.total_results, 2);
	assert_eq!(page.active_filters, 2);

	// Applying the same filter twice yields an identical page.
	let SessionView::Page(again) = service
		.paginate_filtered(session.session_id, 0, 10, SortKey::FinalScore, &filters)
		.await
		.expect("Repeat filtered pagination failed.")
	else {
		panic!("Expected a page on the repeat read.");
	};
	let repeat_ranks: Vec<i32> = again.results.iter().map(|item| item.rank).collect();

	assert_eq!(ranks, repeat_ranks);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn subscriber_sort_uses_raw_counts_with_rank_tiebreak() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping subscriber_sort_uses_raw_counts_with_rank_tiebreak; set SCOUT_PG_DSN.");

		return;
	};
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), stub_providers())
			.await;
	let session = service
		.create_session("anime edits", "youtube", &seed_creators(), 505)
		.await
		.expect("Materialization failed.");
	let before = service.quota_governor.stats(time::OffsetDateTime::now_utc());
	let view = service
		.paginate(session.session_id, 0, 10, SortKey::Subscribers)
		.await
		.expect("Sorted pagination failed.");
	let SessionView::Page(page) = view else {
		panic!("Expected a page for a live session.");
	};
	let ranks: Vec<i32> = page.results.iter().map(|item| item.rank).collect();

	assert_eq!(ranks, vec![5, 3, 2, 1, 4], "counts 50K,30K,20K then the 10K tie by rank");

	// Pagination must never touch a governor counter.
	let after = service.quota_governor.stats(time::OffsetDateTime::now_utc());

	assert_eq!(before.units_used, after.units_used);

	let view = service
		.paginate(session.session_id, 0, 10, SortKey::parse("not-a-key"))
		.await
		.expect("Default-sorted pagination failed.");
	let SessionView::Page(page) = view else {
		panic!("Expected a page for a live session.");
	};
	let ranks: Vec<i32> = page.results.iter().map(|item| item.rank).collect();

	assert_eq!(ranks, vec![1, 2, 3, 4, 5], "invalid sort keys fall back to final score");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
