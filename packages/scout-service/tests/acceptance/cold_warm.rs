use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

use scout_service::{Providers, SearchRequest};

use super::{StubEmbedding, StubLlm, StubPlatform, channel};

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn cold_search_spends_warm_search_is_free() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping cold_search_spends_warm_search_is_free; set SCOUT_PG_DSN.");

		return;
	};
	let llm_calls = Arc::new(AtomicUsize::new(0));
	let llm = StubLlm {
		calls: llm_calls.clone(),
		lines: "anime compilation\nbest amv edits".to_string(),
	};
	let platform = StubPlatform::new(vec![
		channel("UC1", "Anime Edits HQ", 250_000),
		channel("UC2", "AMV Central", 40_000),
		channel("UC3", "Edit Lab", 3_000),
	]);
	let search_calls = platform.search_calls.clone();
	let providers = Providers::new(
		Arc::new(llm),
		Arc::new(StubEmbedding { calls: Arc::new(AtomicUsize::new(0)), dimensions: 8 }),
		Arc::new(platform),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;
	let request = SearchRequest {
		genre: "anime edits".to_string(),
		platform: Some("youtube".to_string()),
		page: Some(0),
		page_size: Some(10),
		filters: None,
	};
	let first = service.perform_search(request.clone()).await.expect("First search failed.");

	assert!(!first.from_cache);
	assert!(first.external_units_used >= 100, "cold search must spend platform units");
	assert_eq!(llm_calls.load(Ordering::SeqCst), 1, "cold search must make one LLM call");
	assert!(first.session_id.is_some());
	assert_eq!(first.total_results, 3);

	let query_info = first.query_info.as_ref().expect("cold search reports query info");

	assert_eq!(query_info.normalized, "anime edits");
	assert_eq!(query_info.queries[0], "anime edits");
	assert_eq!(query_info.queries[1], "anime edits official");
	assert_eq!(query_info.queries[2], "anime edits channel");

	let spent_after_first = service.quota_governor.stats(time::OffsetDateTime::now_utc());
	let searches_after_first = search_calls.load(Ordering::SeqCst);
	let second = service.perform_search(request).await.expect("Second search failed.");

	assert!(second.from_cache);
	assert_eq!(second.external_units_used, 0, "warm search must be free");
	assert_eq!(llm_calls.load(Ordering::SeqCst), 1, "warm search must not call the LLM");
	assert_eq!(
		search_calls.load(Ordering::SeqCst),
		searches_after_first,
		"warm search must not call the platform"
	);
	assert_eq!(second.session_id, first.session_id);

	let first_order: Vec<&str> =
		first.results.iter().map(|item| item.channel_id.as_str()).collect();
	let second_order: Vec<&str> =
		second.results.iter().map(|item| item.channel_id.as_str()).collect();

	assert_eq!(first_order, second_order, "warm page must reproduce the cold rank order");

	let spent_after_second = service.quota_governor.stats(time::OffsetDateTime::now_utc());

	assert_eq!(
		spent_after_first.units_used, spent_after_second.units_used,
		"the warm path must not touch the quota governor"
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn ranks_are_dense_and_ordered_by_final_score() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping ranks_are_dense_and_ordered_by_final_score; set SCOUT_PG_DSN.");

		return;
	};
	let providers = Providers::new(
		Arc::new(StubLlm { calls: Arc::new(AtomicUsize::new(0)), lines: String::new() }),
		Arc::new(StubEmbedding { calls: Arc::new(AtomicUsize::new(0)), dimensions: 8 }),
		Arc::new(StubPlatform::new(vec![
			channel("UC1", "Anime Edits HQ", 250_000),
			channel("UC2", "AMV Central", 40_000),
			channel("UC3", "Edit Lab", 3_000),
			channel("UC4", "Cooking Corner", 90_000),
		])),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;
	let response = service
		.perform_search(SearchRequest {
			genre: "anime edits".to_string(),
			platform: None,
			page: Some(0),
			page_size: Some(50),
			filters: None,
		})
		.await
		.expect("Search failed.");
	let ranks: Vec<i32> = response.results.iter().map(|item| item.rank).collect();
	let expected: Vec<i32> = (1..=response.results.len() as i32).collect();

	assert_eq!(ranks, expected, "ranks must be dense 1..N");

	for window in response.results.windows(2) {
		assert!(
			window[0].score >= window[1].score,
			"default order must be non-increasing in final score"
		);
	}

	for item in &response.results {
		let recomputed = 0.35 * item.genre_relevance
			+ 0.20 * item.audience_fit
			+ 0.20 * item.engagement_quality
			+ 0.15 * item.activity_consistency
			+ 0.10 * item.freshness;

		assert!(
			(item.score - recomputed.clamp(0.0, 1.0)).abs() <= 1e-9,
			"stored final score must reproduce the weighted sum"
		);

		let competitiveness = 0.40 * item.audience_fit
			+ 0.35 * item.engagement_quality
			+ 0.25 * item.activity_consistency;

		assert!(
			(item.competitiveness_score - competitiveness.clamp(0.0, 1.0)).abs() <= 1e-9,
			"stored competitiveness must reproduce the weighted sum"
		);
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
