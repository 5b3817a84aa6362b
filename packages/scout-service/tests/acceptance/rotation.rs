use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

use scout_service::Providers;

use super::{StubEmbedding, StubLlm, StubPlatform, channel};

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn quota_shaped_failures_rotate_to_the_next_credential() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping quota_shaped_failures_rotate_to_the_next_credential; set SCOUT_PG_DSN.");

		return;
	};
	// The first configured key ("key-a") is quota-rejected; the adapter must
	// retry on "key-b" and succeed without surfacing anything upstream.
	let mut platform = StubPlatform::new(vec![channel("UC1", "Anime Edits HQ", 250_000)]);

	platform.reject_key = Some("key-a".to_string());

	let search_calls = platform.search_calls.clone();
	let providers = Providers::new(
		Arc::new(StubLlm { calls: Arc::new(AtomicUsize::new(0)), lines: String::new() }),
		Arc::new(StubEmbedding { calls: Arc::new(AtomicUsize::new(0)), dimensions: 8 }),
		Arc::new(platform),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;
	let outcome = service
		.search_platform_channels(&["anime edits".to_string()], 50)
		.await
		.expect("Platform search failed.");

	assert_eq!(outcome.results.len(), 1);
	assert_eq!(outcome.results[0].1.len(), 1, "rotation must recover the query");
	assert!(outcome.quota_used >= 100);
	assert_eq!(search_calls.load(Ordering::SeqCst), 1, "only the good key reaches the provider");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn exhausting_every_credential_returns_empty_results() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping exhausting_every_credential_returns_empty_results; set SCOUT_PG_DSN.");

		return;
	};

	struct AlwaysQuotaRejected;
	impl scout_service::PlatformProvider for AlwaysQuotaRejected {
		fn search_channels<'a>(
			&'a self,
			_cfg: &'a scout_config::Youtube,
			_api_key: &'a str,
			_query: &'a str,
			_max_results: u32,
		) -> scout_service::BoxFuture<
			'a,
			scout_providers::Result<Vec<scout_providers::youtube::SearchHit>>,
		> {
			Box::pin(async move {
				Err(scout_providers::Error::Status {
					status: 403,
					body: r#"{"reason":"dailyLimitExceeded"}"#.to_string(),
				})
			})
		}

		fn list_channels<'a>(
			&'a self,
			_cfg: &'a scout_config::Youtube,
			_api_key: &'a str,
			_channel_ids: &'a [String],
		) -> scout_service::BoxFuture<
			'a,
			scout_providers::Result<Vec<scout_providers::youtube::ChannelDetail>>,
		> {
			Box::pin(async move {
				Err(scout_providers::Error::Status {
					status: 403,
					body: r#"{"reason":"dailyLimitExceeded"}"#.to_string(),
				})
			})
		}
	}

	let providers = Providers::new(
		Arc::new(StubLlm { calls: Arc::new(AtomicUsize::new(0)), lines: String::new() }),
		Arc::new(StubEmbedding { calls: Arc::new(AtomicUsize::new(0)), dimensions: 8 }),
		Arc::new(AlwaysQuotaRejected),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;
	let outcome = service
		.search_platform_channels(
			&["anime edits".to_string(), "amv".to_string()],
			50,
		)
		.await
		.expect("Exhausted credentials must not error.");

	// The first query exhausts the full credential cycle and aborts the
	// remaining work.
	assert!(outcome.results.iter().all(|(_, profiles)| profiles.is_empty()));
	assert_eq!(outcome.quota_used, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn empty_query_list_spends_nothing() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping empty_query_list_spends_nothing; set SCOUT_PG_DSN.");

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Providers::new(
			Arc::new(StubLlm { calls: Arc::new(AtomicUsize::new(0)), lines: String::new() }),
			Arc::new(StubEmbedding { calls: Arc::new(AtomicUsize::new(0)), dimensions: 8 }),
			Arc::new(StubPlatform::new(Vec::new())),
		),
	)
	.await;
	let outcome =
		service.search_platform_channels(&[], 50).await.expect("Empty search failed.");

	assert!(outcome.results.is_empty());
	assert_eq!(outcome.quota_used, 0);
	assert_eq!(
		service.quota_governor.stats(time::OffsetDateTime::now_utc()).units_used,
		0
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
