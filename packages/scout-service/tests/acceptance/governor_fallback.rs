use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

use time::OffsetDateTime;

use scout_service::Providers;

use super::{StubEmbedding, StubLlm, StubPlatform};

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn high_token_usage_forces_the_exact_deterministic_fallback() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping high_token_usage_forces_the_exact_deterministic_fallback; set SCOUT_PG_DSN.");

		return;
	};
	let llm_calls = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(StubLlm { calls: llm_calls.clone(), lines: "ignored".to_string() }),
		Arc::new(StubEmbedding { calls: Arc::new(AtomicUsize::new(0)), dimensions: 8 }),
		Arc::new(StubPlatform::new(Vec::new())),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;

	// Push usage to 95% of the default 1M daily budget.
	service.token_governor.record_usage(950_000, OffsetDateTime::now_utc());

	let generated = service.generate_queries("gaming").await.expect("Generation failed.");

	assert_eq!(
		generated.queries,
		vec![
			"gaming",
			"gaming official",
			"gaming channel",
			"gaming youtuber",
			"gaming creator",
			"gaming best",
		]
	);
	assert_eq!(generated.token_cost, 0);
	assert_eq!(llm_calls.load(Ordering::SeqCst), 0, "the fallback path must not call the LLM");

	// The fallback result is cached: a repeat read hits the cache.
	let repeat = service.generate_queries("gaming").await.expect("Repeat generation failed.");

	assert!(repeat.from_cache);
	assert_eq!(repeat.queries, generated.queries);
	assert_eq!(llm_calls.load(Ordering::SeqCst), 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn llm_failure_falls_back_without_surfacing_an_error() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping llm_failure_falls_back_without_surfacing_an_error; set SCOUT_PG_DSN.");

		return;
	};

	struct FailingLlm;
	impl scout_service::LlmProvider for FailingLlm {
		fn complete<'a>(
			&'a self,
			_cfg: &'a scout_config::LlmProviderConfig,
			_prompt: &'a str,
		) -> scout_service::BoxFuture<'a, scout_service::Result<scout_providers::llm::ChatCompletion>>
		{
			Box::pin(async move {
				Err(scout_service::Error::Provider { message: "upstream 500".to_string() })
			})
		}
	}

	let providers = Providers::new(
		Arc::new(FailingLlm),
		Arc::new(StubEmbedding { calls: Arc::new(AtomicUsize::new(0)), dimensions: 8 }),
		Arc::new(StubPlatform::new(Vec::new())),
	);
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), providers).await;
	let generated = service.generate_queries("gaming").await.expect("Generation must not fail.");

	assert!(!generated.queries.is_empty(), "every caller sees a non-empty query list");
	assert_eq!(generated.queries[0], "gaming");
	assert_eq!(generated.token_cost, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
