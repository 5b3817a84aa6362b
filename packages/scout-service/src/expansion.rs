//! Query expansion: turn a genre phrase into platform search queries.
//!
//! Resolution order: cache, then (budget permitting) the LLM, then the
//! deterministic fallback. Every path returns a non-empty query list; no LLM
//! failure ever propagates to the caller.

use time::OffsetDateTime;

use crate::{Result, ScoutService, governor::BudgetAction};
use scout_domain::normalize;

const ESTIMATED_TOKENS_PER_GENERATION: i64 = 300;

#[derive(Clone, Debug)]
pub struct GeneratedQueries {
	pub normalized: String,
	pub queries: Vec<String>,
	pub count: usize,
	pub token_cost: i32,
	pub from_cache: bool,
}

impl ScoutService {
	pub async fn generate_queries(&self, genre: &str) -> Result<GeneratedQueries> {
		let normalized = effective_normalized(genre);

		if let Some(cached) = self.expansion_cache_get(genre).await? {
			tracing::debug!(genre = %normalized, "Expansion cache hit; zero tokens spent.");

			return Ok(GeneratedQueries {
				normalized,
				count: cached.queries.len(),
				queries: cached.queries,
				token_cost: 0,
				from_cache: true,
			});
		}

		let now = OffsetDateTime::now_utc();
		let decision = self.token_governor.check_budget(ESTIMATED_TOKENS_PER_GENERATION, now);

		if decision.action != BudgetAction::Allow {
			tracing::info!(
				action = ?decision.action,
				genre = %normalized,
				"Token budget gate closed; using deterministic fallback."
			);

			return self.fallback_queries(genre, normalized).await;
		}

		match self.providers.llm.complete(&self.cfg.providers.llm, &expansion_prompt(&normalized)).await
		{
			Ok(completion) => {
				let llm_queries = parse_query_lines(&completion.text);
				let queries = with_priority_variants(&normalized, llm_queries);
				let tokens =
					completion.total_tokens.unwrap_or(ESTIMATED_TOKENS_PER_GENERATION);

				self.token_governor.record_usage(tokens, now);

				if let Err(err) = self.expansion_cache_put(genre, &queries, tokens as i32).await {
					tracing::warn!(error = %err, "Failed to cache generated queries.");
				}

				Ok(GeneratedQueries {
					normalized,
					count: queries.len(),
					queries,
					token_cost: tokens as i32,
					from_cache: false,
				})
			},
			Err(err) => {
				tracing::warn!(error = %err, genre = %normalized, "LLM expansion failed; falling back.");

				self.fallback_queries(genre, normalized).await
			},
		}
	}

	async fn fallback_queries(&self, raw: &str, normalized: String) -> Result<GeneratedQueries> {
		let queries = fallback_query_set(&normalized);

		if let Err(err) = self.expansion_cache_put(raw, &queries, 0).await {
			tracing::warn!(error = %err, "Failed to cache fallback queries.");
		}

		Ok(GeneratedQueries {
			normalized,
			count: queries.len(),
			queries,
			token_cost: 0,
			from_cache: false,
		})
	}
}

/// The digest normal form sorts tokens, which is right for cache keys but
/// occasionally empty for stopword-only input; fall back to a plain trim.
fn effective_normalized(genre: &str) -> String {
	let normalized = normalize::normalize(genre);

	if normalized.is_empty() { genre.trim().to_lowercase() } else { normalized }
}

fn expansion_prompt(normalized: &str) -> String {
	format!(
		"Generate 6-8 short, high-signal YouTube search queries for discovering channels in the \
		 genre: '{normalized}'. Queries should be concise (2-4 words). Return ONLY a list of \
		 queries, one per line, no numbering, no preamble."
	)
}

pub(crate) fn fallback_query_set(normalized: &str) -> Vec<String> {
	vec![
		normalized.to_string(),
		format!("{normalized} official"),
		format!("{normalized} channel"),
		format!("{normalized} youtuber"),
		format!("{normalized} creator"),
		format!("{normalized} best"),
	]
}

/// Splits raw completion text into queries: one per line, leading list
/// markers stripped, case-insensitive dedupe preserving first occurrence.
pub(crate) fn parse_query_lines(text: &str) -> Vec<String> {
	let mut queries = Vec::new();
	let mut seen = Vec::new();

	for line in text.lines() {
		let stripped = strip_list_marker(line.trim());

		if stripped.is_empty() {
			continue;
		}

		let lowered = stripped.to_lowercase();

		if seen.contains(&lowered) {
			continue;
		}

		seen.push(lowered);
		queries.push(stripped.to_string());
	}

	queries
}

fn strip_list_marker(line: &str) -> &str {
	line.trim_start_matches(|ch: char| ch == '-' || ch == '*' || ch == '.' || ch.is_ascii_digit())
		.trim_start()
}

/// Priority variants always lead; LLM queries follow unless already present
/// case-insensitively.
pub(crate) fn with_priority_variants(normalized: &str, llm_queries: Vec<String>) -> Vec<String> {
	let mut queries = vec![
		normalized.to_string(),
		format!("{normalized} official"),
		format!("{normalized} channel"),
	];

	for query in llm_queries {
		if !queries.iter().any(|existing| existing.eq_ignore_ascii_case(&query)) {
			queries.push(query);
		}
	}

	queries
}
