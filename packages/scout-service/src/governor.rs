//! Daily spend governors: one over LLM tokens, one over platform quota
//! units. Both keep a lock-free usage counter and reset it at most once per
//! calendar day via a single compare-exchange on the stored epoch day, so
//! two racers at the boundary cannot double-reset.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;
use time::OffsetDateTime;

pub const SEARCH_LIST_COST: i64 = 100;
pub const CHANNELS_LIST_COST_PER_CALL: i64 = 1;
pub const CHANNELS_LIST_BATCH_SIZE: i64 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetAction {
	Allow,
	EmbeddingsOnly,
	FallbackOnly,
	Downgrade,
	Reject,
}

#[derive(Clone, Copy, Debug)]
pub struct BudgetDecision {
	pub action: BudgetAction,
	pub tokens_used: i64,
	pub daily_budget: i64,
}
impl BudgetDecision {
	pub fn is_allowed(&self) -> bool {
		self.action == BudgetAction::Allow
	}
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats {
	pub tokens_used: i64,
	pub daily_budget: i64,
	pub usage_ratio: f64,
	pub remaining_budget: i64,
	pub epoch_day: i64,
}

pub struct TokenGovernor {
	daily_budget: i64,
	per_request_budget: i64,
	fallback_threshold: f64,
	tokens_used: AtomicI64,
	current_day: AtomicI64,
}
impl TokenGovernor {
	pub fn new(cfg: &scout_config::LlmBudget, now: OffsetDateTime) -> Self {
		Self {
			daily_budget: cfg.daily_token_budget,
			per_request_budget: cfg.per_request_budget,
			fallback_threshold: cfg.fallback_threshold,
			tokens_used: AtomicI64::new(0),
			current_day: AtomicI64::new(epoch_day(now)),
		}
	}

	pub fn check_budget(&self, estimated: i64, now: OffsetDateTime) -> BudgetDecision {
		self.reset_if_new_day(now);

		let used = self.tokens_used.load(Ordering::Relaxed);
		let ratio = used as f64 / self.daily_budget as f64;
		let action = if estimated > self.per_request_budget {
			BudgetAction::Downgrade
		} else if used + estimated > self.daily_budget {
			BudgetAction::Reject
		} else if ratio >= self.fallback_threshold {
			BudgetAction::FallbackOnly
		} else if ratio >= 0.5 {
			BudgetAction::EmbeddingsOnly
		} else {
			BudgetAction::Allow
		};

		BudgetDecision { action, tokens_used: used, daily_budget: self.daily_budget }
	}

	/// Rejected requests never call this, so there is nothing to roll back.
	pub fn record_usage(&self, tokens: i64, now: OffsetDateTime) {
		self.reset_if_new_day(now);
		self.tokens_used.fetch_add(tokens, Ordering::Relaxed);
	}

	pub fn stats(&self, now: OffsetDateTime) -> TokenStats {
		self.reset_if_new_day(now);

		let used = self.tokens_used.load(Ordering::Relaxed);

		TokenStats {
			tokens_used: used,
			daily_budget: self.daily_budget,
			usage_ratio: used as f64 / self.daily_budget as f64,
			remaining_budget: self.daily_budget - used,
			epoch_day: self.current_day.load(Ordering::Relaxed),
		}
	}

	fn reset_if_new_day(&self, now: OffsetDateTime) {
		let today = epoch_day(now);
		let stored = self.current_day.load(Ordering::Relaxed);

		if stored != today
			&& self
				.current_day
				.compare_exchange(stored, today, Ordering::SeqCst, Ordering::Relaxed)
				.is_ok()
		{
			self.tokens_used.swap(0, Ordering::SeqCst);
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaAction {
	Allow,
	ReduceQueries,
	ReduceResults,
	Reject,
}

#[derive(Clone, Copy, Debug)]
pub struct QuotaDecision {
	pub action: QuotaAction,
	pub units_used: i64,
	pub daily_quota: i64,
}
impl QuotaDecision {
	pub fn is_allowed(&self) -> bool {
		self.action != QuotaAction::Reject
	}

	pub fn max_queries(&self) -> usize {
		match self.action {
			QuotaAction::Allow => 5,
			QuotaAction::ReduceQueries => 3,
			QuotaAction::ReduceResults => 2,
			QuotaAction::Reject => 0,
		}
	}

	pub fn max_results(&self) -> u32 {
		match self.action {
			QuotaAction::Allow | QuotaAction::ReduceQueries => 50,
			QuotaAction::ReduceResults => 20,
			QuotaAction::Reject => 0,
		}
	}
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStats {
	pub units_used: i64,
	pub daily_quota: i64,
	pub usage_ratio: f64,
	pub remaining_units: i64,
	pub epoch_day: i64,
}

pub struct QuotaGovernor {
	daily_quota: i64,
	downgrade_threshold: f64,
	units_used: AtomicI64,
	current_day: AtomicI64,
}
impl QuotaGovernor {
	pub fn new(cfg: &scout_config::Youtube, now: OffsetDateTime) -> Self {
		Self {
			daily_quota: cfg.daily_quota,
			downgrade_threshold: cfg.downgrade_threshold,
			units_used: AtomicI64::new(0),
			current_day: AtomicI64::new(epoch_day(now)),
		}
	}

	/// `search.list` per query plus one batched `channels.list` per 50
	/// worst-case channels.
	pub fn estimate_cost(query_count: i64, max_results_per_query: i64) -> i64 {
		let search_cost = query_count * SEARCH_LIST_COST;
		let total_channels = query_count * max_results_per_query;
		let channel_batches = (total_channels + CHANNELS_LIST_BATCH_SIZE - 1) / CHANNELS_LIST_BATCH_SIZE;

		search_cost + channel_batches * CHANNELS_LIST_COST_PER_CALL
	}

	pub fn check_quota(&self, estimated: i64, now: OffsetDateTime) -> QuotaDecision {
		self.reset_if_new_day(now);

		let used = self.units_used.load(Ordering::Relaxed);
		let ratio = used as f64 / self.daily_quota as f64;
		let action = if used + estimated > self.daily_quota {
			QuotaAction::Reject
		} else if ratio >= 0.9 {
			QuotaAction::ReduceResults
		} else if ratio >= self.downgrade_threshold {
			QuotaAction::ReduceQueries
		} else {
			QuotaAction::Allow
		};

		QuotaDecision { action, units_used: used, daily_quota: self.daily_quota }
	}

	pub fn record_usage(&self, units: i64, now: OffsetDateTime) {
		self.reset_if_new_day(now);
		self.units_used.fetch_add(units, Ordering::Relaxed);
	}

	pub fn stats(&self, now: OffsetDateTime) -> QuotaStats {
		self.reset_if_new_day(now);

		let used = self.units_used.load(Ordering::Relaxed);

		QuotaStats {
			units_used: used,
			daily_quota: self.daily_quota,
			usage_ratio: used as f64 / self.daily_quota as f64,
			remaining_units: self.daily_quota - used,
			epoch_day: self.current_day.load(Ordering::Relaxed),
		}
	}

	fn reset_if_new_day(&self, now: OffsetDateTime) {
		let today = epoch_day(now);
		let stored = self.current_day.load(Ordering::Relaxed);

		if stored != today
			&& self
				.current_day
				.compare_exchange(stored, today, Ordering::SeqCst, Ordering::Relaxed)
				.is_ok()
		{
			self.units_used.swap(0, Ordering::SeqCst);
		}
	}
}

fn epoch_day(now: OffsetDateTime) -> i64 {
	now.date().to_julian_day() as i64
}

#[cfg(test)]
mod tests {
	use time::Duration;

	use super::*;

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_750_000_000).expect("timestamp")
	}

	fn token_governor(daily: i64, per_request: i64) -> TokenGovernor {
		TokenGovernor::new(
			&scout_config::LlmBudget {
				daily_token_budget: daily,
				per_request_budget: per_request,
				fallback_threshold: 0.9,
			},
			now(),
		)
	}

	fn quota_governor(daily: i64) -> QuotaGovernor {
		QuotaGovernor::new(
			&scout_config::Youtube {
				api_base: String::new(),
				api_keys: vec!["k".to_string()],
				daily_quota: daily,
				downgrade_threshold: 0.8,
				max_queries_per_search: 5,
				max_results_per_query: 50,
				timeout_ms: 1_000,
			},
			now(),
		)
	}

	#[test]
	fn token_tiers_in_order() {
		let governor = token_governor(1_000, 200);

		assert_eq!(governor.check_budget(100, now()).action, BudgetAction::Allow);

		governor.record_usage(500, now());

		assert_eq!(governor.check_budget(100, now()).action, BudgetAction::EmbeddingsOnly);

		governor.record_usage(400, now());

		assert_eq!(governor.check_budget(50, now()).action, BudgetAction::FallbackOnly);
		assert_eq!(governor.check_budget(200, now()).action, BudgetAction::Reject);
		assert_eq!(governor.check_budget(201, now()).action, BudgetAction::Downgrade);
	}

	#[test]
	fn exhausted_budget_rejects_a_single_token() {
		let governor = token_governor(1_000, 2_000);

		governor.record_usage(1_000, now());

		assert_eq!(governor.check_budget(1, now()).action, BudgetAction::Reject);
	}

	#[test]
	fn per_request_cap_downgrades_before_anything_else() {
		let governor = token_governor(1_000_000, 2_000);

		assert_eq!(governor.check_budget(2_001, now()).action, BudgetAction::Downgrade);
	}

	#[test]
	fn token_counter_resets_on_a_new_day() {
		let governor = token_governor(1_000, 2_000);

		governor.record_usage(900, now());

		assert_eq!(governor.check_budget(200, now()).action, BudgetAction::Reject);

		let tomorrow = now() + Duration::days(1);

		assert_eq!(governor.check_budget(200, tomorrow).action, BudgetAction::Allow);
		assert_eq!(governor.stats(tomorrow).tokens_used, 0);
	}

	#[test]
	fn quota_estimate_matches_fixed_costs() {
		assert_eq!(QuotaGovernor::estimate_cost(5, 50), 505);
		assert_eq!(QuotaGovernor::estimate_cost(1, 50), 101);
		assert_eq!(QuotaGovernor::estimate_cost(2, 20), 201);
		assert_eq!(QuotaGovernor::estimate_cost(0, 50), 0);
	}

	#[test]
	fn quota_tiers_and_caps() {
		let governor = quota_governor(10_000);
		let decision = governor.check_quota(505, now());

		assert_eq!(decision.action, QuotaAction::Allow);
		assert_eq!(decision.max_queries(), 5);
		assert_eq!(decision.max_results(), 50);

		governor.record_usage(8_000, now());

		let decision = governor.check_quota(505, now());

		assert_eq!(decision.action, QuotaAction::ReduceQueries);
		assert_eq!(decision.max_queries(), 3);
		assert_eq!(decision.max_results(), 50);

		governor.record_usage(1_000, now());

		let decision = governor.check_quota(505, now());

		assert_eq!(decision.action, QuotaAction::ReduceResults);
		assert_eq!(decision.max_queries(), 2);
		assert_eq!(decision.max_results(), 20);

		let decision = governor.check_quota(1_500, now());

		assert_eq!(decision.action, QuotaAction::Reject);
		assert!(!decision.is_allowed());
	}

	#[test]
	fn quota_counter_resets_on_a_new_day() {
		let governor = quota_governor(10_000);

		governor.record_usage(10_000, now());

		assert_eq!(governor.check_quota(1, now()).action, QuotaAction::Reject);

		let tomorrow = now() + Duration::days(1);

		assert_eq!(governor.check_quota(1, tomorrow).action, QuotaAction::Allow);
	}
}
