//! Merge, dedupe, and rank scored creators across expansion queries.
//!
//! Input is an ordered sequence of `(query, results)` pairs rather than a
//! map: ranking must be deterministic, so iteration order is pinned to the
//! expansion query order.

use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
};

use time::OffsetDateTime;

use crate::scoring::CreatorScore;

#[derive(Clone, Debug)]
pub struct ScoredCreator {
	pub channel_id: String,
	pub channel_name: String,
	pub description: String,
	pub image_url: String,
	pub subscriber_count: i64,
	pub last_video_date: Option<OffsetDateTime>,
	pub score: CreatorScore,
	pub labels: Vec<String>,
}

/// Flattens per-query results, dedupes by channel id (keeping the instance
/// with the highest final score and unioning every label seen for that
/// channel), then sorts by final score descending with a case-insensitive
/// name tiebreak; empty names sort last.
pub fn merge_and_rank(per_query: Vec<(String, Vec<ScoredCreator>)>) -> Vec<ScoredCreator> {
	let mut order: Vec<String> = Vec::new();
	let mut best: HashMap<String, ScoredCreator> = HashMap::new();
	let mut merged_labels: HashMap<String, Vec<String>> = HashMap::new();

	for (_, creators) in per_query {
		for creator in creators {
			let id = creator.channel_id.clone();
			let labels = merged_labels.entry(id.clone()).or_default();

			for label in &creator.labels {
				if !labels.iter().any(|existing| existing == label) {
					labels.push(label.clone());
				}
			}

			match best.get(&id) {
				None => {
					order.push(id.clone());
					best.insert(id, creator);
				},
				Some(existing) if creator.score.final_score > existing.score.final_score => {
					best.insert(id, creator);
				},
				Some(_) => {},
			}
		}
	}

	let mut ranked: Vec<ScoredCreator> = order
		.into_iter()
		.map(|id| {
			let mut creator = best.remove(&id).expect("every ordered id has a best instance");

			creator.labels = merged_labels.remove(&id).unwrap_or_default();

			creator
		})
		.collect();

	ranked.sort_by(compare_ranked);

	ranked
}

fn compare_ranked(a: &ScoredCreator, b: &ScoredCreator) -> Ordering {
	b.score
		.final_score
		.partial_cmp(&a.score.final_score)
		.unwrap_or(Ordering::Equal)
		.then_with(|| compare_names(&a.channel_name, &b.channel_name))
}

fn compare_names(a: &str, b: &str) -> Ordering {
	match (a.is_empty(), b.is_empty()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => a.to_lowercase().cmp(&b.to_lowercase()),
	}
}

/// Sanity check used by materialization: ranks handed to storage must be the
/// dense sequence `1..=len`.
pub fn ranks_are_dense(ranks: &[i32]) -> bool {
	let mut seen = HashSet::with_capacity(ranks.len());

	for (index, rank) in ranks.iter().enumerate() {
		if *rank != index as i32 + 1 || !seen.insert(*rank) {
			return false;
		}
	}

	true
}
