//! Qualitative labels derived from a score vector. Labels explain why a
//! creator ranked where it did; they are generated once at materialization
//! and stored with the result row.

use crate::scoring::{self, CreatorScore};

const HIGH: f64 = 0.75;
const MEDIUM: f64 = 0.5;
const LOW: f64 = 0.25;

pub fn generate_labels(score: &CreatorScore) -> Vec<String> {
	let mut labels = Vec::new();

	if score.genre_relevance >= HIGH {
		labels.push("Strong genre fit");
	} else if score.genre_relevance >= MEDIUM {
		labels.push("Good genre match");
	}

	if score.audience_fit >= HIGH {
		labels.push("Perfect audience size");
	} else if score.audience_fit >= MEDIUM {
		labels.push("Suitable audience");
	}

	if score.engagement_quality >= HIGH {
		labels.push("High engagement");
	} else if score.engagement_quality >= MEDIUM {
		labels.push("Good engagement");
	} else if score.engagement_quality < LOW {
		labels.push("Low engagement");
	}

	if score.activity_consistency >= HIGH {
		labels.push("Very active");
	} else if score.activity_consistency >= MEDIUM {
		labels.push("Consistently active");
	} else if score.activity_consistency < LOW {
		labels.push("Occasionally active");
	}

	if score.freshness >= HIGH {
		labels.push("Recently active");
	} else if score.freshness < LOW {
		labels.push("Inactive recently");
	}

	// The tier label uses the same formula as the stored competitiveness
	// score so labels and filter buckets agree at materialization time.
	let competitiveness = scoring::score_competitiveness(
		score.audience_fit,
		score.engagement_quality,
		score.activity_consistency,
	);

	if competitiveness >= 0.20 {
		labels.push(scoring::competitiveness_tier(competitiveness));
	}

	if score.final_score >= 0.8 {
		labels.push("Top match");
	} else if score.final_score >= 0.6 {
		labels.push("Good match");
	}

	labels.into_iter().map(|label| label.to_string()).collect()
}
