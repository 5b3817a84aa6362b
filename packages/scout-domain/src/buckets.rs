//! Filter buckets: half-open score ranges that map a continuous sub-score to
//! a discrete multi-select value. Selections within one category OR
//! together; categories AND together (enforced by the read-time view).

/// Half-open range `[min, max)` over a normalized score. The upper bound of
/// the top bucket is 1.01 so a score of exactly 1.0 stays inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreRange {
	pub min: f64,
	pub max: f64,
}
impl ScoreRange {
	pub const ALL: Self = Self { min: 0.0, max: 1.01 };

	pub fn contains(&self, score: f64) -> bool {
		score >= self.min && score < self.max
	}
}

pub fn audience_range(bucket: &str) -> ScoreRange {
	match bucket.trim().to_ascii_lowercase().as_str() {
		"small" => ScoreRange { min: 0.0, max: 0.4 },
		"medium" => ScoreRange { min: 0.4, max: 0.7 },
		"large" => ScoreRange { min: 0.7, max: 1.01 },
		_ => ScoreRange::ALL,
	}
}

pub fn engagement_range(bucket: &str) -> ScoreRange {
	match bucket.trim().to_ascii_lowercase().as_str() {
		"low" => ScoreRange { min: 0.0, max: 0.4 },
		"medium" => ScoreRange { min: 0.4, max: 0.7 },
		"high" => ScoreRange { min: 0.7, max: 1.01 },
		_ => ScoreRange::ALL,
	}
}

pub fn competitiveness_range(bucket: &str) -> ScoreRange {
	match bucket.trim().to_ascii_lowercase().as_str() {
		"nascent" => ScoreRange { min: 0.0, max: 0.20 },
		"emerging" => ScoreRange { min: 0.20, max: 0.40 },
		"growing" => ScoreRange { min: 0.40, max: 0.60 },
		"established" => ScoreRange { min: 0.60, max: 0.80 },
		"dominant" => ScoreRange { min: 0.80, max: 1.01 },
		_ => ScoreRange::ALL,
	}
}

/// Activity buckets run over `activity_consistency` (upload cadence), not
/// over `last_video_date`; the ACTIVITY sort key answers the recency
/// question instead.
pub fn activity_range(bucket: &str) -> ScoreRange {
	match bucket.trim().to_ascii_lowercase().as_str() {
		"occasional" => ScoreRange { min: 0.0, max: 0.4 },
		"consistent" => ScoreRange { min: 0.4, max: 0.7 },
		"very_active" | "very active" => ScoreRange { min: 0.7, max: 1.01 },
		_ => ScoreRange::ALL,
	}
}

pub fn matches_any(score: f64, buckets: &[String], range: fn(&str) -> ScoreRange) -> bool {
	if buckets.is_empty() {
		return true;
	}

	buckets.iter().any(|bucket| range(bucket).contains(score))
}

pub fn matches_any_audience(score: f64, buckets: &[String]) -> bool {
	matches_any(score, buckets, audience_range)
}

pub fn matches_any_engagement(score: f64, buckets: &[String]) -> bool {
	matches_any(score, buckets, engagement_range)
}

pub fn matches_any_competitiveness(score: f64, buckets: &[String]) -> bool {
	matches_any(score, buckets, competitiveness_range)
}

pub fn matches_any_activity(score: f64, buckets: &[String]) -> bool {
	matches_any(score, buckets, activity_range)
}
