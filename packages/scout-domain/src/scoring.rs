//! Pure creator scorers. Every function here is deterministic, side-effect
//! free, and returns values clamped to `[0.0, 1.0]`.

use time::OffsetDateTime;

pub const WEIGHT_GENRE: f64 = 0.35;
pub const WEIGHT_AUDIENCE: f64 = 0.20;
pub const WEIGHT_ENGAGEMENT: f64 = 0.20;
pub const WEIGHT_ACTIVITY: f64 = 0.15;
pub const WEIGHT_FRESHNESS: f64 = 0.10;

pub const WEIGHT_COMPETITIVE_AUDIENCE: f64 = 0.40;
pub const WEIGHT_COMPETITIVE_ENGAGEMENT: f64 = 0.35;
pub const WEIGHT_COMPETITIVE_ACTIVITY: f64 = 0.25;

/// Recency weights for behavior-based engagement, most recent video first.
pub const ENGAGEMENT_RECENCY_WEIGHTS: [f64; 10] =
	[1.00, 0.85, 0.70, 0.55, 0.40, 0.40, 0.40, 0.40, 0.40, 0.40];

const ENGAGEMENT_MIN_VIDEO_VIEWS: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreatorScore {
	pub genre_relevance: f64,
	pub audience_fit: f64,
	pub engagement_quality: f64,
	pub activity_consistency: f64,
	pub freshness: f64,
	pub final_score: f64,
}
impl CreatorScore {
	/// Builds the score vector; `final_score` is always the fixed weighted
	/// sum of the five sub-scores, clamped.
	pub fn compute(
		genre_relevance: f64,
		audience_fit: f64,
		engagement_quality: f64,
		activity_consistency: f64,
		freshness: f64,
	) -> Self {
		let final_score = genre_relevance * WEIGHT_GENRE
			+ audience_fit * WEIGHT_AUDIENCE
			+ engagement_quality * WEIGHT_ENGAGEMENT
			+ activity_consistency * WEIGHT_ACTIVITY
			+ freshness * WEIGHT_FRESHNESS;

		Self {
			genre_relevance,
			audience_fit,
			engagement_quality,
			activity_consistency,
			freshness,
			final_score: clamp(final_score),
		}
	}
}

/// Subscriber-count preference bucket, half-open `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudienceScale {
	Small,
	Medium,
	Large,
}
impl AudienceScale {
	pub fn bounds(self) -> (i64, i64) {
		match self {
			Self::Small => (0, 10_000),
			Self::Medium => (10_000, 100_000),
			Self::Large => (100_000, i64::MAX),
		}
	}

	pub fn matches(self, subscribers: i64) -> bool {
		let (min, max) = self.bounds();

		subscribers >= min && subscribers < max
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"small" => Some(Self::Small),
			"medium" => Some(Self::Medium),
			"large" => Some(Self::Large),
			_ => None,
		}
	}
}

/// Per-video engagement sample, most recent first when passed in a slice.
#[derive(Clone, Copy, Debug)]
pub struct VideoSample {
	pub views: i64,
	pub likes: i64,
	pub comments: i64,
}

/// Keyword overlap between the genre and `name + " " + description`, with a
/// +0.3 boost when the whole normalized genre appears inside the normalized
/// name.
pub fn score_genre_relevance(channel_name: &str, description: &str, base_genre: &str) -> f64 {
	let genre_tokens = tokenize(base_genre);

	if genre_tokens.is_empty() {
		return 0.5;
	}

	let combined = normalize_text(&format!("{channel_name} {description}"));
	let matches = genre_tokens.iter().filter(|token| combined.contains(token.as_str())).count();
	let mut ratio = matches as f64 / genre_tokens.len() as f64;

	if normalize_text(channel_name).contains(&normalize_text(base_genre)) {
		ratio += 0.3;
	}

	clamp(ratio)
}

/// Exact-name boost variant used when ranking against the originating query.
pub fn score_name_relevance(channel_name: &str, query: &str) -> f64 {
	let name = normalize_text(channel_name);
	let normalized_query = normalize_text(query);

	if name == normalized_query {
		return 1.0;
	}
	if name.starts_with(&normalized_query) && !normalized_query.is_empty() {
		return 0.95;
	}
	if !normalized_query.is_empty() && name.contains(&normalized_query) {
		return 0.8;
	}
	if !query.trim().is_empty() && channel_name.to_lowercase().contains(&query.to_lowercase()) {
		return 0.7;
	}

	let query_words = tokenize(query);

	if query_words.is_empty() {
		return 0.3;
	}

	let hits = query_words.iter().filter(|word| name.contains(word.as_str())).count();

	(0.4 + 0.3 * hits as f64 / query_words.len() as f64).max(0.3)
}

pub fn score_audience_fit(subscribers: i64, preference: Option<AudienceScale>) -> f64 {
	let Some(scale) = preference else {
		return match subscribers {
			s if s >= 10_000_000 => 1.0,
			s if s >= 1_000_000 => 0.9,
			s if s >= 100_000 => 0.7,
			s if s >= 10_000 => 0.5,
			s if s >= 1_000 => 0.3,
			_ => 0.2,
		};
	};

	if scale.matches(subscribers) {
		return 1.0;
	}

	let (min, max) = scale.bounds();

	if subscribers >= max {
		if scale == AudienceScale::Large {
			return 0.8;
		}

		let distance = (subscribers - max) as f64 / max as f64;

		return clamp((1.0 - distance).max(0.0) * 0.7);
	}

	if min == 0 {
		return 0.7;
	}

	let distance = (min - subscribers) as f64 / min as f64;

	clamp((1.0 - distance).max(0.0) * 0.7)
}

/// Views-per-subscriber sigmoid. A channel with zero subscribers gets the
/// neutral ratio 0.5 rather than infinity.
pub fn score_engagement(views: i64, subscribers: i64) -> f64 {
	let ratio = if subscribers == 0 { 0.5 } else { views as f64 / subscribers as f64 };

	clamp(1.0 / (1.0 + (-0.05 * (ratio - 50.0)).exp()))
}

/// Behavior-based engagement over up to ten recent videos. Comments count
/// double: they signal higher effort than likes. Returns `None` when no
/// video clears the minimum-view threshold, so callers can fall back to the
/// ratio sigmoid.
pub fn score_engagement_behavior(videos: &[VideoSample]) -> Option<f64> {
	let mut weighted_sum = 0.0;
	let mut weight_total = 0.0;
	let mut used = 0;

	for video in videos {
		if used >= ENGAGEMENT_RECENCY_WEIGHTS.len() {
			break;
		}
		if video.views < ENGAGEMENT_MIN_VIDEO_VIEWS {
			continue;
		}

		let rate = (video.likes as f64 + 2.0 * video.comments as f64) / video.views as f64;
		let weight = ENGAGEMENT_RECENCY_WEIGHTS[used];

		weighted_sum += rate * weight;
		weight_total += weight;
		used += 1;
	}

	if used == 0 {
		return None;
	}

	let rate = weighted_sum / weight_total;

	Some(clamp(1.0 / (1.0 + (-3.0 * (rate - 0.15)).exp())))
}

pub fn score_activity(video_count: i64, channel_age_months: f64) -> f64 {
	let uploads_per_month = video_count as f64 / channel_age_months.max(1.0);

	let score = if uploads_per_month <= 0.0 {
		0.0
	} else if uploads_per_month <= 1.0 {
		uploads_per_month * 0.3
	} else if uploads_per_month <= 4.0 {
		0.3 + (uploads_per_month - 1.0) / 3.0 * 0.4
	} else if uploads_per_month <= 8.0 {
		0.7 + (uploads_per_month - 4.0) / 4.0 * 0.2
	} else {
		0.9 + ((uploads_per_month - 8.0) / 20.0 * 0.1).min(0.1)
	};

	clamp(score)
}

pub fn channel_age_months(published_at: Option<OffsetDateTime>, now: OffsetDateTime) -> f64 {
	let Some(published_at) = published_at else {
		return 0.0;
	};
	let days = (now - published_at).whole_days();

	if days <= 0 { 0.0 } else { days as f64 / 30.0 }
}

/// Piecewise-linear decay over days since last seen. Unknown history is
/// neutral, not penalized.
pub fn score_freshness(last_seen_at: Option<OffsetDateTime>, now: OffsetDateTime) -> f64 {
	let Some(last_seen_at) = last_seen_at else {
		return 0.5;
	};
	let days = (now - last_seen_at).whole_days();

	if days < 0 {
		return 1.0;
	}

	let days = days as f64;

	if days <= 7.0 {
		1.0
	} else if days <= 30.0 {
		1.0 - (days - 7.0) / 23.0 * 0.2
	} else if days <= 90.0 {
		0.8 - (days - 30.0) / 60.0 * 0.3
	} else if days <= 180.0 {
		0.5 - (days - 90.0) / 90.0 * 0.3
	} else {
		0.1
	}
}

/// Market-position scalar, computed once at materialization and stored.
pub fn score_competitiveness(
	audience_fit: f64,
	engagement_quality: f64,
	activity_consistency: f64,
) -> f64 {
	clamp(
		WEIGHT_COMPETITIVE_AUDIENCE * audience_fit
			+ WEIGHT_COMPETITIVE_ENGAGEMENT * engagement_quality
			+ WEIGHT_COMPETITIVE_ACTIVITY * activity_consistency,
	)
}

/// Tier name for a competitiveness score. Covers the whole `[0, 1]` range.
pub fn competitiveness_tier(score: f64) -> &'static str {
	if score >= 0.80 {
		"Dominant"
	} else if score >= 0.60 {
		"Established"
	} else if score >= 0.40 {
		"Growing"
	} else if score >= 0.20 {
		"Emerging"
	} else {
		"Nascent"
	}
}

pub fn clamp(value: f64) -> f64 {
	value.clamp(0.0, 1.0)
}

fn normalize_text(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut prev_space = true;

	for ch in text.chars() {
		let lowered = ch.to_ascii_lowercase();

		if lowered.is_ascii_lowercase() || lowered.is_ascii_digit() {
			out.push(lowered);

			prev_space = false;
		} else if !prev_space {
			out.push(' ');

			prev_space = true;
		}
	}

	out.trim_end().to_string()
}

fn tokenize(text: &str) -> Vec<String> {
	normalize_text(text)
		.split(' ')
		.filter(|token| token.len() > 2)
		.map(|token| token.to_string())
		.collect()
}
