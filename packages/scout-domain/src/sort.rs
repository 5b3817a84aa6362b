//! Whitelisted sort keys for the read-time view. Each key maps to exactly
//! one stored column; there is no dynamic ordering.

/// Closed sort-key set.
///
/// `Subscribers` orders by the raw stored count, not the normalized
/// audience-fit score. `Activity` orders by `last_video_date` (who uploaded
/// most recently), while the activity *filter* buckets run over
/// `activity_consistency` (how often they upload) — the two deliberately
/// answer different questions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
	#[default]
	FinalScore,
	Relevance,
	Subscribers,
	Engagement,
	Activity,
	Competitiveness,
}
impl SortKey {
	/// The stored column this key orders by, always descending with
	/// `rank ASC` as the tiebreaker.
	pub fn column(self) -> &'static str {
		match self {
			Self::FinalScore => "score",
			Self::Relevance => "genre_relevance",
			Self::Subscribers => "subscriber_count",
			Self::Engagement => "engagement_quality",
			Self::Activity => "last_video_date",
			Self::Competitiveness => "competitiveness_score",
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::FinalScore => "FINAL_SCORE",
			Self::Relevance => "RELEVANCE",
			Self::Subscribers => "SUBSCRIBERS",
			Self::Engagement => "ENGAGEMENT",
			Self::Activity => "ACTIVITY",
			Self::Competitiveness => "COMPETITIVENESS",
		}
	}

	/// Case-insensitive, `-`/`_` interchangeable; anything unrecognized maps
	/// to `FinalScore` rather than failing the request.
	pub fn parse(raw: &str) -> Self {
		match raw.trim().to_ascii_uppercase().replace('-', "_").as_str() {
			"FINAL_SCORE" => Self::FinalScore,
			"RELEVANCE" => Self::Relevance,
			"SUBSCRIBERS" => Self::Subscribers,
			"ENGAGEMENT" => Self::Engagement,
			"ACTIVITY" => Self::Activity,
			"COMPETITIVENESS" => Self::Competitiveness,
			_ => Self::FinalScore,
		}
	}
}
