//! Scores fresh platform profiles into ranked candidates. A panicking
//! scorer only costs its own creator: the row is logged and excluded, the
//! rest of the batch is unaffected.

use std::{
	collections::HashMap,
	panic::{self, AssertUnwindSafe},
};

use time::OffsetDateTime;

use crate::platform::CreatorProfile;
use scout_domain::{
	labels,
	ranking::ScoredCreator,
	scoring::{self, AudienceScale, CreatorScore},
};

#[derive(Clone, Debug)]
pub struct GradingCriteria {
	pub base_genre: String,
	pub audience: Option<AudienceScale>,
}
impl GradingCriteria {
	pub fn from_filters(genre: &str, filters: Option<&HashMap<String, String>>) -> Self {
		let audience = filters
			.and_then(|filters| filters.get("audience"))
			.and_then(|raw| AudienceScale::parse(raw));

		Self { base_genre: genre.to_string(), audience }
	}
}

pub fn grade_profiles(
	query: &str,
	profiles: &[CreatorProfile],
	criteria: &GradingCriteria,
	last_seen_at: Option<OffsetDateTime>,
	now: OffsetDateTime,
) -> Vec<ScoredCreator> {
	let mut graded = Vec::with_capacity(profiles.len());

	for profile in profiles {
		let result = panic::catch_unwind(AssertUnwindSafe(|| {
			grade_one(query, profile, criteria, last_seen_at, now)
		}));

		match result {
			Ok(scored) => graded.push(scored),
			Err(_) => {
				tracing::error!(
					channel_id = %profile.channel_id,
					"Scorer panicked; excluding creator from materialization."
				);
			},
		}
	}

	graded
}

fn grade_one(
	query: &str,
	profile: &CreatorProfile,
	criteria: &GradingCriteria,
	last_seen_at: Option<OffsetDateTime>,
	now: OffsetDateTime,
) -> ScoredCreator {
	// Text relevance against the genre, lifted by the name-relevance variant
	// when the originating query matches the channel name.
	let genre_relevance = scoring::score_genre_relevance(
		&profile.display_name,
		&profile.bio,
		&criteria.base_genre,
	)
	.max(scoring::score_name_relevance(&profile.display_name, query));
	let audience_fit = scoring::score_audience_fit(profile.subscribers, criteria.audience);
	let engagement_quality = scoring::score_engagement_behavior(&profile.video_samples)
		.unwrap_or_else(|| scoring::score_engagement(profile.views, profile.subscribers));
	let activity_consistency = scoring::score_activity(
		profile.videos,
		scoring::channel_age_months(profile.published_at, now),
	);
	let freshness = scoring::score_freshness(last_seen_at, now);
	let score = CreatorScore::compute(
		genre_relevance,
		audience_fit,
		engagement_quality,
		activity_consistency,
		freshness,
	);
	let labels = labels::generate_labels(&score);

	ScoredCreator {
		channel_id: profile.channel_id.clone(),
		channel_name: profile.display_name.clone(),
		description: profile.bio.clone(),
		image_url: profile.image_url.clone(),
		subscriber_count: profile.subscribers,
		last_video_date: profile.last_video_date,
		score,
		labels,
	}
}
