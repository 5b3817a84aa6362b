//! Closed feature-flag model. A feature is ENABLED only when its
//! credentials are present AND its flag is set; credentials without the
//! flag leave it CONFIGURED; anything else is DISABLED. Guarded operations
//! return their empty shape when not ENABLED; they never error.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureFlag {
	YoutubeCore,
	RedditEnrichment,
	InstagramEnrichment,
	TwitterEnrichment,
	TwitchEnrichment,
}
impl FeatureFlag {
	pub const ALL: [Self; 5] = [
		Self::YoutubeCore,
		Self::RedditEnrichment,
		Self::InstagramEnrichment,
		Self::TwitterEnrichment,
		Self::TwitchEnrichment,
	];

	pub fn name(self) -> &'static str {
		match self {
			Self::YoutubeCore => "YOUTUBE_CORE",
			Self::RedditEnrichment => "REDDIT_ENRICHMENT",
			Self::InstagramEnrichment => "INSTAGRAM_ENRICHMENT",
			Self::TwitterEnrichment => "TWITTER_ENRICHMENT",
			Self::TwitchEnrichment => "TWITCH_ENRICHMENT",
		}
	}

	/// The core platform cannot be turned off; the service does not start
	/// without its credentials.
	pub fn always_enabled(self) -> bool {
		self == Self::YoutubeCore
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureState {
	Disabled,
	Configured,
	Enabled,
}
impl FeatureState {
	pub fn resolve(has_credentials: bool, flag_enabled: bool) -> Self {
		if !has_credentials {
			return Self::Disabled;
		}

		if flag_enabled { Self::Enabled } else { Self::Configured }
	}

	pub fn is_active(self) -> bool {
		self == Self::Enabled
	}

	pub fn has_credentials(self) -> bool {
		matches!(self, Self::Configured | Self::Enabled)
	}
}

pub struct FeatureRegistry {
	states: Vec<(FeatureFlag, FeatureState)>,
}
impl FeatureRegistry {
	pub fn from_config(features: &scout_config::Features) -> Self {
		let states = FeatureFlag::ALL
			.into_iter()
			.map(|flag| {
				let state = if flag.always_enabled() {
					FeatureState::Enabled
				} else {
					let toggle = match flag {
						FeatureFlag::RedditEnrichment => &features.reddit_enrichment,
						FeatureFlag::InstagramEnrichment => &features.instagram_enrichment,
						FeatureFlag::TwitterEnrichment => &features.twitter_enrichment,
						FeatureFlag::TwitchEnrichment => &features.twitch_enrichment,
						FeatureFlag::YoutubeCore => unreachable!("handled by always_enabled"),
					};

					FeatureState::resolve(toggle.has_credentials(), toggle.enabled)
				};

				(flag, state)
			})
			.collect();

		Self { states }
	}

	pub fn state(&self, flag: FeatureFlag) -> FeatureState {
		self.states
			.iter()
			.find(|(candidate, _)| *candidate == flag)
			.map(|(_, state)| *state)
			.unwrap_or(FeatureState::Disabled)
	}

	pub fn is_enabled(&self, flag: FeatureFlag) -> bool {
		self.state(flag).is_active()
	}

	pub fn summary(&self) -> FeatureSummary {
		let mut enabled_count = 0;
		let mut configured_count = 0;
		let mut disabled_count = 0;
		let mut features = Vec::with_capacity(self.states.len());

		for (flag, state) in &self.states {
			match state {
				FeatureState::Enabled => enabled_count += 1,
				FeatureState::Configured => configured_count += 1,
				FeatureState::Disabled => disabled_count += 1,
			}

			features.push(FeatureReport {
				name: flag.name(),
				state: *state,
				active: state.is_active(),
				has_credentials: state.has_credentials(),
			});
		}

		FeatureSummary { enabled_count, configured_count, disabled_count, features }
	}
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureReport {
	pub name: &'static str,
	pub state: FeatureState,
	pub active: bool,
	pub has_credentials: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSummary {
	pub enabled_count: usize,
	pub configured_count: usize,
	pub disabled_count: usize,
	pub features: Vec<FeatureReport>,
}
