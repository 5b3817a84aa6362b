//! Video-platform data API calls. Costs: `search.list` is 100 units per
//! call, `channels.list` is 1 unit per batched call of up to 50 ids; the
//! quota governor accounts for both.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{Error, Result};

pub const CHANNELS_BATCH_SIZE: usize = 50;

/// One `search.list` item: the channel id plus the item's publish timestamp,
/// which doubles as a recency signal for the profile.
#[derive(Clone, Debug)]
pub struct SearchHit {
	pub channel_id: String,
	pub published_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug)]
pub struct ChannelDetail {
	pub channel_id: String,
	pub handle: Option<String>,
	pub title: String,
	pub description: String,
	pub country: Option<String>,
	pub thumbnail_url: String,
	pub subscribers: i64,
	pub videos: i64,
	pub views: i64,
	pub published_at: Option<OffsetDateTime>,
}

pub async fn search_channels(
	cfg: &scout_config::Youtube,
	api_key: &str,
	query: &str,
	max_results: u32,
) -> Result<Vec<SearchHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/search", cfg.api_base);
	let res = client
		.get(url)
		.query(&[
			("part", "snippet"),
			("type", "channel"),
			("q", query),
			("maxResults", &max_results.to_string()),
			("key", api_key),
		])
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status { status: status.as_u16(), body });
	}

	let json: Value = res.json().await?;

	Ok(parse_search_response(json))
}

pub async fn list_channels(
	cfg: &scout_config::Youtube,
	api_key: &str,
	channel_ids: &[String],
) -> Result<Vec<ChannelDetail>> {
	if channel_ids.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/channels", cfg.api_base);
	let res = client
		.get(url)
		.query(&[
			("part", "snippet,statistics"),
			("id", channel_ids.join(",").as_str()),
			("maxResults", &channel_ids.len().to_string()),
			("key", api_key),
		])
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status { status: status.as_u16(), body });
	}

	let json: Value = res.json().await?;

	Ok(parse_channels_response(json))
}

fn parse_search_response(json: Value) -> Vec<SearchHit> {
	let Some(items) = json.get("items").and_then(|v| v.as_array()) else {
		return Vec::new();
	};
	let mut hits = Vec::with_capacity(items.len());

	for item in items {
		let Some(snippet) = item.get("snippet") else {
			continue;
		};
		let Some(channel_id) = snippet
			.get("channelId")
			.and_then(|v| v.as_str())
			.or_else(|| item.get("id").and_then(|id| id.get("channelId")).and_then(|v| v.as_str()))
		else {
			continue;
		};

		hits.push(SearchHit {
			channel_id: channel_id.to_string(),
			published_at: parse_timestamp(snippet.get("publishedAt")),
		});
	}

	hits
}

fn parse_channels_response(json: Value) -> Vec<ChannelDetail> {
	let Some(items) = json.get("items").and_then(|v| v.as_array()) else {
		return Vec::new();
	};
	let mut channels = Vec::with_capacity(items.len());

	for item in items {
		let Some(channel_id) = item.get("id").and_then(|v| v.as_str()) else {
			continue;
		};
		let snippet = item.get("snippet").cloned().unwrap_or(Value::Null);
		let statistics = item.get("statistics").cloned().unwrap_or(Value::Null);

		channels.push(ChannelDetail {
			channel_id: channel_id.to_string(),
			handle: snippet.get("customUrl").and_then(|v| v.as_str()).map(|s| s.to_string()),
			title: snippet.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
			description: snippet
				.get("description")
				.and_then(|v| v.as_str())
				.unwrap_or_default()
				.to_string(),
			country: snippet.get("country").and_then(|v| v.as_str()).map(|s| s.to_string()),
			thumbnail_url: pick_thumbnail(snippet.get("thumbnails")),
			subscribers: parse_count(statistics.get("subscriberCount")),
			videos: parse_count(statistics.get("videoCount")),
			views: parse_count(statistics.get("viewCount")),
			published_at: parse_timestamp(snippet.get("publishedAt")),
		});
	}

	channels
}

/// Highest-resolution thumbnail available: maxres > high > medium > default.
fn pick_thumbnail(thumbnails: Option<&Value>) -> String {
	let Some(thumbnails) = thumbnails else {
		return String::new();
	};

	for resolution in ["maxres", "high", "medium", "default"] {
		if let Some(url) =
			thumbnails.get(resolution).and_then(|thumb| thumb.get("url")).and_then(|v| v.as_str())
		{
			return url.to_string();
		}
	}

	String::new()
}

/// Statistics counts arrive as JSON strings; tolerate bare numbers too.
fn parse_count(value: Option<&Value>) -> i64 {
	let Some(value) = value else {
		return 0;
	};

	value.as_i64().or_else(|| value.as_str().and_then(|raw| raw.parse().ok())).unwrap_or(0)
}

fn parse_timestamp(value: Option<&Value>) -> Option<OffsetDateTime> {
	let raw = value?.as_str()?;

	OffsetDateTime::parse(raw, &Rfc3339).ok()
}
