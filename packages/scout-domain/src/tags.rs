//! Deterministic content-tag extraction. A closed keyword dictionary is
//! matched against the display name and bio; no model calls, no state.

const TAG_PATTERNS: &[(&str, &[&str])] = &[
	("gaming", &["gaming", "gamer", "gameplay"]),
	("music", &["music", "song", "singer"]),
	("comedy", &["comedy", "funny", "humor"]),
	("tech", &["tech", "technology", "review"]),
	("lifestyle", &["vlog", "daily", "lifestyle"]),
	("education", &["education", "learn", "tutorial"]),
	("fitness", &["fitness", "workout", "gym"]),
	("food", &["cooking", "recipe", "food"]),
	("beauty", &["beauty", "makeup", "fashion"]),
	("commentary", &["news", "politics", "commentary"]),
];

const MAX_TAGS: usize = 5;

/// Up to five tags in dictionary order (first match wins a slot).
pub fn extract_content_tags(display_name: &str, bio: &str) -> Vec<String> {
	let text = format!("{display_name} {bio}").to_lowercase();
	let mut tags = Vec::new();

	for (tag, keywords) in TAG_PATTERNS {
		if keywords.iter().any(|keyword| text.contains(keyword)) {
			tags.push(tag.to_string());

			if tags.len() == MAX_TAGS {
				break;
			}
		}
	}

	tags
}
