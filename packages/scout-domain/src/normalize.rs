//! Deterministic query canonicalization.
//!
//! Two raw queries that normalize to the same token bag must always produce
//! the same digest key, so every cache layer above this module can treat the
//! key as the query's identity.

use sha2::{Digest, Sha256};

pub const CACHE_KEY_PREFIX: &str = "query:v1:";
pub const EMPTY_CACHE_KEY: &str = "query:v1:empty";

/// Closed stopword set. Changing it changes every digest, so it is versioned
/// through the `query:v1:` key prefix.
const STOPWORDS: &[&str] = &[
	"the", "a", "an", "and", "or", "for", "of", "in", "on", "to", "is", "are", "was", "were", "be",
	"been", "being", "have", "has", "had", "do", "does", "did", "will", "would", "could", "should",
	"may", "might", "must", "shall", "can", "need", "dare", "ought", "used", "with", "at", "by",
	"from", "as", "into", "through", "during", "before", "after", "above", "below", "between",
	"under",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedQuery {
	pub original: String,
	pub normalized: String,
	pub digest_key: String,
}

/// Lowercase, strip to `[a-z0-9 -]`, collapse whitespace/hyphen runs, drop
/// stopwords, sort the remaining tokens, join with single spaces.
pub fn normalize(raw: &str) -> String {
	let mut kept = String::with_capacity(raw.len());

	for ch in raw.chars() {
		let lowered = ch.to_ascii_lowercase();

		if lowered.is_ascii_lowercase()
			|| lowered.is_ascii_digit()
			|| lowered.is_whitespace()
			|| lowered == '-'
		{
			kept.push(lowered);
		}
	}

	let mut collapsed = String::with_capacity(kept.len());
	let mut prev_space = true;

	for ch in kept.chars() {
		if ch.is_whitespace() || ch == '-' {
			if !prev_space {
				collapsed.push(' ');

				prev_space = true;
			}

			continue;
		}

		collapsed.push(ch);

		prev_space = false;
	}

	let mut tokens: Vec<&str> = collapsed
		.trim()
		.split(' ')
		.filter(|token| !token.is_empty())
		.filter(|token| !STOPWORDS.contains(token))
		.collect();

	tokens.sort_unstable();

	tokens.join(" ")
}

/// First 16 hex characters (64 bits) of SHA-256 over the normalized form.
pub fn digest(normalized: &str) -> String {
	let hash = Sha256::digest(normalized.as_bytes());
	let mut out = String::with_capacity(16);

	for byte in &hash[..8] {
		out.push_str(&format!("{byte:02x}"));
	}

	out
}

pub fn cache_key(raw: &str) -> String {
	let normalized = normalize(raw);

	if normalized.is_empty() {
		return EMPTY_CACHE_KEY.to_string();
	}

	format!("{CACHE_KEY_PREFIX}{}", digest(&normalized))
}

pub fn process(raw: &str) -> NormalizedQuery {
	let normalized = normalize(raw);
	let digest_key = if normalized.is_empty() {
		EMPTY_CACHE_KEY.to_string()
	} else {
		format!("{CACHE_KEY_PREFIX}{}", digest(&normalized))
	};

	NormalizedQuery { original: raw.to_string(), normalized, digest_key }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_strips_and_sorts() {
		assert_eq!(normalize("Anime EDITS!"), "anime edits");
		assert_eq!(normalize("  lofi   beats  "), "beats lofi");
		assert_eq!(normalize("lo-fi beats"), "beats fi lo");
	}

	#[test]
	fn drops_stopwords() {
		assert_eq!(normalize("the best of anime and edits"), "anime best edits");
		assert_eq!(normalize("the a an of"), "");
	}

	#[test]
	fn is_idempotent() {
		for raw in ["Anime Edits", "the LO-FI beats!", "", "   ", "cooking 101"] {
			let once = normalize(raw);

			assert_eq!(normalize(&once), once, "normalize must be idempotent for {raw:?}");
		}
	}

	#[test]
	fn is_commutative_over_token_order() {
		assert_eq!(normalize("edits anime"), normalize("anime edits"));
		assert_eq!(cache_key("edits anime"), cache_key("ANIME edits!"));
	}

	#[test]
	fn digest_matches_sha256_prefix() {
		assert_eq!(digest("anime edits"), "5dac97e474dace52");
		assert_eq!(digest("gaming"), "8517b64a7dfada98");
		assert_eq!(digest("beats lofi"), "d5dbc8bf12c91c71");
	}

	#[test]
	fn cache_key_is_prefixed_and_stable() {
		assert_eq!(cache_key("Anime Edits"), "query:v1:5dac97e474dace52");
		assert_eq!(cache_key("!!!"), EMPTY_CACHE_KEY);
		assert_eq!(cache_key(""), EMPTY_CACHE_KEY);
	}

	#[test]
	fn equal_normal_forms_share_cache_keys() {
		let pairs = [("anime edits", "Edits... Anime"), ("gaming", "GAMING"), ("lo-fi", "LO fi")];

		for (left, right) in pairs {
			assert_eq!(normalize(left), normalize(right));
			assert_eq!(cache_key(left), cache_key(right));
		}
	}
}
