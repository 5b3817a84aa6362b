use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug)]
pub struct ChatCompletion {
	pub text: String,
	/// Billed tokens as reported by the provider; callers fall back to their
	/// own estimate when the field is absent.
	pub total_tokens: Option<i64>,
}

pub async fn complete(cfg: &scout_config::LlmProviderConfig, prompt: &str) -> Result<ChatCompletion> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status { status: status.as_u16(), body });
	}

	let json: Value = res.json().await?;

	parse_chat_response(json)
}

fn parse_chat_response(json: Value) -> Result<ChatCompletion> {
	let text = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.or_else(|| json.get("text").and_then(|c| c.as_str()))
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing message content.".to_string(),
		})?
		.to_string();
	let total_tokens = json
		.get("usage")
		.and_then(|usage| usage.get("total_tokens"))
		.and_then(|v| v.as_i64())
		.or_else(|| {
			let billed = json.get("meta")?.get("billed_units")?;
			let input = billed.get("input_tokens").and_then(|v| v.as_i64()).unwrap_or(0);
			let output = billed.get("output_tokens").and_then(|v| v.as_i64()).unwrap_or(0);

			(input + output > 0).then_some(input + output)
		});

	Ok(ChatCompletion { text, total_tokens })
}
