use std::time::Duration;

use reqwest::{Client, header::HeaderMap};
use serde_json::Value;

use crate::{Error, Result};

/// Client for the external member verification service.
pub struct VerificationClient {
	client: Client,
	url: String,
	headers: HeaderMap,
}
impl VerificationClient {
	pub fn new(cfg: &roster_config::VerificationProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;

		Ok(Self { client, url: format!("{}{}", cfg.api_base, cfg.path), headers })
	}

	pub async fn is_verified(&self, user_id: i64) -> Result<bool> {
		let res = self
			.client
			.get(&self.url)
			.headers(self.headers.clone())
			.query(&[("userId", user_id)])
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_verification_response(&json)
	}
}

fn parse_verification_response(json: &Value) -> Result<bool> {
	json.get("verified").and_then(Value::as_bool).ok_or_else(|| Error::InvalidResponse {
		message: "Verification response is missing the verified flag.".to_string(),
	})
}
