use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		roster_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-tenant".to_string(), Value::from(3));

	assert!(roster_providers::auth_headers("secret", &defaults).is_err());
}

#[test]
fn client_builds_from_config() {
	let cfg = roster_config::VerificationProviderConfig {
		api_base: "http://127.0.0.1:9000".to_string(),
		api_key: "secret".to_string(),
		path: "/v1/verifications".to_string(),
		timeout_ms: 1_000,
		default_headers: Map::new(),
	};

	assert!(roster_providers::verification::VerificationClient::new(&cfg).is_ok());
}
