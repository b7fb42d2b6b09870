use serde_json::json;

use roster_service::{DistributionRequest, Error};

use super::Fixture;

#[tokio::test]
async fn sums_matching_rows_case_insensitively() {
	let harness = Fixture::default().build();

	harness.store.insert(
		"member_distribution_stats",
		"DEVELOP",
		"CODE",
		json!({
			"track": "DEVELOP",
			"subTrack": "CODE",
			"distribution": { "ratingRange0To099": 3, "ratingRange100To199": "2" },
			"createdAt": "2024-02-01T00:00:00Z",
			"createdBy": "loader"
		}),
	);
	harness.store.insert(
		"member_distribution_stats",
		"DEVELOP",
		"FIRST_2_FINISH",
		json!({
			"track": "DEVELOP",
			"subTrack": "FIRST_2_FINISH",
			"distribution": { "ratingRange0To099": 4 },
			"createdAt": "2024-01-01T00:00:00Z",
			"createdBy": "importer"
		}),
	);
	harness.store.insert(
		"member_distribution_stats",
		"DESIGN",
		"WEB",
		json!({ "track": "DESIGN", "subTrack": "WEB", "distribution": { "ratingRange0To099": 100 } }),
	);

	let req = DistributionRequest { track: Some("develop".to_string()), ..Default::default() };
	let summary = harness.service.get_distribution(req).await.expect("Distribution failed.");
	let buckets = summary.distribution.expect("Buckets should be present.");

	assert_eq!(buckets["ratingRange0To099"], 7);
	assert_eq!(buckets["ratingRange100To199"], 2);
	assert_eq!(summary.track.as_deref(), Some("develop"));
	assert_eq!(summary.created_by.as_deref(), Some("importer"));
}

#[tokio::test]
async fn no_matching_rows_is_not_found() {
	let harness = Fixture::default().build();
	let req = DistributionRequest {
		track: Some("DEVELOP".to_string()),
		sub_track: Some("MISSING".to_string()),
		fields: None,
	};
	let err = harness.service.get_distribution(req).await.expect_err("Expected missing rows.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
}
