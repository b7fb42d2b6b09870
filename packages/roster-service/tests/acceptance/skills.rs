use serde_json::json;

use roster_domain::identity::Caller;
use roster_service::{Error, MemberSkillsRequest};

use super::{Fixture, Harness, member_doc};

fn seeded() -> Harness {
	let harness = Fixture::default().build();

	harness.store.insert("members", "abc", "", member_doc(1, "Abc"));
	harness.store.insert(
		"member_entered_skills",
		"1",
		"",
		json!({
			"userId": 1,
			"userHandle": "Abc",
			"handleLower": "abc",
			"skills": {
				"286": { "tagName": "Rust", "score": 2 },
				"300": { "tagName": "Secret", "hidden": true }
			},
			"createdAt": "2024-01-01T00:00:00Z",
			"createdBy": "abc"
		}),
	);
	harness.store.insert(
		"member_aggregated_skills",
		"1",
		"",
		json!({
			"userId": 1,
			"skills": "{\"286\": {\"tagName\": \"Aggregated\", \"score\": 9}, \"400\": {\"tagName\": \"Go\"}}"
		}),
	);

	harness
}

#[tokio::test]
async fn others_do_not_see_hidden_skills() {
	let harness = seeded();
	let view = harness
		.service
		.get_member_skills(None, "abc", MemberSkillsRequest::default())
		.await
		.expect("Skills lookup failed.");
	let skills = view.skills.expect("Skills should be present.");

	assert!(skills.contains_key("286"));
	assert!(skills.contains_key("400"));
	assert!(!skills.contains_key("300"));
	assert_eq!(skills["286"].tag_name.as_deref(), Some("Rust"));
}

#[tokio::test]
async fn the_member_sees_hidden_skills() {
	let harness = seeded();
	let caller = Caller::member(1, "abc", &[]);
	let view = harness
		.service
		.get_member_skills(Some(&caller), "abc", MemberSkillsRequest::default())
		.await
		.expect("Skills lookup failed.");

	assert!(view.skills.is_some_and(|skills| skills.contains_key("300")));
}

#[tokio::test]
async fn member_without_entered_skills_is_not_found() {
	let harness = Fixture::default().build();

	harness.store.insert("members", "xyz", "", member_doc(2, "xyz"));

	let err = harness
		.service
		.get_member_skills(None, "xyz", MemberSkillsRequest::default())
		.await
		.expect_err("Expected missing skills.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn anonymous_update_is_unauthorized() {
	let harness = seeded();
	let err = harness
		.service
		.update_member_skills_partial(None, "abc", json!({ "286": { "score": 5 } }))
		.await
		.expect_err("Expected rejection.");

	assert!(matches!(err, Error::Unauthorized { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn updating_another_member_is_forbidden() {
	let harness = seeded();
	let caller = Caller::member(2, "xyz", &[]);
	let err = harness
		.service
		.update_member_skills_partial(Some(&caller), "abc", json!({ "286": { "score": 5 } }))
		.await
		.expect_err("Expected rejection.");

	assert!(matches!(err, Error::Forbidden { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn the_member_patches_their_own_skills() {
	let harness = seeded();
	let caller = Caller::member(1, "abc", &[]);
	let view = harness
		.service
		.update_member_skills_partial(
			Some(&caller),
			"abc",
			json!({ "286": { "score": 5 }, "500": { "tagName": "Zig" } }),
		)
		.await
		.expect("Update failed.");
	let skills = view.skills.expect("Skills should be present.");

	assert_eq!(skills["286"].score, Some(5.0));
	assert_eq!(skills["286"].tag_name.as_deref(), Some("Rust"));
	assert_eq!(skills["500"].tag_name.as_deref(), Some("Zig"));
	assert_eq!(view.updated_by.as_deref(), Some("abc"));
	assert_eq!(view.created_by.as_deref(), Some("abc"));

	let stored = harness.store.row("member_entered_skills", "1").expect("Row should be stored.");

	assert_eq!(stored["skills"]["286"]["score"], json!(5.0));
	assert_eq!(stored["updatedBy"], json!("abc"));
}

#[tokio::test]
async fn admin_patch_creates_a_missing_row() {
	let harness = Fixture::default().build();

	harness.store.insert("members", "xyz", "", member_doc(2, "xyz"));

	let admin = Caller::member(9, "boss", &["administrator"]);
	let view = harness
		.service
		.update_member_skills_partial(Some(&admin), "xyz", json!({ "7": { "tagName": "C" } }))
		.await
		.expect("Update failed.");

	assert_eq!(view.user_id, Some(2));
	assert_eq!(view.created_by.as_deref(), Some("boss"));
	assert!(view.skills.is_some_and(|skills| skills.contains_key("7")));
}

#[tokio::test]
async fn malformed_patch_is_a_bad_request() {
	let harness = seeded();
	let caller = Caller::member(1, "abc", &[]);
	let err = harness
		.service
		.update_member_skills_partial(Some(&caller), "abc", json!({ "286": { "score": -1 } }))
		.await
		.expect_err("Expected rejection.");

	assert!(matches!(err, Error::BadRequest { .. }), "Unexpected error: {err:?}");
}
