use std::{collections::HashSet, sync::atomic::Ordering};

use serde_json::json;

use roster_domain::identity::Caller;
use roster_service::{AutocompleteRequest, Error, SearchMembersRequest};

use super::{Fixture, MemoryStatsData, member_doc, test_config};

fn two_members() -> Fixture {
	Fixture {
		profiles: vec![member_doc(1, "Abc"), member_doc(2, "Xyz")],
		skills: vec![json!({
			"userId": 1,
			"handleLower": "abc",
			"skills": { "286": { "tagName": "Rust", "score": 2 } }
		})],
		stats: MemoryStatsData {
			overall: vec![json!({
				"userId": 2,
				"handleLower": "xyz",
				"groupId": 10,
				"wins": 5,
				"challenges": 10,
				"maxRating": { "rating": 2000, "track": "DEVELOP" }
			})],
			..Default::default()
		},
		verified: HashSet::from([2]),
		..Default::default()
	}
}

#[tokio::test]
async fn merges_skills_and_stats_onto_profiles() {
	let harness = two_members().build();
	let page = harness
		.service
		.search_members(Some(&Caller::machine()), SearchMembersRequest::default())
		.await
		.expect("Search failed.");

	assert_eq!(page.total, 2);
	assert_eq!(page.result.len(), 2);

	let abc = &page.result[0];
	let xyz = &page.result[1];

	assert_eq!(abc.handle_lower.as_deref(), Some("abc"));
	assert_eq!(
		abc.skills.as_ref().and_then(|skills| skills.get("286")).and_then(|s| s.tag_name.clone()),
		Some("Rust".to_string())
	);
	assert_eq!(abc.stats.as_ref().map(Vec::len), Some(0));
	assert_eq!(abc.number_of_challenges_won, Some(0));
	assert_eq!(abc.verified, Some(false));

	assert!(xyz.skills.as_ref().is_some_and(|skills| skills.is_empty()));
	assert_eq!(xyz.number_of_challenges_won, Some(5));
	assert_eq!(xyz.number_of_challenges_placed, Some(10));
	assert_eq!(
		xyz.max_rating.as_ref().and_then(|max_rating| max_rating.rating_color.as_deref()),
		Some("#FCD617")
	);
	assert_eq!(xyz.stats.as_ref().map(Vec::len), Some(1));
	assert_eq!(xyz.verified, Some(true));
}

#[tokio::test]
async fn email_search_without_caller_is_rejected_before_any_backend_call() {
	let harness = two_members().build();
	let req =
		SearchMembersRequest { email: Some("abc@example.com".to_string()), ..Default::default() };
	let err = harness.service.search_members(None, req).await.expect_err("Expected rejection.");

	assert!(matches!(err, Error::Unauthorized { .. }), "Unexpected error: {err:?}");
	assert_eq!(harness.calls.total(), 0);
}

#[tokio::test]
async fn email_search_without_role_is_a_bad_request() {
	let harness = two_members().build();
	let caller = Caller::member(7, "someone", &["copilot"]);
	let req =
		SearchMembersRequest { email: Some("abc@example.com".to_string()), ..Default::default() };
	let err =
		harness.service.search_members(Some(&caller), req).await.expect_err("Expected rejection.");

	assert!(matches!(err, Error::BadRequest { .. }), "Unexpected error: {err:?}");
	assert_eq!(harness.calls.total(), 0);
}

#[tokio::test]
async fn email_search_with_role_finds_the_member() {
	let harness = two_members().build();
	let caller = Caller::member(7, "someone", &["search by email"]);
	let req =
		SearchMembersRequest { email: Some("xyz@example.com".to_string()), ..Default::default() };
	let page = harness.service.search_members(Some(&caller), req).await.expect("Search failed.");

	assert_eq!(page.total, 1);
	assert_eq!(page.result[0].user_id, Some(2));
}

#[tokio::test]
async fn page_past_the_end_keeps_the_total() {
	let harness = two_members().build();
	let req = SearchMembersRequest { page: Some(3), per_page: Some(1), ..Default::default() };
	let page =
		harness.service.search_members(Some(&Caller::machine()), req).await.expect("Search failed.");

	assert_eq!(page.total, 2);
	assert_eq!(page.page, 3);
	assert!(page.result.is_empty());
}

#[tokio::test]
async fn later_pages_are_filled_for_large_result_sets() {
	let harness = Fixture {
		profiles: (0..120).map(|id| member_doc(id, &format!("m{id:03}"))).collect(),
		..Default::default()
	}
	.build();
	let req = SearchMembersRequest { page: Some(3), per_page: Some(50), ..Default::default() };
	let page =
		harness.service.search_members(Some(&Caller::machine()), req).await.expect("Search failed.");

	assert_eq!(page.total, 120);
	assert_eq!(page.result.len(), 20);
	assert_eq!(page.result[0].handle_lower.as_deref(), Some("m100"));
	assert_eq!(page.result[19].handle_lower.as_deref(), Some("m119"));
}

#[tokio::test]
async fn undecodable_profiles_are_skipped() {
	let mut fixture = two_members();

	fixture
		.profiles
		.push(json!({ "userId": 3, "handle": "Bad", "handleLower": "bad", "firstName": 42 }));

	let harness = fixture.build();
	let page = harness
		.service
		.search_members(Some(&Caller::machine()), SearchMembersRequest::default())
		.await
		.expect("Search failed.");
	let handles =
		page.result.iter().filter_map(|member| member.handle_lower.clone()).collect::<Vec<_>>();

	assert_eq!(page.total, 3);
	assert_eq!(handles, vec!["abc", "xyz"]);
}

#[tokio::test]
async fn autocomplete_skips_undecodable_profiles() {
	let harness = Fixture {
		profiles: vec![
			member_doc(1, "Abc"),
			json!({ "userId": 2, "handle": "Abd", "handleLower": "abd", "lastName": [] }),
		],
		..Default::default()
	}
	.build();
	let req = AutocompleteRequest { term: Some("ab".to_string()), ..Default::default() };
	let page =
		harness.service.autocomplete(Some(&Caller::machine()), req).await.expect("Autocomplete failed.");

	assert_eq!(page.result.len(), 1);
	assert_eq!(page.result[0].handle.as_deref(), Some("Abc"));
}

#[tokio::test]
async fn oversized_page_is_a_bad_request() {
	let harness = two_members().build();
	let req = SearchMembersRequest { per_page: Some(500), ..Default::default() };
	let err = harness.service.search_members(None, req).await.expect_err("Expected rejection.");

	assert!(matches!(err, Error::BadRequest { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn descending_sort_breaks_ties_by_handle() {
	let mut fixture = two_members();

	fixture.profiles.push(member_doc(3, "Mno"));
	fixture.stats.overall.push(json!({ "userId": 3, "handleLower": "mno", "wins": 5 }));

	let harness = fixture.build();
	let req = SearchMembersRequest {
		sort_by: Some("numberOfChallengesWon".to_string()),
		sort_order: Some("desc".to_string()),
		..Default::default()
	};
	let page =
		harness.service.search_members(Some(&Caller::machine()), req).await.expect("Search failed.");
	let handles =
		page.result.iter().filter_map(|member| member.handle_lower.clone()).collect::<Vec<_>>();

	assert_eq!(handles, vec!["mno", "xyz", "abc"]);
}

#[tokio::test]
async fn handle_filter_is_case_insensitive() {
	let harness = two_members().build();
	let req = SearchMembersRequest { handle: Some("XYZ, missing".to_string()), ..Default::default() };
	let page =
		harness.service.search_members(Some(&Caller::machine()), req).await.expect("Search failed.");

	assert_eq!(page.total, 1);
	assert_eq!(page.result[0].handle.as_deref(), Some("Xyz"));
}

#[tokio::test]
async fn non_numeric_user_id_is_a_bad_request() {
	let harness = two_members().build();
	let req = SearchMembersRequest { user_id: Some("1,abc".to_string()), ..Default::default() };
	let err = harness.service.search_members(None, req).await.expect_err("Expected rejection.");

	assert!(matches!(err, Error::BadRequest { .. }), "Unexpected error: {err:?}");
	assert_eq!(harness.calls.total(), 0);
}

#[tokio::test]
async fn anonymous_results_are_redacted() {
	let harness = two_members().build();
	let page = harness
		.service
		.search_members(None, SearchMembersRequest::default())
		.await
		.expect("Search failed.");
	let abc = &page.result[0];

	assert_eq!(abc.email, None);
	assert_eq!(abc.created_by, None);
	assert_eq!(abc.last_name.as_deref(), Some("L"));

	let address = abc.addresses.as_ref().and_then(|addresses| addresses.first()).cloned();

	assert_eq!(address.as_ref().and_then(|address| address.street_addr1.clone()), None);
	assert_eq!(address.and_then(|address| address.city), Some("Springfield".to_string()));
}

#[tokio::test]
async fn admins_see_unredacted_results() {
	let harness = two_members().build();
	let admin = Caller::member(9, "boss", &["administrator"]);
	let page = harness
		.service
		.search_members(Some(&admin), SearchMembersRequest::default())
		.await
		.expect("Search failed.");

	assert_eq!(page.result[0].last_name.as_deref(), Some("Lastname"));
	assert_eq!(page.result[0].created_by.as_deref(), Some("loader"));
	// Email is a communication field as well and needs the autocomplete role.
	assert_eq!(page.result[0].email, None);
}

#[tokio::test]
async fn verification_failure_fails_the_search() {
	let mut fixture = two_members();

	fixture.verification_fails = true;

	let harness = fixture.build();
	let err = harness
		.service
		.search_members(Some(&Caller::machine()), SearchMembersRequest::default())
		.await
		.expect_err("Expected verification failure.");

	assert!(matches!(err, Error::BackendUnavailable { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn verification_respects_the_concurrency_bound() {
	let fixture = Fixture {
		profiles: (1..=12).map(|id| member_doc(id, &format!("user{id:02}"))).collect(),
		..Default::default()
	};
	let mut cfg = test_config();

	cfg.search.verification_concurrency = 3;

	let harness = fixture.build_with(cfg);
	let page = harness
		.service
		.search_members(Some(&Caller::machine()), SearchMembersRequest::default())
		.await
		.expect("Search failed.");

	assert_eq!(page.result.len(), 12);
	assert_eq!(harness.calls.verification.load(Ordering::SeqCst), 12);
	assert!(harness.max_in_flight.load(Ordering::SeqCst) <= 3);
	assert!(page.result.iter().all(|member| member.verified == Some(false)));
}

#[tokio::test]
async fn requested_fields_limit_the_output() {
	let harness = two_members().build();
	let req = SearchMembersRequest { fields: Some("userId,handle".to_string()), ..Default::default() };
	let page =
		harness.service.search_members(Some(&Caller::machine()), req).await.expect("Search failed.");
	let xyz = &page.result[1];

	assert_eq!(xyz.user_id, Some(2));
	assert_eq!(xyz.handle.as_deref(), Some("Xyz"));
	assert_eq!(xyz.skills, None);
	assert_eq!(xyz.verified, None);
	assert_eq!(xyz.max_rating, None);
}

#[tokio::test]
async fn autocomplete_requires_a_caller() {
	let harness = two_members().build();
	let req = AutocompleteRequest { term: Some("ab".to_string()), ..Default::default() };
	let err = harness.service.autocomplete(None, req).await.expect_err("Expected rejection.");

	assert!(matches!(err, Error::Unauthorized { .. }), "Unexpected error: {err:?}");
	assert_eq!(harness.calls.total(), 0);
}

#[tokio::test]
async fn autocomplete_matches_handle_prefix_without_verification() {
	let mut fixture = two_members();

	fixture.profiles.push(member_doc(3, "abd"));

	let harness = fixture.build();
	let caller = Caller::member(7, "someone", &[]);
	let req = AutocompleteRequest { term: Some("AB".to_string()), ..Default::default() };
	let page = harness.service.autocomplete(Some(&caller), req).await.expect("Autocomplete failed.");
	let handles =
		page.result.iter().filter_map(|member| member.handle_lower.clone()).collect::<Vec<_>>();

	assert_eq!(page.total, 2);
	assert_eq!(handles, vec!["abc", "abd"]);
	assert!(page.result.iter().all(|member| member.email.is_none()));
	assert_eq!(harness.calls.verification.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn autocomplete_without_term_is_a_bad_request() {
	let harness = two_members().build();
	let caller = Caller::member(7, "someone", &[]);
	let err = harness
		.service
		.autocomplete(Some(&caller), AutocompleteRequest::default())
		.await
		.expect_err("Expected rejection.");

	assert!(matches!(err, Error::BadRequest { .. }), "Unexpected error: {err:?}");
}
