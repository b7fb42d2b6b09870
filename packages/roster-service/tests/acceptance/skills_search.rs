use std::sync::atomic::Ordering;

use serde_json::json;

use roster_domain::identity::Caller;
use roster_service::{SearchBySkillsRequest, SkillOperator, skills_search::SkillIds};

use super::{Fixture, MemoryStatsData, member_doc};

fn skilled_members() -> Fixture {
	Fixture {
		profiles: vec![member_doc(1, "abc"), member_doc(2, "xyz"), member_doc(3, "mno")],
		skills: vec![
			json!({ "userId": 1, "handleLower": "abc", "skillIds": ["7", "8"] }),
			json!({ "userId": 2, "handleLower": "xyz", "skillIds": ["7"] }),
			json!({ "userId": 3, "handleLower": "mno", "skillIds": ["9"] }),
		],
		..Default::default()
	}
}

#[tokio::test]
async fn empty_skill_list_returns_an_empty_page_without_queries() {
	let harness = skilled_members().build();
	let req = SearchBySkillsRequest {
		skill_id: Some(SkillIds::Many(vec![" ".to_string()])),
		..Default::default()
	};
	let page = harness
		.service
		.search_members_by_skills(Some(&Caller::machine()), req)
		.await
		.expect("Search failed.");

	assert_eq!(page.total, 0);
	assert!(page.result.is_empty());
	assert_eq!(harness.calls.total(), 0);
}

#[tokio::test]
async fn and_operator_requires_every_skill() {
	let harness = skilled_members().build();
	let req = SearchBySkillsRequest {
		skill_id: Some(SkillIds::Many(vec!["7".to_string(), "8".to_string()])),
		..Default::default()
	};
	let page = harness
		.service
		.search_members_by_skills(Some(&Caller::machine()), req)
		.await
		.expect("Search failed.");
	let ids = page.result.iter().filter_map(|member| member.user_id).collect::<Vec<_>>();

	assert_eq!(page.total, 1);
	assert_eq!(ids, vec![1]);
}

#[tokio::test]
async fn or_operator_accepts_any_skill_and_sorts_by_handle() {
	let harness = skilled_members().build();
	let req = SearchBySkillsRequest {
		skill_id: Some(SkillIds::One("8,9".to_string())),
		operator: SkillOperator::Or,
		..Default::default()
	};
	let page = harness
		.service
		.search_members_by_skills(Some(&Caller::machine()), req)
		.await
		.expect("Search failed.");
	let handles =
		page.result.iter().filter_map(|member| member.handle_lower.clone()).collect::<Vec<_>>();

	assert_eq!(page.total, 2);
	assert_eq!(handles, vec!["abc", "mno"]);
	assert_eq!(harness.calls.verification.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unmatched_skills_return_an_empty_page() {
	let harness = skilled_members().build();
	let req =
		SearchBySkillsRequest { skill_id: Some(SkillIds::One("404".to_string())), ..Default::default() };
	let page = harness
		.service
		.search_members_by_skills(Some(&Caller::machine()), req)
		.await
		.expect("Search failed.");

	assert_eq!(page.total, 0);
	assert_eq!(harness.calls.profile.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn every_skill_holder_is_counted_and_paged() {
	let harness = Fixture {
		profiles: (0..120).map(|id| member_doc(id, &format!("m{id:03}"))).collect(),
		skills: (0..120)
			.map(|id| json!({ "userId": id, "handleLower": format!("m{id:03}"), "skillIds": ["7"] }))
			.collect(),
		..Default::default()
	}
	.build();
	let req = SearchBySkillsRequest {
		skill_id: Some(SkillIds::One("7".to_string())),
		page: Some(3),
		per_page: Some(50),
		..Default::default()
	};
	let page = harness
		.service
		.search_members_by_skills(Some(&Caller::machine()), req)
		.await
		.expect("Search failed.");

	assert_eq!(page.total, 120);
	assert_eq!(page.result.len(), 20);
	assert_eq!(page.result[0].handle_lower.as_deref(), Some("m100"));
}

/// Three holders of skill "7" where `xyz` and `mno` tie on both counters.
fn ranked_members() -> Fixture {
	Fixture {
		profiles: vec![member_doc(1, "abc"), member_doc(2, "xyz"), member_doc(3, "mno")],
		skills: vec![
			json!({ "userId": 1, "handleLower": "abc", "skillIds": ["7"] }),
			json!({ "userId": 2, "handleLower": "xyz", "skillIds": ["7"] }),
			json!({ "userId": 3, "handleLower": "mno", "skillIds": ["7"] }),
		],
		stats: MemoryStatsData {
			overall: vec![
				json!({ "userId": 1, "handleLower": "abc", "groupId": 10, "wins": 2, "challenges": 9 }),
				json!({ "userId": 2, "handleLower": "xyz", "groupId": 10, "wins": 5, "challenges": 3 }),
				json!({ "userId": 3, "handleLower": "mno", "groupId": 10, "wins": 5, "challenges": 3 }),
			],
			..Default::default()
		},
		..Default::default()
	}
}

async fn handles_sorted_by(sort_by: &str) -> Vec<String> {
	let harness = ranked_members().build();
	let req = SearchBySkillsRequest {
		skill_id: Some(SkillIds::One("7".to_string())),
		sort_by: Some(sort_by.to_string()),
		sort_order: Some("desc".to_string()),
		..Default::default()
	};
	let page = harness
		.service
		.search_members_by_skills(Some(&Caller::machine()), req)
		.await
		.expect("Search failed.");

	page.result.iter().filter_map(|member| member.handle_lower.clone()).collect()
}

#[tokio::test]
async fn descending_counter_sort_breaks_ties_by_handle() {
	assert_eq!(handles_sorted_by("numberOfChallengesWon").await, vec!["mno", "xyz", "abc"]);
	assert_eq!(handles_sorted_by("numberOfChallengesPlaced").await, vec!["abc", "mno", "xyz"]);
}
