use serde_json::json;

use roster_domain::identity::Caller;
use roster_service::{Error, StatKind, StatsRequest};

use super::{Fixture, Harness, MemoryStatsData, member_doc};

fn with_member(stats: MemoryStatsData) -> Harness {
	let harness = Fixture { stats, ..Default::default() }.build();

	harness.store.insert("members", "abc", "", member_doc(1, "Abc"));

	harness
}

fn groups(raw: &str) -> StatsRequest {
	StatsRequest { group_ids: Some(raw.to_string()), fields: None }
}

#[tokio::test]
async fn default_group_index_miss_reads_the_public_table() {
	let harness = with_member(MemoryStatsData::default());

	harness.store.insert(
		"member_stats",
		"1",
		"",
		json!({ "userId": 1, "handleLower": "abc", "groupId": 99, "wins": 3 }),
	);
	harness.store.insert("member_stats_private", "1", "", json!({ "userId": 1, "wins": 300 }));

	let records = harness
		.service
		.get_member_stats(None, "ABC", groups("10"))
		.await
		.expect("Stats lookup failed.");

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].group_id, Some(10));
	assert_eq!(records[0].wins, Some(3));
}

#[tokio::test]
async fn the_member_reads_the_private_table() {
	let harness = with_member(MemoryStatsData::default());

	harness.store.insert("member_stats", "1", "", json!({ "userId": 1, "wins": 3 }));
	harness.store.insert("member_stats_private", "1", "", json!({ "userId": 1, "wins": 300 }));

	let caller = Caller::member(1, "Abc", &[]);
	let records = harness
		.service
		.get_member_stats(Some(&caller), "abc", StatsRequest::default())
		.await
		.expect("Stats lookup failed.");

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].wins, Some(300));
	assert_eq!(records[0].group_id, Some(10));
}

#[tokio::test]
async fn other_groups_fall_back_to_the_group_table_in_request_order() {
	let mut stats = MemoryStatsData::default();

	stats.by_key.insert(
		(StatKind::Member, 1, 20),
		json!({
			"userId": 1,
			"groupId": 20,
			"maxRating": { "rating": 1000 },
			"DEVELOP": "{\"challenges\": 4}"
		}),
	);

	let harness = with_member(stats);

	harness.store.insert("member_group_stats", "1", "30", json!({ "userId": 1, "groupId": 30 }));

	let records = harness
		.service
		.get_member_stats(None, "abc", groups("30,404,20"))
		.await
		.expect("Stats lookup failed.");
	let group_ids = records.iter().filter_map(|record| record.group_id).collect::<Vec<_>>();

	assert_eq!(group_ids, vec![30, 20]);
	assert_eq!(
		records[1].max_rating.as_ref().and_then(|max_rating| max_rating.rating_color.as_deref()),
		Some("#69C329")
	);
	assert_eq!(records[1].develop, Some(json!({ "challenges": 4 })));
}

#[tokio::test]
async fn index_failure_is_not_treated_as_a_miss() {
	let mut stats = MemoryStatsData::default();

	stats.failing.insert((1, 10));

	let harness = with_member(stats);

	harness.store.insert("member_stats", "1", "", json!({ "userId": 1, "wins": 3 }));

	let err = harness
		.service
		.get_member_stats(None, "abc", StatsRequest::default())
		.await
		.expect_err("Expected index failure.");

	assert!(matches!(err, Error::BackendUnavailable { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn unknown_member_is_not_found() {
	let harness = with_member(MemoryStatsData::default());
	let err = harness
		.service
		.get_member_stats(None, "nobody", StatsRequest::default())
		.await
		.expect_err("Expected missing member.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn malformed_group_ids_are_a_bad_request() {
	let harness = with_member(MemoryStatsData::default());
	let err = harness
		.service
		.get_member_stats(None, "abc", groups("10,ten"))
		.await
		.expect_err("Expected rejection.");

	assert!(matches!(err, Error::BadRequest { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn history_stats_use_their_own_tables() {
	let mut stats = MemoryStatsData::default();

	stats.by_key.insert((StatKind::Member, 1, 10), json!({ "userId": 1, "groupId": 10 }));

	let harness = with_member(stats);

	harness.store.insert(
		"member_history_stats",
		"1",
		"",
		json!({ "userId": 1, "DEVELOP": { "subTracks": [] } }),
	);

	let req = StatsRequest { group_ids: None, fields: Some("userId,groupId".to_string()) };
	let records =
		harness.service.get_history_stats(None, "abc", req).await.expect("History lookup failed.");

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].user_id, Some(1));
	assert_eq!(records[0].group_id, Some(10));
	assert_eq!(records[0].develop, None);
}
