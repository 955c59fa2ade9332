//! Engine Integration Tests
//!
//! Exercises the resolver, detector and trigger through the public API:
//! - timeline completeness, uniqueness, ordering and pairing rules
//! - request/response pairing, first-step input and forced advancement
//! - tolerance of malformed snapshots

use std::collections::HashSet;

use ondc_core::{FlowMap, FormConfig, FormField, PairedStep, Step, StepKey};
use ondc_runtime::{find_pending_input, resolve, should_auto_proceed, InMemoryDirectory};

mod common;

fn assert_timeline_invariants(map: &FlowMap, rows: &[PairedStep]) {
    let distinct: HashSet<StepKey> = map.steps().map(Step::key).collect();

    let mut seen = HashSet::new();
    for row in rows {
        for key in row.keys() {
            assert!(seen.insert(key.clone()), "{} appears twice", key);
        }
    }
    assert_eq!(seen, distinct, "every occurrence lands in exactly one row");

    for pair in rows.windows(2) {
        assert!(pair[0].first.index <= pair[1].first.index);
    }

    for row in rows {
        if let Some(ref second) = row.second {
            match row.first.pair_action_id {
                Some(ref pair_id) => assert_eq!(&second.action_id, pair_id),
                None => assert_eq!(
                    second.pair_action_id.as_deref(),
                    Some(row.first.action_id.as_str())
                ),
            }
        }
    }
}

fn messy_flow_map() -> FlowMap {
    FlowMap::new(vec![
        Step::new("on_select", 3, "COMPLETE").with_pair("select"),
        Step::new("search", 0, "COMPLETE"),
        Step::new("on_search", 1, "COMPLETE").with_pair("search"),
        Step::new("select", 2, "COMPLETE").with_pair("on_select"),
        Step::new("search", 4, "COMPLETE"),
        Step::new("on_search", 5, "RESPONDING").with_pair("search"),
        Step::new("on_status", 9, "COMPLETE").with_pair("status"),
    ])
    .with_missed_steps(vec![
        Step::new("init", 6, "SKIPPED"),
        Step::new("on_init", 7, "SKIPPED").with_pair("init"),
        Step::new("search", 4, "COMPLETE"),
        Step::new("track", 8, "SKIPPED").with_pair("on_track"),
    ])
}

// ============================================================================
// Resolver
// ============================================================================

#[test]
fn test_search_pair_renders_single_row() {
    let map = FlowMap::new(vec![
        Step::new("search", 0, "COMPLETE"),
        Step::new("on_search", 1, "COMPLETE").with_pair("search"),
    ]);

    let rows = resolve(&map);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].first.action_id, "search");
    assert_eq!(rows[0].second.as_ref().unwrap().action_id, "on_search");
    assert_timeline_invariants(&map, &rows);
}

#[test]
fn test_timeline_invariants_on_unordered_input() {
    let map = messy_flow_map();
    let rows = resolve(&map);

    assert_timeline_invariants(&map, &rows);

    let summary: Vec<(String, Option<String>)> = rows
        .iter()
        .map(|r| {
            (
                r.first.key().to_string(),
                r.second.as_ref().map(|s| s.key().to_string()),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("search#0".to_string(), Some("on_search#1".to_string())),
            // on_select is listed first, so it leads its row
            ("on_select#3".to_string(), Some("select#2".to_string())),
            ("search#4".to_string(), Some("on_search#5".to_string())),
            ("init#6".to_string(), Some("on_init#7".to_string())),
            ("track#8".to_string(), None),
            ("on_status#9".to_string(), None),
        ]
    );
}

#[test]
fn test_resolver_is_idempotent() {
    let map = messy_flow_map();
    assert_eq!(resolve(&map), resolve(&map));
}

#[test]
fn test_resolver_does_not_mutate_snapshot() {
    let map = messy_flow_map();
    let before = map.clone();
    let _ = resolve(&map);
    assert_eq!(map, before);
}

#[test]
fn test_malformed_snapshot_renders_empty() {
    let map = FlowMap::from_json_str(r#"{"reference_data": {"catalog": []}}"#).unwrap();
    assert!(resolve(&map).is_empty());
    assert!(find_pending_input(&map, "f1").is_none());

    let map = FlowMap::from_json_str(r#"{"sequence": null, "missedSteps": null}"#).unwrap();
    assert!(resolve(&map).is_empty());
}

#[test]
fn test_resolves_backend_json() {
    let map = FlowMap::from_json_str(
        r#"{
            "sequence": [
                {"actionId": "on_search", "pairActionId": "search", "index": 1, "status": "COMPLETE"},
                {"actionId": "search", "index": 0, "status": "COMPLETE"},
                {"actionId": "select", "index": 2, "status": "LISTENING", "actionType": "select"}
            ],
            "missedSteps": [],
            "activeFlow": "RET10_FLOW_1"
        }"#,
    )
    .unwrap();

    let rows = resolve(&map);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].first.action_id, "on_search");
    assert_eq!(rows[1].first.action_id, "select");
    assert_eq!(rows[1].first.extra["actionType"], "select");
    assert_timeline_invariants(&map, &rows);
}

// ============================================================================
// Detector
// ============================================================================

#[test]
fn test_first_step_never_prompts() {
    let form = FormConfig::new(vec![FormField::new("query", "text")]);
    let map = FlowMap::new(vec![Step::new("search", 0, "INPUT-REQUIRED").with_input(form)])
        .with_active_flow("f1");

    let pending = find_pending_input(&map, "f1");
    assert!(!pending.requires_form());
    assert!(!pending.should_auto_submit);
}

#[test]
fn test_detector_surfaces_form_unmodified() {
    let map = common::flow_waiting_for_select("f1");
    let pending = find_pending_input(&map, "f1");

    assert_eq!(pending.step, Some(StepKey::new("select", 2)));
    assert_eq!(pending.form_config, Some(common::select_form()));
    assert!(!pending.should_auto_submit);
}

#[test]
fn test_detector_auto_submit_only_on_active_flow() {
    let map = common::flow_with_zero_field_step("f1");
    assert!(find_pending_input(&map, "f1").should_auto_submit);
    assert!(!find_pending_input(&map, "f2").should_auto_submit);
}

// ============================================================================
// Trigger
// ============================================================================

#[test]
fn test_force_proceed() {
    let directory = InMemoryDirectory::new();
    directory.upsert("s1", "f1", "txn-42");

    let map = common::flow_forcing_proceed("f1");
    assert_eq!(
        should_auto_proceed(&map, "s1", "f1", &directory),
        Some("txn-42".to_string())
    );

    let mut not_forced = map.clone();
    not_forced.sequence[1].force_proceed = Some(false);
    assert_eq!(should_auto_proceed(&not_forced, "s1", "f1", &directory), None);

    let mut absent = map;
    absent.sequence[1].force_proceed = None;
    assert_eq!(should_auto_proceed(&absent, "s1", "f1", &directory), None);
}
