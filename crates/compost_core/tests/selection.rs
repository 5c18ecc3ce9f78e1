use compost_core::{decide_write, ConversationId, SelectionSet, WriteContext, WriteDecision};
use pretty_assertions::assert_eq;

fn set(ids: &[&str]) -> SelectionSet {
    ids.iter().filter_map(ConversationId::new).collect()
}

const MOUNTED: WriteContext = WriteContext {
    guard_active: false,
    controls_mounted: true,
};

#[test]
fn persisted_json_is_a_plain_array() {
    let selection = set(&["def", "abc"]);
    let json = selection.to_json().unwrap();
    assert_eq!(json, r#"["abc","def"]"#);
    assert_eq!(SelectionSet::from_json(&json).unwrap(), selection);
}

#[test]
fn blank_entries_are_dropped_and_garbage_is_an_error() {
    let parsed = SelectionSet::from_json(r#"["abc", "", "  "]"#).unwrap();
    assert_eq!(parsed, set(&["abc"]));

    assert!(SelectionSet::from_json("{not json").is_err());
    assert!(SelectionSet::from_json(r#"{"abc": true}"#).is_err());
}

#[test]
fn non_empty_selection_is_written() {
    assert_eq!(decide_write(&set(&[]), &set(&["a"]), MOUNTED), WriteDecision::Write);
    assert_eq!(decide_write(&set(&["a"]), &set(&["b"]), MOUNTED), WriteDecision::Write);
}

#[test]
fn clearing_a_selection_is_written() {
    assert_eq!(decide_write(&set(&["a"]), &set(&[]), MOUNTED), WriteDecision::Write);
}

#[test]
fn empty_over_empty_is_skipped() {
    assert_eq!(
        decide_write(&set(&[]), &set(&[]), MOUNTED),
        WriteDecision::NothingToWrite
    );
}

#[test]
fn nothing_mounted_means_unknown() {
    let context = WriteContext {
        guard_active: false,
        controls_mounted: false,
    };
    assert_eq!(
        decide_write(&set(&["a", "b"]), &set(&[]), context),
        WriteDecision::UnknownState
    );
}

#[test]
fn guard_suppresses_every_write() {
    assert_eq!(
        decide_write(&set(&[]), &set(&["a"]), WriteContext::explicit(true)),
        WriteDecision::SuppressedByGuard
    );
}

#[test]
fn union_keeps_both_sides() {
    let merged = set(&["a", "b"]).union(&set(&["b", "c"]));
    assert_eq!(merged, set(&["a", "b", "c"]));
    assert_eq!(merged.len(), 3);
}
