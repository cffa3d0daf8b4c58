mod common;

use std::rc::Rc;

use mirror_core::{
    Entry, JsonMeta, KeyOrder, MetaSource, RecordDraft, RecordMirror, RecordOptions, Reconciliation,
};
use mirror_util::Identity;
use serde_json::json;

fn keys(mirror: &RecordMirror<String, i32>) -> Vec<String> {
    mirror.items().iter().map(|item| item.map_key.clone()).collect()
}

fn flags(mirror: &RecordMirror<String, i32>) -> Vec<(bool, bool)> {
    mirror
        .items()
        .iter()
        .map(|item| (item.duplicated, item.ignored))
        .collect()
}

fn identities(mirror: &RecordMirror<String, i32>) -> Vec<Identity> {
    mirror.items().iter().map(|item| item.identity.clone()).collect()
}

#[test]
fn test_append_existing_key_is_ignored() {
    let (mirror, host) = common::record(&[("x", 1), ("y", 2)]);

    mirror.append_item("x".to_string(), 3, None);

    let items = mirror.items();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2].map_key, "x");
    assert!(items[2].ignored);
    assert!(items[0].duplicated && items[2].duplicated);
    assert!(!items[0].ignored);
    assert!(!items[1].duplicated);
    assert_eq!(host.current(), common::map(&[("x", 1), ("y", 2)]));
    assert_eq!(host.pushes.get(), 1);
    assert_eq!(mirror.observe(Some(&host.current())), Reconciliation::Unchanged);
}

#[test]
fn test_append_new_key_goes_live() {
    let (mirror, host) = common::record(&[("x", 1)]);
    let reserved = mirror.append_identity();

    mirror.append_item("z".to_string(), 9, None);

    let item = mirror.get(1).unwrap();
    assert_eq!(item.identity, reserved);
    assert!(!item.ignored && !item.duplicated);
    assert_eq!(host.current(), common::map(&[("x", 1), ("z", 9)]));
}

#[test]
fn test_removing_winner_promotes_duplicate() {
    let (mirror, host) = common::record(&[("x", 1), ("y", 2)]);
    mirror.append_item("x".to_string(), 3, None);

    mirror.remove_item(0);

    assert_eq!(keys(&mirror), vec!["y", "x"]);
    assert_eq!(flags(&mirror), vec![(false, false), (false, false)]);
    assert_eq!(host.current(), common::map(&[("y", 2), ("x", 3)]));
}

#[test]
fn test_editing_ignored_item_does_not_leak() {
    let (mirror, host) = common::record(&[("x", 1)]);
    mirror.append_item("x".to_string(), 2, None);

    mirror.set_value(1, 20, None);

    assert_eq!(host.current(), common::map(&[("x", 1)]));
    assert_eq!(mirror.get(1).unwrap().value, 20);
    assert_eq!(mirror.observe(Some(&host.current())), Reconciliation::Unchanged);
}

#[test]
fn test_set_map_key_onto_occupied_key_loses() {
    let (mirror, host) = common::record(&[("a", 1), ("b", 2)]);

    mirror.set_map_key(1, "a".to_string(), None);

    assert_eq!(keys(&mirror), vec!["a", "a"]);
    assert_eq!(flags(&mirror), vec![(true, false), (true, true)]);
    assert_eq!(host.current(), common::map(&[("a", 1)]));
}

#[test]
fn test_set_map_key_to_free_key() {
    let (mirror, host) = common::record(&[("a", 1), ("b", 2)]);
    let before = identities(&mirror);

    mirror.set_map_key(1, "c".to_string(), Some(renamed_meta()));

    assert_eq!(host.current(), common::map(&[("a", 1), ("c", 2)]));
    assert_eq!(identities(&mirror), before);
    assert_eq!(mirror.get(1).unwrap().meta["renamed"], json!(true));
    assert!(!mirror.get(1).unwrap().ignored);
}

fn renamed_meta() -> JsonMeta {
    json!({"renamed": true}).as_object().cloned().unwrap_or_default()
}

#[test]
fn test_renaming_winner_hands_key_to_duplicate() {
    let (mirror, host) = common::record(&[("x", 1)]);
    mirror.append_item("x".to_string(), 2, None);

    mirror.set_map_key(0, "w".to_string(), None);

    assert_eq!(flags(&mirror), vec![(false, false), (false, false)]);
    assert_eq!(host.current(), common::map(&[("w", 1), ("x", 2)]));
}

#[test]
fn test_move_keeps_winner() {
    let (mirror, host) = common::record(&[("x", 1), ("y", 2)]);
    mirror.append_item("x".to_string(), 3, None);

    mirror.move_item(2, 0);

    assert_eq!(keys(&mirror), vec!["x", "x", "y"]);
    assert_eq!(flags(&mirror), vec![(true, true), (true, false), (false, false)]);
    assert_eq!(host.current(), common::map(&[("x", 1), ("y", 2)]));
}

#[test]
fn test_foreign_record_rebuilds() {
    let (mirror, host) = common::record(&[("x", 1), ("y", 2)]);
    mirror.append_item("x".to_string(), 3, None);
    let before = identities(&mirror);

    host.replace(common::map(&[("x", 1), ("y", 5)]));
    assert_eq!(mirror.observe(Some(&host.current())), Reconciliation::Rebuilt);

    assert_eq!(keys(&mirror), vec!["x", "y"]);
    assert!(identities(&mirror).iter().all(|id| !before.contains(id)));
    assert_eq!(flags(&mirror), vec![(false, false), (false, false)]);
}

#[test]
fn test_missing_or_extra_key_rebuilds() {
    let (mirror, _host) = common::record(&[("x", 1), ("y", 2)]);
    assert_eq!(mirror.observe(Some(&common::map(&[("x", 1)]))), Reconciliation::Rebuilt);

    let (mirror, _host) = common::record(&[("x", 1)]);
    assert_eq!(
        mirror.observe(Some(&common::map(&[("x", 1), ("q", 0)]))),
        Reconciliation::Rebuilt
    );
}

#[test]
fn test_keyed_compatibility_ignores_order() {
    let (mirror, _host) = common::record(&[("x", 1), ("y", 2)]);
    let before = identities(&mirror);
    assert_eq!(
        mirror.observe(Some(&common::map(&[("y", 2), ("x", 1)]))),
        Reconciliation::Unchanged
    );
    assert_eq!(identities(&mirror), before);
}

#[test]
fn test_absent_record_is_empty() {
    let (mirror, _host) = common::record(&[]);
    assert_eq!(mirror.observe(None), Reconciliation::Unchanged);
    assert!(mirror.is_empty());
}

#[test]
fn test_lexical_order_on_rebuild() {
    let options = RecordOptions::default().order(KeyOrder::Lexical);
    let (mirror, _host) = common::record_with(&[("b", 1), ("c", 2), ("a", 3)], options);
    assert_eq!(keys(&mirror), vec!["a", "b", "c"]);
}

#[test]
fn test_custom_order_on_rebuild() {
    let options = RecordOptions::default()
        .order(KeyOrder::custom(|(_, a): (&String, &i32), (_, b): (&String, &i32)| b.cmp(a)));
    let (mirror, host) = common::record_with(&[("b", 1), ("c", 2), ("a", 3)], options);
    assert_eq!(keys(&mirror), vec!["a", "c", "b"]);

    host.replace(common::map(&[("m", 1), ("n", 7)]));
    mirror.observe(Some(&host.current()));
    assert_eq!(keys(&mirror), vec!["n", "m"]);
}

#[test]
fn test_insertion_order_on_rebuild() {
    let (mirror, _host) = common::record(&[("b", 1), ("a", 2)]);
    assert_eq!(keys(&mirror), vec!["b", "a"]);
}

#[test]
fn test_insert_item_with_key() {
    let (mirror, host) = common::record(&[("a", 1), ("c", 3)]);
    mirror.insert_item(1, "b".to_string(), 2, None);
    assert_eq!(keys(&mirror), vec!["a", "b", "c"]);

    let derived: Vec<(String, i32)> = host.current().into_iter().collect();
    assert_eq!(
        derived,
        vec![("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]
    );

    mirror.insert_item(9, "z".to_string(), 0, None);
    assert_eq!(mirror.len(), 3);
}

#[test]
fn test_set_items_favours_existing_key() {
    let (mirror, host) = common::record(&[("x", 1), ("y", 2)]);

    mirror.set_items(|items| {
        vec![
            Entry::New(RecordDraft::new("x".to_string(), 100)),
            Entry::Keep(items[0].clone()),
            Entry::Keep(items[1].clone()),
        ]
    });

    assert_eq!(keys(&mirror), vec!["x", "x", "y"]);
    assert_eq!(flags(&mirror), vec![(true, true), (true, false), (false, false)]);
    assert_eq!(host.current(), common::map(&[("x", 1), ("y", 2)]));
}

#[test]
fn test_set_metas_skips_ignored_items() {
    let (mirror, host) = common::record(&[("x", 1)]);
    mirror.append_item("x".to_string(), 2, None);
    mirror.set_meta(1, &"note".to_string(), Some(json!("stale")));

    mirror.set_metas(
        "note".to_string(),
        MetaSource::Positional(vec![Some(json!("a")), Some(json!("b"))]),
    );

    assert_eq!(mirror.get(0).unwrap().meta["note"], json!("a"));
    assert!(mirror.get(1).unwrap().meta.get("note").is_none());
    assert_eq!(host.pushes.get(), 1);
}

#[test]
fn test_init_meta_receives_key() {
    let options = RecordOptions::default().init_meta(|value: &i32, key: &String| {
        json!({"label": format!("{key}={value}")})
            .as_object()
            .cloned()
            .unwrap_or_default()
    });
    let (mirror, _host) = common::record_with(&[("x", 1)], options);
    assert_eq!(mirror.get(0).unwrap().meta["label"], json!("x=1"));

    mirror.append_item("y".to_string(), 2, None);
    assert_eq!(mirror.get(1).unwrap().meta["label"], json!("y=2"));
}

#[test]
fn test_unaffected_items_keep_allocation() {
    let (mirror, _host) = common::record(&[("a", 1), ("b", 2), ("c", 3)]);
    let before = mirror.items();

    mirror.append_item("b".to_string(), 9, None);

    let after = mirror.items();
    assert!(Rc::ptr_eq(&before[0], &after[0]));
    assert!(!Rc::ptr_eq(&before[1], &after[1]));
    assert!(Rc::ptr_eq(&before[2], &after[2]));
}

#[test]
fn test_value_setter_on_record() {
    let (mirror, host) = common::record(&[("a", 1)]);
    let setter = mirror.value_setter(0);
    setter.update(|value| value * 10);
    assert_eq!(host.current(), common::map(&[("a", 10)]));
    assert_eq!(setter, mirror.value_setter(0));
}
