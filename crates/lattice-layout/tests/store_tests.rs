//! Integration tests for state store creation, merging, syncing and export.

use lattice_layout::prelude::*;
use lattice_layout::ATTRIBUTE_HASH_FIELD;
use lattice_layout_core::attribute_hash;
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("lattice_layout=trace,lattice_layout_core=trace")
        .with_test_writer()
        .try_init();
}

fn layout() -> Value {
    json!([
        { "type": "settings", "attributes": { "theme": "dark" } },
        { "type": "tab", "id": "tab-a", "attributes": { "label": "A" } },
        { "type": "tab", "id": "tab-b", "attributes": { "label": "B" } },
        {
            "type": "panel",
            "id": "panel",
            "attributes": { "width": 200 },
            "children": [{ "type": "field", "id": "field", "attributes": { "name": "email" } }]
        }
    ])
}

fn model() -> LayoutModel {
    LayoutModel::new(&layout(), LayoutOptions::default()).unwrap()
}

#[test]
fn test_create_store_seeds_every_flat_component() {
    init_tracing();
    let model = model();
    model.create_store(DefaultState::value(json!({ "open": false })));

    let snapshot = model.store_snapshot().unwrap();
    let store = snapshot.as_object().unwrap();
    assert_eq!(store.len(), model.flat_components().len());
    for component in model.flat_components() {
        let record = &store[component.id().as_str()];
        assert_eq!(record["open"], json!(false));
        assert_eq!(record[ATTRIBUTE_HASH_FIELD], json!(attribute_hash(component.attributes())));
    }

    // The pulled settings component has no state.
    let settings_id = model.settings().component_id().unwrap();
    assert!(model.get_component_state(settings_id.as_str()).is_none());
}

#[test]
fn test_create_store_with_factory() {
    let model = model();
    model.create_store(DefaultState::factory(|component| {
        json!({ "label": component.attribute("label").cloned().unwrap_or(Value::Null) })
    }));

    assert_eq!(model.get_component_state("tab-b").unwrap().get()["label"], json!("B"));
    assert_eq!(model.get_component_state("panel").unwrap().get()["label"], Value::Null);
}

#[test]
fn test_create_store_returns_model_for_chaining() {
    let model = model();
    let exported = model
        .create_store(DefaultState::default())
        .export_store(false)
        .unwrap();
    assert!(exported.starts_with("{\"tab-a\":"));
}

#[test]
fn test_merge_keeps_saved_edits_when_attributes_unchanged() {
    let model = model();
    model.create_store(DefaultState::value(json!({ "value": "" })));
    model
        .get_component_state("field")
        .unwrap()
        .update(|state| state["value"] = json!("me@example.com"));
    let saved = model.export_store(true).unwrap();

    let reloaded = LayoutModel::new(&layout(), LayoutOptions::default()).unwrap();
    reloaded.create_store(DefaultState::value(json!({ "value": "" })));
    reloaded.merge_store_json(&saved).unwrap();

    assert_eq!(
        reloaded.get_component_state("field").unwrap().get()["value"],
        json!("me@example.com")
    );
}

#[test]
fn test_merge_discards_saved_edits_when_attributes_changed() {
    let model = model();
    model.create_store(DefaultState::value(json!({ "value": "" })));
    model.get_component_state("field").unwrap().update(|state| {
        state["value"] = json!("stale");
        state["touched"] = json!(true);
    });
    let saved: Value = serde_json::from_str(&model.export_store(false).unwrap()).unwrap();

    let mut edited = layout();
    edited[3]["children"][0]["attributes"]["name"] = json!("phone");
    let reloaded = LayoutModel::new(&edited, LayoutOptions::default()).unwrap();
    reloaded.create_store(DefaultState::value(json!({ "value": "" })));
    reloaded.merge_store(&saved);

    let field = reloaded.get_component_state("field").unwrap().get();
    assert_eq!(field["value"], json!(""));
    // Keys only present in the saved record survive.
    assert_eq!(field["touched"], json!(true));
    assert_eq!(
        field[ATTRIBUTE_HASH_FIELD],
        json!(attribute_hash(reloaded.component("field").unwrap().attributes()))
    );

    // Untouched components keep their saved values.
    assert_eq!(reloaded.get_component_state("panel").unwrap().get(), saved["panel"]);
}

#[test]
fn test_merge_precedence_examples() {
    let model = LayoutModel::new(&json!([{ "type": "block", "id": "c" }]), LayoutOptions::default()).unwrap();

    model.create_store(DefaultState::default());
    model.set_component_state("c", json!({ "x": 1, "__attributes__": "H" })).unwrap();
    model.merge_store(&json!({ "c": { "x": 2, "y": 9, "__attributes__": "H" } }));
    assert_eq!(
        model.get_component_state("c").unwrap().get(),
        json!({ "x": 2, "y": 9, "__attributes__": "H" })
    );

    model.set_component_state("c", json!({ "x": 1, "__attributes__": "H2" })).unwrap();
    model.merge_store(&json!({ "c": { "x": 2, "y": 9, "__attributes__": "H1" } }));
    assert_eq!(
        model.get_component_state("c").unwrap().get(),
        json!({ "x": 1, "y": 9, "__attributes__": "H2" })
    );
}

#[test]
fn test_merge_drops_unknown_ids() {
    let model = model();
    model.create_store(DefaultState::default());
    model.merge_store(&json!({ "removed-component": { "x": 1 } }));

    let snapshot = model.store_snapshot().unwrap();
    assert!(snapshot.get("removed-component").is_none());
    assert_eq!(snapshot.as_object().unwrap().len(), model.flat_components().len());
}

#[test]
fn test_merge_with_invalid_argument_is_noop() {
    init_tracing();
    let model = model();
    model.create_store(DefaultState::value(json!({ "n": 1 })));
    let before = model.store_snapshot();

    model.merge_store(&Value::Null);
    model.merge_store(&json!([1, 2, 3]));
    model.merge_store(&json!("text"));

    assert_eq!(model.store_snapshot(), before);
}

#[test]
fn test_merge_copies_records() {
    let model = model();
    model.create_store(DefaultState::default());
    let incoming = json!({ "tab-a": { "nested": { "k": 1 } } });
    model.merge_store(&incoming);

    model
        .get_component_state("tab-a")
        .unwrap()
        .update(|state| state["nested"]["k"] = json!(2));
    assert_eq!(incoming["tab-a"]["nested"]["k"], json!(1));
}

#[test]
fn test_get_unknown_component_state() {
    let model = model();
    model.create_store(DefaultState::default());
    assert!(model.get_component_state("nope").is_none());
}

#[test]
fn test_set_component_state_returns_written_value() {
    let model = model();
    model.create_store(DefaultState::default());

    let written = model.set_component_state("tab-a", json!({ "selected": true })).unwrap();
    assert_eq!(written.get(), json!({ "selected": true }));
    assert_eq!(model.get_component_state("tab-a").unwrap().get(), json!({ "selected": true }));
}

#[test]
fn test_sync_aliases_state() {
    let model = model();
    model.create_store(DefaultState::value(json!({ "selected": false })));
    let tabs = model.components().group_by_type("tab");
    model.sync_component_states(tabs).unwrap();

    let a = model.get_component_state("tab-a").unwrap();
    let b = model.get_component_state("tab-b").unwrap();
    assert!(a.ptr_eq(&b));

    a.update(|state| state["selected"] = json!(true));
    assert_eq!(b.get()["selected"], json!(true));
    assert_eq!(model.get_component_state("tab-b").unwrap().get()["selected"], json!(true));
}

#[test]
fn test_sync_takes_first_component_state() {
    let model = model();
    model.create_store(DefaultState::factory(|component| json!({ "origin": component.id() })));
    model.sync_component_ids(["panel", "tab-a", "field"]).unwrap();

    for id in ["panel", "tab-a", "field"] {
        assert_eq!(model.get_component_state(id).unwrap().get()["origin"], json!("panel"));
    }
    assert_eq!(model.get_component_state("tab-b").unwrap().get()["origin"], json!("tab-b"));
}

#[test]
fn test_sync_accepts_tree() {
    let model = LayoutModel::new(
        &json!([{ "type": "a", "children": [{ "type": "b" }] }, { "type": "c" }]),
        LayoutOptions::default().with_suppress_warnings(true),
    )
    .unwrap();
    model.create_store(DefaultState::default());
    model.sync_component_states(model.components()).unwrap();

    let first = model.get_component_state("0").unwrap();
    assert!(first.ptr_eq(&model.get_component_state("1").unwrap()));
    assert!(!first.ptr_eq(&model.get_component_state("0.0").unwrap()));
}

#[test]
fn test_sync_from_stateless_component_then_merge() {
    let model = model();
    model.create_store(DefaultState::value(json!({ "open": false })));
    let saved: Value = serde_json::from_str(&model.export_store(false).unwrap()).unwrap();

    model.sync_component_ids(["unknown", "tab-a", "tab-b"]).unwrap();
    assert!(model.get_component_state("tab-a").is_none());
    assert!(model.get_component_state("tab-b").is_none());
    assert_eq!(model.with_store(|store| store.len()), Some(2));

    model.merge_store(&saved);
    assert_eq!(model.get_component_state("tab-a").unwrap().get(), saved["tab-a"]);
    assert_eq!(model.get_component_state("tab-b").unwrap().get(), saved["tab-b"]);
}

#[test]
fn test_sync_empty_selection_fails() {
    let model = model();
    model.create_store(DefaultState::default());

    let empty: Vec<&Component> = Vec::new();
    assert!(matches!(model.sync_component_states(empty), Err(LayoutError::EmptySelection)));
}

#[test]
fn test_sync_is_broken_by_store_replacement() {
    let model = model();
    model.create_store(DefaultState::value(json!({ "n": 0 })));
    model.sync_component_ids(["tab-a", "tab-b"]).unwrap();

    model.merge_store(&json!({}));
    let a = model.get_component_state("tab-a").unwrap();
    a.update(|state| state["n"] = json!(1));
    assert_eq!(model.get_component_state("tab-b").unwrap().get()["n"], json!(0));

    model.sync_component_ids(["tab-a", "tab-b"]).unwrap();
    model.create_store(DefaultState::value(json!({ "n": 0 })));
    model.get_component_state("tab-a").unwrap().update(|state| state["n"] = json!(5));
    assert_eq!(model.get_component_state("tab-b").unwrap().get()["n"], json!(0));
}

#[test]
fn test_set_breaks_alias_for_one_id_only() {
    let model = model();
    model.create_store(DefaultState::default());
    model.sync_component_ids(["tab-a", "tab-b", "panel"]).unwrap();

    model.set_component_state("tab-b", json!({ "own": true })).unwrap();
    let a = model.get_component_state("tab-a").unwrap();
    assert!(a.ptr_eq(&model.get_component_state("panel").unwrap()));
    assert!(!a.ptr_eq(&model.get_component_state("tab-b").unwrap()));
}

#[test]
fn test_export_round_trip() {
    let model = model();
    model.create_store(DefaultState::value(json!({ "list": [1, 2], "nested": { "ok": true } })));

    let compact = model.export_store(false).unwrap();
    assert!(!compact.contains('\n'));
    let parsed: Value = serde_json::from_str(&compact).unwrap();
    assert_eq!(Some(parsed), model.store_snapshot());

    let pretty = model.export_store(true).unwrap();
    assert!(pretty.contains("\n\t\"tab-a\": {"));
    let parsed: Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(Some(parsed), model.store_snapshot());
}

#[test]
fn test_export_preserves_flat_order() {
    let model = model();
    model.create_store(DefaultState::default());

    let exported = model.export_store(false).unwrap();
    let positions: Vec<usize> = ["tab-a", "tab-b", "panel", "field"]
        .iter()
        .map(|id| exported.find(&format!("\"{id}\":")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_with_store_query() {
    let model = model();
    assert!(model.with_store(|store| store.len()).is_none());

    model.create_store(DefaultState::default());
    assert_eq!(model.with_store(|store| store.len()), Some(4));
    assert_eq!(
        model.with_store(|store| store.ids().map(|id| id.to_string()).collect::<Vec<_>>()),
        Some(vec!["tab-a".into(), "tab-b".into(), "panel".into(), "field".into()])
    );
}
