use super::{item_model, row};
use datastore::{
    CompareOp, DataStore, Filter, Record, SortSpec, StoreEvent, Value, ViewEvent, ViewOptions,
};
use serde_json::json;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

fn seeded() -> DataStore {
    let meta = item_model();
    DataStore::with_data(
        &meta,
        vec![
            row(json!({"id": 1, "name": "pear", "qty": 4})),
            row(json!({"id": 2, "name": "fig", "qty": 9})),
            row(json!({"id": 3, "name": "kiwi", "qty": 1})),
        ],
    )
    .unwrap()
}

fn names(view: &datastore::DataView) -> Vec<String> {
    let mut out = Vec::new();
    view.for_each(|_, record| {
        out.push(record.get_field("name").unwrap());
        ControlFlow::Continue(())
    });
    out
}

#[test]
fn appended_record_appears_in_sorted_position() {
    let store = seeded();
    let view = store.create_view(ViewOptions::new().order(["name"]));
    assert_eq!(names(&view), vec!["fig", "kiwi", "pear"]);

    let meta = store.metadata().unwrap();
    let record = Record::from_raw(&meta, &row(json!({"id": 4, "name": "lime"})), None).unwrap();
    store.append(record).unwrap();

    assert_eq!(names(&view), vec!["fig", "kiwi", "lime", "pear"]);
}

#[test]
fn update_moves_record_within_view() {
    let store = seeded();
    let view = store.create_view(ViewOptions::new().order([SortSpec::desc("qty")]));
    assert_eq!(names(&view), vec!["fig", "pear", "kiwi"]);

    let mut kiwi = store.get_by_id(&Value::Int(3)).unwrap();
    kiwi.set_field("qty", 20).unwrap();
    assert!(store.update(kiwi));

    assert_eq!(names(&view), vec!["kiwi", "fig", "pear"]);
}

#[test]
fn update_can_move_record_out_of_filter() {
    let store = seeded();
    let view = store.create_view(
        ViewOptions::new().filter(Filter::compare("qty", CompareOp::Ge, "4")),
    );
    // string comparison: "4" and "9" pass, "1" does not
    assert_eq!(view.count(), 2);

    let mut fig = store.get_by_id(&Value::Int(2)).unwrap();
    fig.set_field("qty", 0).unwrap();
    store.update(fig);
    assert_eq!(names(&view), vec!["pear"]);
}

#[test]
fn views_over_one_store_are_independent() {
    let store = seeded();
    let by_name = store.create_view(ViewOptions::new().order(["name"]));
    let small = store.create_view(ViewOptions::new().filter(Filter::predicate(|record| {
        matches!(record.get_raw("qty").map(|v| v.into_owned()), Ok(Value::Int(qty)) if qty < 5)
    })));

    by_name.filter(Some(Filter::eq("name", "fig")));
    assert_eq!(by_name.count(), 1);
    assert_eq!(small.count(), 2);
    assert_eq!(store.count(), 3);
}

#[test]
fn set_data_refreshes_view_and_notifies() {
    let store = seeded();
    let view = store.create_view(ViewOptions::new().order(["-name"]));
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let observed = view.clone();
    view.subscribe(move |event| {
        // the view already reflects the mutation when notified
        sink.lock().unwrap().push((*event, observed.count()));
    });

    store
        .set_data(vec![
            row(json!({"id": 7, "name": "plum"})),
            row(json!({"id": 8, "name": "date"})),
        ])
        .unwrap();

    assert_eq!(names(&view), vec!["plum", "date"]);
    assert_eq!(*events.lock().unwrap(), vec![(ViewEvent::Change, 2)]);
}

#[test]
fn store_listener_sees_views_already_updated() {
    let store = seeded();
    let view = store.create_view(ViewOptions::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let observed = view.clone();
    // subscribed after the view, so runs after its re-derivation
    store.subscribe(move |event| {
        if let StoreEvent::Delete(id) = event {
            sink.lock().unwrap().push((id.clone(), observed.count()));
        }
    });

    store.delete(&Value::Int(1));
    assert_eq!(*seen.lock().unwrap(), vec![(Value::Int(1), 2)]);
}

#[test]
fn unknown_sort_field_leaves_view_order() {
    let store = seeded();
    let view = store.create_view(ViewOptions::new().order(["name"]));
    view.sort(Some(vec![SortSpec::asc("colour")]));
    // storage order, since the unknown field skips sorting entirely
    assert_eq!(names(&view), vec!["pear", "fig", "kiwi"]);
}

#[test]
fn unknown_filter_field_empties_view() {
    let store = seeded();
    let view = store.create_view(ViewOptions::default());
    assert_eq!(view.filter(Some(Filter::eq("colour", "red"))), 0);
    assert!(view.is_empty());
}
