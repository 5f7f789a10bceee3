use super::{item_model, row};
use datastore::{DataStore, Filter, Record, SortSpec, Value, ViewOptions};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::ops::ControlFlow;

type Rows = BTreeMap<i64, (String, Option<i64>)>;

fn rows_strategy() -> impl Strategy<Value = Rows> {
    proptest::collection::btree_map(
        -50i64..200,
        ("[a-c]{0,2}", proptest::option::of(-5i64..20)),
        0..40,
    )
}

fn specs_strategy() -> impl Strategy<Value = Vec<SortSpec>> {
    proptest::collection::vec(
        (prop_oneof![Just("id"), Just("name"), Just("qty")], any::<bool>()),
        1..4,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .map(|(field, ascending)| SortSpec {
                field: field.to_string(),
                ascending,
            })
            .collect()
    })
}

/// Inserts rows in reverse id order so storage order differs from the index
fn build_store(rows: &Rows) -> DataStore {
    let meta = item_model();
    DataStore::with_data(
        &meta,
        rows.iter()
            .rev()
            .map(|(id, (name, qty))| row(json!({"id": id, "name": name, "qty": qty}))),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn lookup_by_id_matches_lookup_by_index(rows in rows_strategy()) {
        let store = build_store(&rows);
        for position in 0..store.count() {
            let by_index = store.get_by_index(position).unwrap();
            let by_id = store.get_by_id(by_index.id()).unwrap();
            prop_assert_eq!(&by_id, &by_index);
            prop_assert_eq!(store.index_of_id(by_index.id()), Some(position));
        }
    }

    #[test]
    fn append_then_delete_round_trips(rows in rows_strategy(), id in 200i64..400) {
        let store = build_store(&rows);
        let count = store.count();
        let exported = store.export();

        let meta = store.metadata().unwrap();
        let record = Record::from_raw(&meta, &row(json!({"id": id, "name": "new"})), None).unwrap();
        store.append(record).unwrap();
        prop_assert_eq!(store.count(), count + 1);
        prop_assert_eq!(store.max_id(), Some(Value::Int(id)));

        prop_assert!(store.delete(&Value::Int(id)));
        prop_assert_eq!(store.count(), count);
        prop_assert_eq!(store.export(), exported);
    }

    #[test]
    fn empty_result_filter_selects_nothing(rows in rows_strategy()) {
        let store = build_store(&rows);
        prop_assert!(store.create_index(Some(&Filter::EmptyResult)).is_empty());
    }

    #[test]
    fn sorting_is_idempotent(rows in rows_strategy(), specs in specs_strategy()) {
        let store = build_store(&rows);
        let index = store.create_index(None);
        let once = store.sort_index(&index, Some(specs.as_slice()));
        let twice = store.sort_index(&once, Some(specs.as_slice()));
        prop_assert_eq!(&once, &twice);

        let mut sorted = once.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, index);
    }

    #[test]
    fn readers_follow_identifier_order(rows in rows_strategy()) {
        let store = build_store(&rows);
        let mut ids = Vec::new();
        store.for_each(|_, record| {
            ids.push(record.id().clone());
            ControlFlow::Continue(())
        });
        let expected: Vec<Value> = rows.keys().map(|id| Value::Int(*id)).collect();
        prop_assert_eq!(&ids, &expected);

        let view = store.create_view(ViewOptions::default());
        let mut view_ids = Vec::new();
        view.for_each(|_, record| {
            view_ids.push(record.id().clone());
            ControlFlow::Continue(())
        });
        prop_assert_eq!(&view_ids, &expected);
    }

    #[test]
    fn mixed_identifier_types_stay_consistent(
        ids in proptest::collection::btree_set(0i64..500, 20..60),
        as_text in proptest::collection::vec(any::<bool>(), 60),
    ) {
        let store = DataStore::auto("Row", None);
        store
            .set_data(ids.iter().zip(&as_text).map(|(id, text)| {
                if *text {
                    row(json!({"id": id.to_string()}))
                } else {
                    row(json!({"id": id}))
                }
            }))
            .unwrap();

        prop_assert_eq!(store.count(), ids.len());
        for position in 0..store.count() {
            let by_index = store.get_by_index(position).unwrap();
            let by_id = store.get_by_id(by_index.id()).unwrap();
            prop_assert_eq!(&by_id, &by_index);
        }
    }
}

#[test]
fn binary_search_finds_inserted_identifiers() {
    let meta = item_model();
    let store = DataStore::new(&meta);
    for id in [1, 2, 3, 5, 8] {
        let record = Record::from_raw(&meta, &row(json!({"id": id})), None).unwrap();
        store.append(record).unwrap();
    }

    let position = store.index_of_id(&Value::Int(5)).unwrap();
    assert_eq!(store.get_by_index(position).unwrap().id(), &Value::Int(5));
    assert_eq!(store.index_of_id(&Value::Int(4)), None);
}

#[test]
fn equality_filter_preserves_storage_order() {
    let meta = item_model();
    let store = DataStore::with_data(
        &meta,
        vec![
            row(json!({"id": 1, "name": "a"})),
            row(json!({"id": 2, "name": "b"})),
            row(json!({"id": 3, "name": "a"})),
        ],
    )
    .unwrap();

    let index = store.create_index(Some(&Filter::eq("name", "a")));
    assert_eq!(index, vec![0, 2]);
}

#[test]
fn case_insensitive_filter_matches_lowercase() {
    let meta = item_model();
    let store = DataStore::with_data(&meta, vec![row(json!({"id": 1, "name": "a"}))]).unwrap();

    assert_eq!(
        store
            .create_index(Some(&Filter::eq("name", "A").case_sensitive(false)))
            .len(),
        1
    );
    assert!(store
        .create_index(Some(&Filter::eq("name", "A").case_sensitive(true)))
        .is_empty());
}

#[test]
fn regex_filter_matches_string_form() {
    let meta = item_model();
    let store = DataStore::with_data(
        &meta,
        vec![
            row(json!({"id": 1, "name": "apple"})),
            row(json!({"id": 2, "name": "banana"})),
            row(json!({"id": 3, "name": "avocado"})),
        ],
    )
    .unwrap();

    let regex = regex::Regex::new("^a").unwrap();
    assert_eq!(store.create_index(Some(&Filter::matches("name", regex))), vec![0, 2]);
}
