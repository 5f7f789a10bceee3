use super::row;
use datastore::{
    AutoRecord, DataStore, FieldDescriptor, FieldType, ModelError, ModelRegistry, Record, Row,
    SortSpec, TypeDef, Value, ViewOptions,
};
use serde_json::json;
use std::ops::ControlFlow;

fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry
        .register(
            TypeDef::new("Entity")
                .field(FieldDescriptor::new("uid", FieldType::String).identifier())
                .field(FieldDescriptor::new("created", FieldType::Date)),
        )
        .unwrap();
    registry
        .register(
            TypeDef::new("Line")
                .field(FieldDescriptor::new("sku", FieldType::String).identifier())
                .field(FieldDescriptor::new("price", FieldType::Float).precision(2))
                .field(FieldDescriptor::new("count", FieldType::Int)),
        )
        .unwrap();
    registry
        .register(
            TypeDef::new("Order")
                .extends("Entity")
                .field(FieldDescriptor::new("customer", FieldType::String).required())
                .field(FieldDescriptor::new("lines", FieldType::Array).nested("Line"))
                .field(FieldDescriptor::calc("total", |record| {
                    let total = match record.get_raw("lines").map(|v| v.into_owned()) {
                        Ok(Value::Array(lines)) => lines
                            .iter()
                            .map(|line| {
                                let price = match line.get_raw("price").map(|v| v.into_owned()) {
                                    Ok(Value::Float(price)) => price,
                                    _ => 0.0,
                                };
                                let count = match line.get_raw("count").map(|v| v.into_owned()) {
                                    Ok(Value::Int(count)) => count as f64,
                                    _ => 0.0,
                                };
                                price * count
                            })
                            .sum(),
                        _ => 0.0,
                    };
                    Value::Float(total)
                })),
        )
        .unwrap();
    registry
}

#[test]
fn subtype_stores_inherited_and_computed_fields() {
    let registry = registry();
    let order = registry.get("Order").unwrap();
    let names: Vec<&str> = order.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["uid", "created", "customer", "lines", "total"]);
    assert_eq!(order.identifier_name(), "uid");

    let store = DataStore::with_data(
        &order,
        vec![
            row(json!({
                "uid": "o-2",
                "created": "2024-01-02",
                "customer": "ada",
                "lines": [{"sku": "a", "price": "1.256", "count": 2}, {"sku": "b", "price": 3, "count": "1"}]
            })),
            row(json!({"uid": "o-1", "customer": ""})),
        ],
    )
    .unwrap();

    let first = store.get_by_index(0).unwrap();
    assert_eq!(first.id(), &Value::from("o-1"));
    assert_eq!(first.validate(), vec!["customer".to_string()]);

    let second = store.get_by_id(&Value::from("o-2")).unwrap();
    match second.get_raw("total").unwrap().into_owned() {
        Value::Float(total) => assert!((total - 5.52).abs() < 1e-9),
        other => panic!("expected float total, got {:?}", other),
    }

    let exported = store.export();
    assert!(!exported[1].contains_key("total"));
    assert_eq!(exported[1]["created"], json!("2024-01-02T00:00:00.000Z"));
    assert_eq!(exported[1]["lines"][0]["price"], json!(1.26));
}

#[test]
fn sort_on_computed_field() {
    let registry = registry();
    let order = registry.get("Order").unwrap();
    let store = DataStore::with_data(
        &order,
        vec![
            row(json!({"uid": "a", "lines": [{"sku": "x", "price": 5, "count": 3}]})),
            row(json!({"uid": "b", "lines": [{"sku": "x", "price": 1, "count": 1}]})),
            row(json!({"uid": "c"})),
        ],
    )
    .unwrap();

    let view = store.create_view(ViewOptions::new().order([SortSpec::asc("total")]));
    let mut ids = Vec::new();
    view.for_each(|_, record| {
        ids.push(record.id().to_text());
        ControlFlow::Continue(())
    });
    assert_eq!(ids, vec!["c", "b", "a"]);
}

#[test]
fn registration_errors_are_typed() {
    let mut registry = registry();

    let err = registry
        .register(TypeDef::new("Order").field(FieldDescriptor::new("id", FieldType::Int).identifier()))
        .unwrap_err();
    assert_eq!(err, ModelError::DuplicateType("Order".to_string()));

    let err = registry
        .register(
            TypeDef::new("Refund")
                .extends("Order")
                .field(FieldDescriptor::new("rid", FieldType::Int).identifier()),
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::IdentifierRedeclared { .. }));

    let err = registry
        .register(TypeDef::new("Loose").field(FieldDescriptor::new("x", FieldType::Int)))
        .unwrap_err();
    assert!(matches!(err, ModelError::NoIdentifierField { .. }));

    assert!(matches!(
        registry.get("Missing").unwrap_err(),
        ModelError::UnregisteredType(_)
    ));
}

#[test]
fn auto_store_accepts_foreign_records() {
    let auto = AutoRecord::from_raw("Tag", &row(json!({"slug": "rust", "uses": 3})), None).unwrap();
    assert_eq!(auto.metadata().identifier_name(), "slug");

    let store = DataStore::auto("Tag", Some("slug"));
    store.set_data(vec![Row::from(auto.clone())]).unwrap();
    assert_eq!(store.get_by_id(&Value::from("rust")).unwrap(), auto);

    let meta = store.metadata().unwrap();
    let next = Record::from_raw(&meta, &row(json!({"slug": "go", "uses": 1})), None).unwrap();
    store.append(next).unwrap();
    assert_eq!(store.max_id(), Some(Value::from("rust")));
}
