use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use serde::Deserialize;

use fixtura_core::{Constructor, TypeDef, TypeRef, TypeRegistry, Value};
use fixtura_generate::{
    CircularPolicy, Fixture, FixtureError, Resolution, ResolutionContext, UnresolvedReason,
    fixture, fixture_with, from_fn,
};

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct Customer {
    id: uuid::Uuid,
    name: String,
    vip: Option<bool>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct Order {
    number: u32,
    customer: Customer,
    lines: Vec<OrderLine>,
    status: Status,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct OrderLine {
    sku: String,
    quantity: u16,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
enum Status {
    Pending,
    Shipped,
    Delivered,
}

fn shop_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    let defs = vec![
        TypeDef::enumeration("Status", ["Pending", "Shipped", "Delivered"]),
        TypeDef::object(
            "Customer",
            vec![
                Constructor::new("new")
                    .param("id", TypeRef::named("uuid"))
                    .param("name", TypeRef::named("string"))
                    .param("vip", TypeRef::option(TypeRef::named("bool"))),
            ],
        ),
        TypeDef::object(
            "OrderLine",
            vec![
                Constructor::new("new")
                    .param("sku", TypeRef::named("string"))
                    .param("quantity", TypeRef::named("u16")),
            ],
        ),
        TypeDef::object(
            "Order",
            vec![
                Constructor::new("new")
                    .param("number", TypeRef::named("u32"))
                    .param("customer", TypeRef::named("Customer"))
                    .param("lines", TypeRef::list(TypeRef::named("OrderLine")))
                    .param("status", TypeRef::named("Status")),
            ],
        ),
        TypeDef::abstract_type("PaymentMethod", Vec::new()),
    ];
    for def in defs {
        registry.register(def).expect("register type");
    }
    registry
}

fn shop_fixture() -> Fixture {
    fixture_with(|builder| builder.registry(shop_registry())).expect("shop fixture")
}

#[test]
fn creates_nested_objects_that_deserialize_into_domain_types() {
    let fixture = shop_fixture();
    for _ in 0..20 {
        let order: Order = fixture
            .create_as(&TypeRef::named("Order"))
            .expect("create order");
        assert!(!order.customer.name.is_empty());
        assert!(order.lines.len() <= 10);
        assert!(order.lines.iter().all(|line| !line.sku.is_empty()));
    }
}

#[test]
fn collection_sizes_stay_within_configured_bounds() {
    let fixture = fixture_with(|builder| builder.collection_size(3, 6)).expect("fixture");
    let mut sizes = BTreeSet::new();
    for value in fixture
        .create_many(&TypeRef::parse("Set<u64>").expect("parse"))
        .limit(200)
        .iter()
    {
        let value = value.expect("set value");
        let len = value.elements().expect("set").len();
        assert!((3..=6).contains(&len));
        sizes.insert(len);
    }
    assert!(sizes.len() > 1);
}

#[test]
fn repeat_count_fixes_every_collection_size() {
    let fixture = fixture_with(|builder| builder.registry(shop_registry()).repeat_count(2))
        .expect("fixture");
    let order: Order = fixture
        .create_as(&TypeRef::named("Order"))
        .expect("create order");
    assert_eq!(order.lines.len(), 2);
}

#[test]
fn factories_reach_nested_requests() {
    let fixture = shop_fixture()
        .with_overrides(|builder| {
            builder.constant(TypeRef::named("string"), Value::Text("fixed".to_string()))
        })
        .expect("override");
    let order: Order = fixture
        .create_as(&TypeRef::named("Order"))
        .expect("create order");
    assert_eq!(order.customer.name, "fixed");
    assert!(order.lines.iter().all(|line| line.sku == "fixed"));
}

#[test]
fn property_overrides_fix_a_single_parameter() {
    let fixture = shop_fixture();
    let order: Order = serde_json::from_value(
        fixture
            .create_with(&TypeRef::named("Order"), |builder| {
                builder.property_value("Order", "status", Value::Text("Shipped".to_string()))
            })
            .expect("create order")
            .to_json(),
    )
    .expect("deserialize order");
    assert_eq!(order.status, Status::Shipped);
}

#[test]
fn with_overrides_leaves_the_original_untouched() {
    let base = fixture();
    let overridden = base
        .with_overrides(|builder| builder.constant(TypeRef::named("i32"), Value::Int(7)))
        .expect("override");

    assert_eq!(
        overridden.create(&TypeRef::named("i32")).expect("overridden"),
        Value::Int(7)
    );
    assert!(base.configuration().factory(&TypeRef::named("i32")).is_none());
    let values: BTreeSet<i64> = (0..50)
        .filter_map(|_| base.create(&TypeRef::named("i32")).ok())
        .filter_map(|value| value.as_i64())
        .collect();
    assert!(values.len() > 1);
}

#[test]
fn unresolvable_abstract_type_fails_with_trail() {
    let err = shop_fixture()
        .create(&TypeRef::named("PaymentMethod"))
        .expect_err("no implementation");
    let FixtureError::Unresolved { request, unresolved } = &err else {
        panic!("expected unresolved error, got {err:?}");
    };
    assert_eq!(request, &TypeRef::named("PaymentMethod"));
    assert_eq!(unresolved.attempted_strategies(), vec!["object.abstract"]);
    let message = err.to_string();
    assert!(message.starts_with("unable to handle PaymentMethod"));
    assert!(message.contains("abstract type has no implementation"));
}

#[test]
fn unknown_nested_types_name_the_failing_parameter() {
    let registry = shop_registry()
        .with(TypeDef::object(
            "Invoice",
            vec![Constructor::new("new").param("payment", TypeRef::named("PaymentMethod"))],
        ))
        .expect("register invoice");
    let fixture = fixture_with(|builder| builder.registry(registry)).expect("fixture");
    let err = fixture
        .create(&TypeRef::named("Invoice"))
        .expect_err("payment cannot be built");
    let unresolved = err.unresolved().expect("trail");
    assert!(unresolved.walk().iter().any(|node| matches!(
        &node.reason,
        UnresolvedReason::ParameterFailed { parameter, .. } if parameter == "payment"
    )));
}

#[test]
fn range_pick_returns_members_only() {
    let fixture = fixture();
    let request = TypeRef::named("i32");
    let mut picked = BTreeSet::new();
    for _ in 0..200 {
        let value: i32 = fixture
            .create_from(&request, [3, 5, 8])
            .expect("range pick");
        assert!([3, 5, 8].contains(&value));
        picked.insert(value);
    }
    assert_eq!(picked.len(), 3);

    for _ in 0..20 {
        let value: i32 = fixture.create_from(&request, 42..=42).expect("single");
        assert_eq!(value, 42);
    }
}

#[test]
fn empty_range_falls_back_to_generation() {
    let fixture = fixture_with(|builder| builder.int_range(10, 20)).expect("fixture");
    let value: i64 = fixture
        .create_from(&TypeRef::named("i64"), Vec::new())
        .expect("generated");
    assert!((10..=20).contains(&value));
}

#[test]
fn sequences_are_lazy_restartable_and_uncached() {
    let sequence = fixture().create_many(&TypeRef::named("uuid")).limit(5);
    let first: Vec<Value> = sequence.iter().collect::<Result<_, _>>().expect("first");
    let second: Vec<Value> = (&sequence)
        .into_iter()
        .collect::<Result<_, _>>()
        .expect("second");
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    assert_ne!(first, second);

    let unbounded = fixture().create_many(&TypeRef::named("bool"));
    assert_eq!(unbounded.iter().take(1000).count(), 1000);
}

#[test]
fn sequences_with_overrides_apply_them_to_every_element() {
    let sequence = fixture()
        .create_many_with(&TypeRef::named("u8"), |builder| {
            builder.constant(TypeRef::named("u8"), Value::UInt(9))
        })
        .expect("sequence")
        .limit(10);
    for value in sequence.iter_as::<u8>() {
        assert_eq!(value.expect("u8"), 9);
    }
}

#[test]
fn cyclic_graphs_terminate_under_both_policies() {
    let registry = TypeRegistry::new()
        .with(TypeDef::object(
            "Node",
            vec![
                Constructor::new("new")
                    .param("label", TypeRef::named("string"))
                    .param("next", TypeRef::named("Node")),
            ],
        ))
        .expect("register node");

    let strict = fixture_with(|builder| builder.registry(registry.clone())).expect("strict");
    let err = strict
        .create(&TypeRef::named("Node"))
        .expect_err("cycle");
    assert!(err.unresolved().expect("trail").is_circular());

    let lenient = fixture_with(|builder| {
        builder
            .registry(registry)
            .circular_policy(CircularPolicy::Null)
    })
    .expect("lenient");
    let node = lenient.create(&TypeRef::named("Node")).expect("node");
    assert_eq!(node.field("next"), Some(&Value::Null));
}

#[test]
fn recursion_through_growing_generics_terminates() {
    let registry = TypeRegistry::new()
        .with(
            TypeDef::object(
                "Nest",
                vec![Constructor::new("new").param(
                    "inner",
                    TypeRef::parse("Nest<List<T>>").expect("parse param"),
                )],
            )
            .with_generics(["T"]),
        )
        .expect("register nest");
    let request = TypeRef::parse("Nest<i32>").expect("parse request");

    let strict = fixture_with(|builder| builder.registry(registry.clone())).expect("strict");
    let err = strict.create(&request).expect_err("unbounded nesting");
    assert!(err.unresolved().expect("trail").is_circular());

    let lenient = fixture_with(|builder| {
        builder
            .registry(registry)
            .circular_policy(CircularPolicy::Null)
    })
    .expect("lenient");
    assert!(lenient.create(&request).is_ok());
}

#[test]
fn failing_factories_never_fall_back_to_builtins() {
    let fixture = fixture_with(|builder| {
        builder.try_factory(TypeRef::named("bool"), |_ctx: &mut ResolutionContext<'_>| {
            Err("booleans are disabled".to_string())
        })
    })
    .expect("fixture");
    for _ in 0..20 {
        let err = fixture
            .create(&TypeRef::named("bool"))
            .expect_err("factory failure");
        let trail = err.unresolved().expect("trail");
        assert_eq!(trail.attempted_strategies(), vec!["override.factory"]);
    }
}

#[test]
fn lists_of_cyclic_types_can_be_empty() {
    let registry = TypeRegistry::new()
        .with(TypeDef::object(
            "Tree",
            vec![
                Constructor::new("new")
                    .param("children", TypeRef::list(TypeRef::named("Tree"))),
            ],
        ))
        .expect("register tree");
    let fixture =
        fixture_with(|builder| builder.registry(registry).repeat_count(0)).expect("fixture");
    let tree = fixture.create(&TypeRef::named("Tree")).expect("tree");
    assert_eq!(tree.field("children"), Some(&Value::List(Vec::new())));
}

#[test]
fn user_strategies_run_before_builtins() {
    let fixture = fixture()
        .with_overrides(|builder| {
            builder.strategy(Arc::new(from_fn(
                "test.even",
                |request: &TypeRef, ctx: &mut ResolutionContext<'_>| {
                    if request.name() != "u32" {
                        return None;
                    }
                    let Ok(Value::UInt(value)) = ctx
                        .resolve(&TypeRef::named("u16"))
                        .into_result()
                    else {
                        return None;
                    };
                    Some(Resolution::Resolved(Value::UInt(value * 2)))
                },
            )))
        })
        .expect("override");
    for _ in 0..50 {
        let value = fixture.create(&TypeRef::named("u32")).expect("u32");
        assert_eq!(value.as_u64().map(|v| v % 2), Some(0));
    }
}

#[test]
fn fixtures_are_shared_across_threads() {
    let fixture = shop_fixture();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fixture = fixture.clone();
            thread::spawn(move || {
                (0..25)
                    .map(|_| fixture.create(&TypeRef::named("Order")))
                    .collect::<Result<Vec<_>, _>>()
            })
        })
        .collect();
    for handle in handles {
        let orders = handle.join().expect("thread").expect("orders");
        assert_eq!(orders.len(), 25);
        assert!(orders.iter().all(|order| order.type_name() == Some("Order")));
    }
}
