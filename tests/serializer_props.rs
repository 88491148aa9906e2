//! Purpose: Property coverage for the compact JSON serializer.
//! Exports: Integration tests only (no runtime exports).
//! Role: Cross-check serializer output against `serde_json` as an independent parser.
//! Invariants: Every generated tree serializes to JSON that parses back to the same tree.
//! Invariants: Output never contains a raw byte below 0x20.

use osrm_marshal::json::{self, Array, Object, Value};
use proptest::prelude::*;
use serde_json::Value as Json;

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<String>().prop_map(Value::String),
        (-1_000_000i32..1_000_000, 0u32..8)
            .prop_map(|(n, shift)| Value::Number(f64::from(n) / f64::from(1u32 << shift))),
        any::<i32>().prop_map(|n| Value::Number(f64::from(n))),
        any::<bool>().prop_map(Value::Boolean),
        Just(Value::Null),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::vec((any::<String>(), inner), 0..8)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Object>())),
        ]
    })
}

fn same(ours: &Value, theirs: &Json) -> bool {
    match (ours, theirs) {
        (Value::String(a), Json::String(b)) => a == b,
        (Value::Number(a), Json::Number(b)) => b.as_f64() == Some(*a),
        (Value::Boolean(a), Json::Bool(b)) => a == b,
        (Value::Null, Json::Null) => true,
        (Value::Array(a), Json::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same(x, y))
        }
        (Value::Object(a), Json::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| same(value, other)))
        }
        _ => false,
    }
}

proptest! {
    #[test]
    fn output_parses_back_to_the_same_tree(value in arb_value()) {
        let text = json::to_string(&value);
        let parsed: Json = serde_json::from_str(&text).map_err(|err| {
            TestCaseError::fail(format!("{err}: {text}"))
        })?;
        prop_assert!(same(&value, &parsed), "mismatch for {}", text);
    }

    #[test]
    fn output_has_no_raw_control_bytes(text in any::<String>()) {
        let value = Value::Array(Array::from([Value::String(text.clone()), Value::Null]));
        let out = json::to_string(&value);
        prop_assert!(out.bytes().all(|byte| byte >= 0x20), "raw control byte in {:?}", out);
    }

    #[test]
    fn non_ascii_text_is_preserved(text in "\\PC*") {
        let out = json::to_string(&Value::String(text.clone()));
        let parsed: String = serde_json::from_str(&out).expect("string literal");
        prop_assert_eq!(parsed, text);
    }
}

#[test]
fn non_finite_numbers_render_as_null() {
    let value = Value::Array(vec![
        Value::Number(f64::NAN),
        Value::Number(f64::INFINITY),
        Value::Number(1.5),
    ]);
    assert_eq!(json::to_string(&value), "[null,null,1.5]");
}
