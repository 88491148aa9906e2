//! Purpose: Render result trees as compact JSON text.
//! Exports: `to_string`, `object_to_string`, `write_value`.
//! Role: Pure, reentrant formatter used for every success reply.
//! Invariants: No raw byte below 0x20 ever reaches the output.
//! Invariants: Output has no insignificant whitespace and no trailing newline.
//! Notes: Finite numbers use Rust's shortest round-trip decimal form; non-finite
//! numbers render as `null`.
use std::fmt::Write as _;

use super::{Object, Value};

pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Same as `to_string` for a root object, without wrapping it in a `Value`.
pub fn object_to_string(map: &Object) -> String {
    let mut out = String::new();
    write_object(map, &mut out);
    out
}

pub fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::String(text) => write_string(text, out),
        Value::Number(num) => write_number(*num, out),
        Value::Boolean(true) => out.push_str("true"),
        Value::Boolean(false) => out.push_str("false"),
        Value::Null => out.push_str("null"),
        Value::Array(items) => write_array(items, out),
        Value::Object(map) => write_object(map, out),
    }
}

fn write_array(items: &[Value], out: &mut String) {
    out.push('[');
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        write_value(item, out);
    }
    out.push(']');
}

fn write_object(map: &Object, out: &mut String) {
    out.push('{');
    for (idx, (key, value)) in map.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        write_string(key, out);
        out.push(':');
        write_value(value, out);
    }
    out.push('}');
}

fn write_number(num: f64, out: &mut String) {
    if !num.is_finite() {
        out.push_str("null");
        return;
    }
    let _ = write!(out, "{num}");
}

fn write_string(text: &str, out: &mut String) {
    out.reserve(text.len() + 2);
    out.push('"');
    // Only ASCII is rewritten, so multi-byte UTF-8 sequences pass through untouched.
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::to_string;
    use crate::json::{Object, Value};

    #[test]
    fn renders_code_and_distance() {
        let value = Value::Object(
            Object::new()
                .with("code", "Ok")
                .with("distance", 123.4),
        );
        assert_eq!(to_string(&value), r#"{"code":"Ok","distance":123.4}"#);
    }

    #[test]
    fn escapes_named_and_numeric_controls() {
        let value = Value::from("a\"b\\c\u{08}\u{0c}\n\r\t\u{01}\u{1f}");
        assert_eq!(
            to_string(&value),
            r#""a\"b\\c\b\f\n\r\t\u0001\u001f""#
        );
    }

    #[test]
    fn passes_non_ascii_through() {
        let value = Value::from("Straße → 東京");
        assert_eq!(to_string(&value), "\"Straße → 東京\"");
    }

    #[test]
    fn escapes_object_keys() {
        let value = Value::Object(Object::new().with("a\"b", Value::Null));
        assert_eq!(to_string(&value), r#"{"a\"b":null}"#);
    }

    #[test]
    fn renders_nested_containers_without_trailing_commas() {
        let value = Value::Object(
            Object::new()
                .with("empty_arr", Value::Array(Vec::new()))
                .with("empty_obj", Object::new())
                .with(
                    "mixed",
                    Value::Array(vec![
                        Value::Boolean(true),
                        Value::Boolean(false),
                        Value::Null,
                        Value::Number(-3.0),
                    ]),
                ),
        );
        assert_eq!(
            to_string(&value),
            r#"{"empty_arr":[],"empty_obj":{},"mixed":[true,false,null,-3]}"#
        );
    }

    #[test]
    fn number_formatting_is_shortest_round_trip() {
        assert_eq!(to_string(&Value::Number(0.1)), "0.1");
        assert_eq!(to_string(&Value::Number(42.0)), "42");
        assert_eq!(to_string(&Value::Number(1.0e-7)), "0.0000001");
        assert_eq!(to_string(&Value::Number(13.388798)), "13.388798");
    }

    #[test]
    fn non_finite_numbers_become_null() {
        let value = Value::Array(vec![
            Value::Number(f64::NAN),
            Value::Number(f64::INFINITY),
            Value::Number(f64::NEG_INFINITY),
        ]);
        assert_eq!(to_string(&value), "[null,null,null]");
    }
}
