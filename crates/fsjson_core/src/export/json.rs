//! Mapping of entity values to JSON.

use fsjson_codec::Value as EntityValue;
use serde_json::{Map, Number, Value};

/// Converts entity fields into a JSON object, keeping field order.
pub fn fields_to_json(fields: Vec<(String, EntityValue)>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(name, value)| (name, value_to_json(value)))
        .collect()
}

/// Converts one entity value to JSON.
///
/// - timestamps become integer milliseconds since the epoch
/// - bytes become text, with invalid UTF-8 replaced
/// - geo points become `"lat,lon"` and users their email
/// - keys become `"Kind:id/Kind:name"` paths
/// - non-finite doubles become strings
pub fn value_to_json(value: EntityValue) -> Value {
    match value {
        EntityValue::Null => Value::Null,
        EntityValue::Boolean(b) => Value::Bool(b),
        EntityValue::Integer(n) => Value::from(n),
        EntityValue::Double(d) => {
            Number::from_f64(d).map_or_else(|| Value::String(d.to_string()), Value::Number)
        }
        EntityValue::Text(text) => Value::String(text),
        EntityValue::Bytes(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        EntityValue::Timestamp(micros) => Value::from(timestamp_millis(micros)),
        EntityValue::GeoPoint { lat, lon } => Value::String(format!("{lat:?},{lon:?}")),
        EntityValue::User(email) => Value::String(email),
        EntityValue::Key(key) => Value::String(key.to_string()),
        EntityValue::Entity(fields) => Value::Object(fields_to_json(fields)),
        EntityValue::List(items) => Value::Array(items.into_iter().map(value_to_json).collect()),
    }
}

/// Microseconds to milliseconds, rounding toward negative infinity.
#[must_use]
pub fn timestamp_millis(micros: i64) -> i64 {
    micros.div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsjson_codec::{Key, PathElement};
    use serde_json::json;

    #[test]
    fn timestamps_floor_to_millis() {
        assert_eq!(timestamp_millis(1_600_000_000_123_456), 1_600_000_000_123);
        assert_eq!(timestamp_millis(0), 0);
        assert_eq!(timestamp_millis(-1), -1);
        assert_eq!(timestamp_millis(-1000), -1);
        assert_eq!(timestamp_millis(-1001), -2);
    }

    #[test]
    fn scalar_mapping() {
        assert_eq!(value_to_json(EntityValue::Integer(-4)), json!(-4));
        assert_eq!(value_to_json(EntityValue::Boolean(true)), json!(true));
        assert_eq!(value_to_json(EntityValue::Double(0.25)), json!(0.25));
        assert_eq!(value_to_json(EntityValue::Double(f64::NAN)), json!("NaN"));
        assert_eq!(value_to_json(EntityValue::Null), Value::Null);
        assert_eq!(
            value_to_json(EntityValue::Bytes(vec![b'o', b'k', 0xFF])),
            json!("ok\u{FFFD}")
        );
    }

    #[test]
    fn composite_mapping() {
        assert_eq!(
            value_to_json(EntityValue::GeoPoint { lat: 1.5, lon: -2.0 }),
            json!("1.5,-2.0")
        );
        assert_eq!(value_to_json(EntityValue::User("a@b.c".into())), json!("a@b.c"));

        let key = Key::new(
            "app",
            vec![PathElement::with_name("User", "bob"), PathElement::with_id("Post", 3)],
        );
        assert_eq!(value_to_json(EntityValue::Key(key)), json!("User:bob/Post:3"));

        let nested = EntityValue::Entity(vec![
            ("when".into(), EntityValue::Timestamp(2_000)),
            (
                "tags".into(),
                EntityValue::List(vec![EntityValue::Text("x".into())]),
            ),
        ]);
        assert_eq!(value_to_json(nested), json!({"when": 2, "tags": ["x"]}));
    }
}
