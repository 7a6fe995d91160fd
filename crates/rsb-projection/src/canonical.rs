use rsb_types::RawValue;
use serde_json::{Map, Value};

use crate::scalar::convert_scalar;

/// Key holding a composite value's positional elements.
pub const VALUES_KEY: &str = "values";

/// Canonical projection.
///
/// - arrays become JSON arrays
/// - scalar leaves become their converted scalar
/// - records become objects of their non-underscore fields, plus a
///   `"values"` array when elements are present
pub fn to_canonical_json(value: &RawValue) -> Value {
    project(value, &|_, _| {})
}

/// Shared traversal for canonical-shaped output.
///
/// `post` runs on every object after its fields are projected, with the
/// object's type name; the log projection uses it to reshape objects.
pub(crate) fn project(value: &RawValue, post: &dyn Fn(Option<&str>, &mut Map<String, Value>)) -> Value {
    match value {
        RawValue::Scalar { type_name, value, .. } => convert_scalar(type_name.as_deref(), value),
        RawValue::Array { elements, .. } => project_elements(elements, post),
        RawValue::Record { type_name, fields, .. } => {
            let mut map = project_fields(fields, post);
            post(type_name.as_deref(), &mut map);
            Value::Object(map)
        }
        RawValue::Hybrid {
            type_name,
            fields,
            elements,
            ..
        } => {
            let mut map = project_fields(fields, post);
            map.insert(VALUES_KEY.into(), project_elements(elements, post));
            post(type_name.as_deref(), &mut map);
            Value::Object(map)
        }
    }
}

fn project_fields<'a>(
    fields: impl IntoIterator<Item = (&'a String, &'a RawValue)>,
    post: &dyn Fn(Option<&str>, &mut Map<String, Value>),
) -> Map<String, Value> {
    fields
        .into_iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .map(|(name, value)| (name.clone(), project(value, post)))
        .collect()
}

fn project_elements(
    elements: &[RawValue],
    post: &dyn Fn(Option<&str>, &mut Map<String, Value>),
) -> Value {
    Value::Array(elements.iter().map(|e| project(e, post)).collect())
}

#[cfg(test)]
mod tests {
    use rsb_codec::decode;
    use serde_json::json;

    use super::*;

    fn canonical(bytes: &[u8]) -> Value {
        to_canonical_json(&decode(bytes).unwrap())
    }

    #[test]
    fn typed_int_scalar() {
        assert_eq!(canonical(b"[T3:Int V1:5]"), json!(5));
        assert_eq!(canonical(b"[K1:x [T3:Int V1:5]]"), json!({"x": 5}));
    }

    #[test]
    fn untyped_scalar_is_string() {
        assert_eq!(canonical(b"[K1:x V1:5]"), json!({"x": "5"}));
    }

    #[test]
    fn arrays() {
        assert_eq!(
            canonical(b"[T5:Array [T3:Int V1:1] [T3:Int V1:2]]"),
            json!([1, 2])
        );
        assert_eq!(canonical(b"[]"), json!([]));
        assert_eq!(canonical(b"[T5:Array]"), json!([]));
    }

    #[test]
    fn empty_typed_object_is_empty_object() {
        assert_eq!(canonical(b"[T16:DocumentLocation]"), json!({}));
        assert_eq!(canonical(b"[K3:loc [T16:DocumentLocation]]"), json!({"loc": {}}));
    }

    #[test]
    fn underscore_fields_are_omitted() {
        assert_eq!(
            canonical(b"[K2:_s V1:x K4:name V3:abc]"),
            json!({"name": "abc"})
        );
    }

    #[test]
    fn hybrid_gets_values_array() {
        assert_eq!(
            canonical(b"[K4:name V1:a [T3:Int V1:7]]"),
            json!({"name": "a", "values": [7]})
        );
    }

    #[test]
    fn nested_records() {
        let bytes = b"[T11:TestSummary K4:name V5:login K8:duration [T6:Double V4:1.25] \
K4:tags [[V4:fast] [V5:smoke]]]";
        assert_eq!(
            canonical(bytes),
            json!({"name": "login", "duration": 1.25, "tags": ["fast", "smoke"]})
        );
    }
}
