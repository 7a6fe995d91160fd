//! Decoded generic tree form of a stored object.

use std::collections::BTreeMap;

use crate::error::TypeError;

/// Type name of positional collections.
pub const ARRAY_TYPE_NAME: &str = "Array";

/// A decoded raw value.
///
/// The stored format lets a container carry a type name, named fields,
/// positional elements and a scalar leaf at the same time. Only some of
/// those combinations are meaningful, so the shape is fixed at construction
/// through [`RawValue::from_parts`]:
///
/// - [`RawValue::Scalar`] -- a leaf string, nothing else
/// - [`RawValue::Array`] -- positional elements only
/// - [`RawValue::Record`] -- named fields only
/// - [`RawValue::Hybrid`] -- named fields *and* positional elements
///
/// A scalar combined with fields or elements is rejected. An empty container
/// is an empty `Array` when it is untyped or typed [`ARRAY_TYPE_NAME`], and
/// an empty `Record` otherwise.
///
/// Variants can be matched but not built outside this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawValue {
    #[non_exhaustive]
    Scalar {
        type_name: Option<String>,
        value: String,
    },
    #[non_exhaustive]
    Array {
        type_name: Option<String>,
        elements: Vec<RawValue>,
    },
    #[non_exhaustive]
    Record {
        type_name: Option<String>,
        fields: BTreeMap<String, RawValue>,
    },
    #[non_exhaustive]
    Hybrid {
        type_name: Option<String>,
        fields: BTreeMap<String, RawValue>,
        elements: Vec<RawValue>,
    },
}

impl RawValue {
    /// Validate a parsed container and pick its variant.
    pub fn from_parts(
        type_name: Option<String>,
        fields: BTreeMap<String, RawValue>,
        elements: Vec<RawValue>,
        scalar: Option<String>,
    ) -> Result<Self, TypeError> {
        match (scalar, fields.is_empty(), elements.is_empty()) {
            (Some(value), true, true) => Ok(Self::Scalar { type_name, value }),
            (Some(_), false, _) => Err(TypeError::IllegalShape(
                "scalar leaf combined with named fields".into(),
            )),
            (Some(_), _, false) => Err(TypeError::IllegalShape(
                "scalar leaf combined with array elements".into(),
            )),
            (None, true, true) if type_name.as_deref().is_some_and(|t| t != ARRAY_TYPE_NAME) => {
                Ok(Self::Record { type_name, fields })
            }
            (None, true, _) => Ok(Self::Array {
                type_name,
                elements,
            }),
            (None, false, true) => Ok(Self::Record { type_name, fields }),
            (None, false, false) => Ok(Self::Hybrid {
                type_name,
                fields,
                elements,
            }),
        }
    }

    /// An untyped scalar leaf.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar {
            type_name: None,
            value: value.into(),
        }
    }

    /// A typed scalar leaf.
    pub fn typed_scalar(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Scalar {
            type_name: Some(type_name.into()),
            value: value.into(),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Scalar { type_name, .. }
            | Self::Array { type_name, .. }
            | Self::Record { type_name, .. }
            | Self::Hybrid { type_name, .. } => type_name.as_deref(),
        }
    }

    /// Named fields; `None` for scalars and arrays.
    pub fn fields(&self) -> Option<&BTreeMap<String, RawValue>> {
        match self {
            Self::Record { fields, .. } | Self::Hybrid { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&RawValue> {
        self.fields().and_then(|f| f.get(name))
    }

    /// Positional elements; empty for scalars and records.
    pub fn elements(&self) -> &[RawValue] {
        match self {
            Self::Array { elements, .. } | Self::Hybrid { elements, .. } => elements,
            _ => &[],
        }
    }

    pub fn scalar_value(&self) -> Option<&str> {
        match self {
            Self::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_field() -> BTreeMap<String, RawValue> {
        let mut fields = BTreeMap::new();
        fields.insert("x".to_string(), RawValue::scalar("5"));
        fields
    }

    #[test]
    fn scalar_only_is_scalar() {
        let v = RawValue::from_parts(Some("Int".into()), BTreeMap::new(), vec![], Some("5".into()))
            .unwrap();
        assert_eq!(v, RawValue::typed_scalar("Int", "5"));
        assert_eq!(v.scalar_value(), Some("5"));
        assert_eq!(v.type_name(), Some("Int"));
    }

    #[test]
    fn empty_container_is_empty_array() {
        let v = RawValue::from_parts(None, BTreeMap::new(), vec![], None).unwrap();
        assert!(v.is_array());
        assert!(v.elements().is_empty());
    }

    #[test]
    fn empty_typed_container_is_empty_record() {
        let v = RawValue::from_parts(Some("DocumentLocation".into()), BTreeMap::new(), vec![], None)
            .unwrap();
        assert!(matches!(v, RawValue::Record { .. }));
        assert_eq!(v.fields().map(BTreeMap::len), Some(0));
        assert_eq!(v.type_name(), Some("DocumentLocation"));

        let v = RawValue::from_parts(Some(ARRAY_TYPE_NAME.into()), BTreeMap::new(), vec![], None)
            .unwrap();
        assert!(v.is_array());
    }

    #[test]
    fn fields_only_is_record() {
        let v = RawValue::from_parts(None, one_field(), vec![], None).unwrap();
        assert!(matches!(v, RawValue::Record { .. }));
        assert_eq!(v.field("x"), Some(&RawValue::scalar("5")));
    }

    #[test]
    fn fields_and_elements_is_hybrid() {
        let v = RawValue::from_parts(None, one_field(), vec![RawValue::scalar("e")], None)
            .unwrap();
        assert!(matches!(v, RawValue::Hybrid { .. }));
        assert_eq!(v.elements().len(), 1);
        assert!(v.field("x").is_some());
    }

    #[test]
    fn scalar_with_fields_rejected() {
        let err = RawValue::from_parts(None, one_field(), vec![], Some("s".into())).unwrap_err();
        assert!(matches!(err, TypeError::IllegalShape(_)));
    }

    #[test]
    fn scalar_with_elements_rejected() {
        let err = RawValue::from_parts(
            None,
            BTreeMap::new(),
            vec![RawValue::scalar("e")],
            Some("s".into()),
        )
        .unwrap_err();
        assert!(matches!(err, TypeError::IllegalShape(_)));
    }
}
