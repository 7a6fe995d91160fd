//! Legacy projection: every value carries its type inline.
//!
//! Scalars become `{"_type":{"_name":T},"_value":V}`. Composites become an
//! object holding `_type` (with `_supertype` when the type has a known
//! parent), the non-underscore fields, and `_values` for positional
//! elements.

use rsb_types::{RawValue, ARRAY_TYPE_NAME};
use serde_json::{json, Map, Value};

use crate::scalar::convert_scalar;

const DEFAULT_SCALAR: &str = "String";
const DEFAULT_ARRAY: &str = ARRAY_TYPE_NAME;
const DEFAULT_RECORD: &str = "Object";

/// Known type → supertype pairs.
static SUPERTYPES: &[(&str, &str)] = &[
    ("ActionAbstractTestSummary", "ActionTestSummaryIdentifiableObject"),
    ("ActionTestMetadata", "ActionTestSummaryIdentifiableObject"),
    ("ActionTestPerformanceMetricSummary", "ActionAbstractTestSummary"),
    ("ActionTestPlanRunSummary", "ActionAbstractTestSummary"),
    ("ActionTestSummary", "ActionTestSummaryIdentifiableObject"),
    ("ActionTestSummaryGroup", "ActionTestSummaryIdentifiableObject"),
    ("ActionTestSummaryIdentifiableObject", "ActionAbstractTestSummary"),
    ("ActionTestableSummary", "ActionAbstractTestSummary"),
    ("ActivityLogAnalyzerControlFlowStepMessage", "ActivityLogAnalyzerStepMessage"),
    ("ActivityLogAnalyzerEventStepMessage", "ActivityLogAnalyzerStepMessage"),
    ("ActivityLogAnalyzerResultMessage", "ActivityLogMessage"),
    ("ActivityLogAnalyzerStepMessage", "ActivityLogMessage"),
    ("ActivityLogAnalyzerWarningMessage", "ActivityLogAnalyzerResultMessage"),
    ("ActivityLogCommandInvocationSection", "ActivityLogSection"),
    ("ActivityLogMajorSection", "ActivityLogSection"),
    ("ActivityLogTargetBuildSection", "ActivityLogMajorSection"),
    ("ActivityLogUnitTestSection", "ActivityLogSection"),
    ("TestFailureIssueSummary", "IssueSummary"),
];

/// Look up the parent of a known type name.
pub fn supertype_of(type_name: &str) -> Option<&'static str> {
    SUPERTYPES
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, parent)| *parent)
}

pub fn to_legacy_json(value: &RawValue) -> Value {
    match value {
        RawValue::Scalar { type_name, value, .. } => {
            let name = type_name.as_deref().unwrap_or(DEFAULT_SCALAR);
            json!({
                "_type": type_header(name),
                "_value": convert_scalar(type_name.as_deref(), value),
            })
        }
        RawValue::Array {
            type_name,
            elements,
            ..
        } => {
            let mut map = Map::new();
            map.insert(
                "_type".into(),
                type_header(type_name.as_deref().unwrap_or(DEFAULT_ARRAY)),
            );
            map.insert("_values".into(), legacy_elements(elements));
            Value::Object(map)
        }
        RawValue::Record { type_name, fields, .. } => {
            let name = type_name.as_deref().unwrap_or(DEFAULT_RECORD);
            Value::Object(legacy_record(name, fields.iter()))
        }
        RawValue::Hybrid {
            type_name,
            fields,
            elements,
            ..
        } => {
            let name = type_name.as_deref().unwrap_or(DEFAULT_RECORD);
            let mut map = legacy_record(name, fields.iter());
            map.insert("_values".into(), legacy_elements(elements));
            Value::Object(map)
        }
    }
}

fn type_header(name: &str) -> Value {
    let mut header = Map::new();
    header.insert("_name".into(), Value::String(name.to_string()));
    if let Some(parent) = supertype_of(name) {
        header.insert("_supertype".into(), json!({ "_name": parent }));
    }
    Value::Object(header)
}

fn legacy_record<'a>(
    name: &str,
    fields: impl Iterator<Item = (&'a String, &'a RawValue)>,
) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("_type".into(), type_header(name));
    for (key, value) in fields.filter(|(key, _)| !key.starts_with('_')) {
        map.insert(key.clone(), to_legacy_json(value));
    }
    map
}

fn legacy_elements(elements: &[RawValue]) -> Value {
    Value::Array(elements.iter().map(to_legacy_json).collect())
}
