//! Log projection: canonical shape plus per-type reshaping of activity-log
//! objects.

use rsb_types::RawValue;
use serde_json::{json, Map, Value};

use crate::canonical::project;

const MESSAGE: &str = "ActivityLogMessage";
const ANNOTATION: &str = "ActivityLogMessageAnnotation";
const DOCUMENT_LOCATION: &str = "DocumentLocation";
const ATTACHMENT: &str = "ActivityLogSectionAttachment";
const COMMAND_INVOCATION_SECTION: &str = "ActivityLogCommandInvocationSection";
const UNIT_TEST_SECTION: &str = "ActivityLogUnitTestSection";

static ATTACHMENT_RENAMES: &[(&str, &str)] = &[
    ("identifier", "uniformTypeIdentifier"),
    ("majorVersion", "typeMajorVersion"),
    ("minorVersion", "typeMinorVersion"),
];

static COMMAND_DETAIL_KEYS: &[&str] = &["commandDetails", "emittedOutput", "exitCode"];

static TEST_DETAIL_KEYS: &[&str] = &[
    "testName",
    "suiteName",
    "summary",
    "emittedOutput",
    "performanceTestOutput",
    "testsPassedString",
    "wasSkipped",
    "runnablePath",
    "runnableUTI",
];

static SECTION_LIST_DEFAULTS: &[&str] = &["attachments", "messages", "subsections"];

pub fn to_log_json(value: &RawValue) -> Value {
    project(value, &reshape)
}

fn reshape(type_name: Option<&str>, map: &mut Map<String, Value>) {
    let Some(name) = type_name else {
        return;
    };
    match name {
        MESSAGE => default(map, "annotations", json!([])),
        ANNOTATION => default(map, "location", Value::Null),
        DOCUMENT_LOCATION => default(map, "url", json!("")),
        ATTACHMENT => {
            for (from, to) in ATTACHMENT_RENAMES {
                if let Some(v) = map.remove(*from) {
                    map.insert((*to).to_string(), v);
                }
            }
        }
        COMMAND_INVOCATION_SECTION => {
            let details = nest(map, COMMAND_DETAIL_KEYS);
            map.insert("commandInvocationDetails".into(), Value::Object(details));
        }
        UNIT_TEST_SECTION => {
            let mut details = nest(map, TEST_DETAIL_KEYS);
            details
                .entry("wasSkipped")
                .or_insert(Value::Bool(false));
            map.insert("testDetails".into(), Value::Object(details));
        }
        _ => {}
    }

    if is_section(name) {
        for key in SECTION_LIST_DEFAULTS {
            default(map, key, json!([]));
        }
        default(map, "duration", json!(0));
    }
}

fn is_section(name: &str) -> bool {
    name != ATTACHMENT && name.ends_with("Section")
}

fn default(map: &mut Map<String, Value>, key: &str, value: Value) {
    map.entry(key).or_insert(value);
}

/// Move `keys` present in `map` into a fresh object.
fn nest(map: &mut Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| map.remove(*key).map(|v| ((*key).to_string(), v)))
        .collect()
}
