//! Submitter of record
//!
//! The submitter email lives at `Submitted_By.Submitter.Email`. On create it
//! is the acting user's email; on edit it is always carried over from the
//! stored metadata, whatever the edit payload says. Runs before validation,
//! which requires the field.

use serde_json::{Map, Value};

const SUBMITTER_EMAIL_PATH: [&str; 3] = ["Submitted_By", "Submitter", "Email"];

/// Set the submitter email of `new_metadata` in place
///
/// If `old_metadata` is given but carries no submitter email, the acting
/// user's email is used.
pub fn assign_submitter_email(
    old_metadata: Option<&Value>,
    new_metadata: &mut Value,
    acting_user_email: &str,
) {
    let email = old_metadata
        .and_then(|old| old.pointer("/Submitted_By/Submitter/Email"))
        .filter(|email| !email.is_null())
        .cloned()
        .unwrap_or_else(|| Value::String(acting_user_email.to_string()));

    set_path(new_metadata, &SUBMITTER_EMAIL_PATH, email);
}

/// Set `value` at `path`, creating or overwriting intermediate objects
fn set_path(target: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *target = value;
        return;
    };
    let mut node = target;
    for key in parents {
        node = object_mut(node)
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    object_mut(node).insert(last.to_string(), value);
}

fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}
