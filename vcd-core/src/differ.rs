//! Differ - Compare desired state with current state
//!
//! Compares the "desired state" declared in configuration with the "current
//! state" fetched from the Provider and reports which attributes differ.

use std::collections::HashMap;

use crate::resource::{Resource, ResourceId, State, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

/// Compare desired state with current state to compute a Diff
///
/// `tracked` lists attributes whose removal from the desired state counts as
/// a change (e.g. dropping a nested block).
pub fn diff(desired: &Resource, current: &State, tracked: &[&str]) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let mut changed = find_changed_attributes(&desired.attributes, &current.attributes);
    for name in tracked {
        if !desired.attributes.contains_key(*name)
            && current.attributes.contains_key(*name)
            && !changed.iter().any(|c| c == name)
        {
            changed.push(name.to_string());
        }
    }
    changed.sort();

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
pub fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _)
        if key.starts_with('_') {
            continue;
        }

        match current.get(key) {
            Some(current_value) if same_value(current_value, desired_value) => {}
            _ => changed.push(key.clone()),
        }
    }

    changed
}

/// Equality that treats numeric literals and their string form as equal
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Map(xm), Value::Map(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, x)| ym.get(k).is_some_and(|y| same_value(x, y)))
        }
        (Value::List(_) | Value::Map(_), _) | (_, Value::List(_) | Value::Map(_)) => false,
        _ => a == b || (a.as_scalar_string().is_some() && a.as_scalar_string() == b.as_scalar_string()),
    }
}
