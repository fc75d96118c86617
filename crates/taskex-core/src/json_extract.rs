//! JSON extraction path: messages that are (or contain) a JSON value
//! following the command/action/properties convention.
//!
//! Parse failure is not an error here; an unparseable message simply yields
//! no tasks (the model was not speaking JSON after all).

use crate::task::{PotentialTask, PropertyMap, PropertyValue, TaskResolver};
use serde_json::Value;

/// Extract tasks from a JSON message.
///
/// Accepted shapes, each optionally unwrapped one level through a `task` or
/// `tasks` key: a `{command, action?, properties?}` object, the same object
/// with loose keys standing in for `properties`, or an array of either. A
/// missing `command` falls back to `default_identifier` (the active task
/// mode). Every result's span covers the outer JSON value's location in the
/// original message.
pub fn extract_json_tasks(
    message: &str,
    resolver: &dyn TaskResolver,
    default_identifier: &str,
) -> Vec<PotentialTask> {
    let Some((start, end, value)) = locate_json(message) else {
        return Vec::new();
    };

    let unwrapped = unwrap_task_key(&value);
    match unwrapped {
        Value::Object(_) => task_from_object(unwrapped, resolver, default_identifier, start, end)
            .into_iter()
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| task_from_object(item, resolver, default_identifier, start, end))
            .collect(),
        _ => Vec::new(),
    }
}

/// One level of optional `task`/`tasks` wrapping.
fn unwrap_task_key(value: &Value) -> &Value {
    if let Value::Object(obj) = value {
        if !obj.contains_key("command") {
            for key in ["task", "tasks"] {
                if let Some(inner @ (Value::Object(_) | Value::Array(_))) = obj.get(key) {
                    return inner;
                }
            }
        }
    }
    value
}

fn task_from_object(
    value: &Value,
    resolver: &dyn TaskResolver,
    default_identifier: &str,
    start: usize,
    end: usize,
) -> Option<PotentialTask> {
    let obj = value.as_object()?;
    if obj.is_empty() {
        return None;
    }

    let command = obj.get("command").and_then(Value::as_str);
    let action = obj.get("action").and_then(Value::as_str);
    let identifier = match command {
        Some(command) => resolver.resolve(command, action),
        None => Some(default_identifier.to_string()),
    };

    let mut properties = PropertyMap::new();
    match obj.get("properties").and_then(Value::as_object) {
        Some(nested) => {
            for (key, value) in nested {
                if let Some(value) = PropertyValue::from_json(value) {
                    properties.insert(key.clone(), value);
                }
            }
        }
        None => {
            for (key, value) in obj {
                if matches!(key.as_str(), "command" | "action" | "properties") {
                    continue;
                }
                if let Some(value) = PropertyValue::from_json(value) {
                    properties.insert(key.clone(), value);
                }
            }
        }
    }

    Some(PotentialTask {
        identifier,
        properties: Some(properties),
        start,
        end,
    })
}

/// Locate the JSON value inside `message`, tolerating leading and trailing
/// non-JSON text. Returns the value's byte span and the parsed value.
fn locate_json(message: &str) -> Option<(usize, usize, Value)> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let start = message.len() - message.trim_start().len();
        return Some((start, start + trimmed.len(), value));
    }
    for (i, ch) in message.char_indices() {
        if ch == '{' || ch == '[' {
            if let Some((len, value)) = parse_balanced(&message[i..]) {
                return Some((i, i + len, value));
            }
        }
    }
    None
}

/// Try to parse the shortest balanced `{...}`/`[...]` prefix of `s`.
fn parse_balanced(s: &str) -> Option<(usize, Value)> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    let candidate = &s[..i + 1];
                    return serde_json::from_str::<Value>(candidate)
                        .ok()
                        .map(|value| (candidate.len(), value));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{PropertyValue as V, VocabularyResolver};

    fn resolver() -> VocabularyResolver {
        let mut resolver = VocabularyResolver::new();
        resolver.insert("bot", Some("find"), "BotFind");
        resolver.insert("note", Some("put"), "NotePut");
        resolver
    }

    #[test]
    fn test_object_with_nested_properties() {
        let msg = r#"{"command": "bot", "action": "find", "properties": {"searchString": "big bird"}}"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].identifier.as_deref(), Some("BotFind"));
        assert_eq!(
            tasks[0].properties.as_ref().unwrap().get("searchString"),
            Some(&V::Str("big bird".into()))
        );
        assert_eq!((tasks[0].start, tasks[0].end), (0, msg.len()));
    }

    #[test]
    fn test_loose_keys_become_properties() {
        let msg = r#"{"command": "note", "action": "put", "text": "hi", "pin": true}"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        let props = tasks[0].properties.as_ref().unwrap();
        assert_eq!(props.get("text"), Some(&V::Str("hi".into())));
        assert_eq!(props.get("pin"), Some(&V::Bool(true)));
        assert!(!props.contains_key("command"));
        assert!(!props.contains_key("action"));
    }

    #[test]
    fn test_missing_command_falls_back_to_task_mode() {
        let msg = r#"{"searchString": "x"}"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        assert_eq!(tasks[0].identifier.as_deref(), Some("Start"));
    }

    #[test]
    fn test_unknown_command_keeps_null_identifier() {
        let msg = r#"{"command": "nope", "action": "nah"}"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].identifier, None);
    }

    #[test]
    fn test_task_key_unwrapping() {
        let msg = r#"{"task": {"command": "bot", "action": "find"}}"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].identifier.as_deref(), Some("BotFind"));
    }

    #[test]
    fn test_tasks_array_unwrapping() {
        let msg = r#"{"tasks": [{"command": "bot", "action": "find"}, {"command": "note", "action": "put"}]}"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].identifier.as_deref(), Some("BotFind"));
        assert_eq!(tasks[1].identifier.as_deref(), Some("NotePut"));
    }

    #[test]
    fn test_top_level_array() {
        let msg = r#"[{"command": "bot", "action": "find"}, 42, {"command": "note", "action": "put"}]"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        // The stray non-object element is skipped, siblings survive.
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_empty_shapes_yield_nothing() {
        assert!(extract_json_tasks("{}", &resolver(), "Start").is_empty());
        assert!(extract_json_tasks("[]", &resolver(), "Start").is_empty());
        assert!(extract_json_tasks("", &resolver(), "Start").is_empty());
    }

    #[test]
    fn test_malformed_json_yields_nothing() {
        assert!(extract_json_tasks("{not json", &resolver(), "Start").is_empty());
        assert!(extract_json_tasks("plain prose", &resolver(), "Start").is_empty());
    }

    #[test]
    fn test_embedded_json_span_excludes_surrounding_prose() {
        let msg = r#"Here you go: {"command": "bot", "action": "find"} hope that helps"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        assert_eq!(tasks.len(), 1);
        assert_eq!(
            &msg[tasks[0].start..tasks[0].end],
            r#"{"command": "bot", "action": "find"}"#
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_location() {
        let msg = r#"x {"command": "note", "action": "put", "text": "a } b"} y"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        assert_eq!(tasks.len(), 1);
        assert_eq!(
            tasks[0].properties.as_ref().unwrap().get("text"),
            Some(&V::Str("a } b".into()))
        );
    }

    #[test]
    fn test_non_scalar_property_values_are_skipped() {
        let msg = r#"{"command": "note", "action": "put", "meta": {"deep": 1}, "text": "hi"}"#;
        let tasks = extract_json_tasks(msg, &resolver(), "Start");
        let props = tasks[0].properties.as_ref().unwrap();
        assert!(!props.contains_key("meta"));
        assert_eq!(props.get("text"), Some(&V::Str("hi".into())));
    }
}
