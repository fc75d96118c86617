//! Core data model: property values, potential and validated tasks, and the
//! vocabulary interfaces supplied by the host.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Canonical task identifier produced by resolving a command/action pair
/// (e.g. `/bot find` -> `"BotFind"`).
pub type TaskId = String;

/// A typed property value parsed from a command or a JSON task object.
///
/// Strings come from quoted literals, the rest from unquoted literals.
/// Serializes as the corresponding plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl PropertyValue {
    /// Convert a JSON scalar into a property value. Objects and arrays have
    /// no counterpart here and yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::Str(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Num),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Null => Some(Self::Null),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// Ordered property map; insertion keys are plain ASCII names.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A task candidate produced by either extraction path, before validation.
///
/// `start`/`end` are byte offsets into the original message and
/// `&message[start..end]` reproduces the exact matched text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialTask {
    /// Resolved identifier, or `None` when the vocabulary did not recognize
    /// the command/action pair.
    pub identifier: Option<TaskId>,
    pub properties: Option<PropertyMap>,
    pub start: usize,
    pub end: usize,
}

/// A task that survived validation: known identifier, schema-recognized
/// properties only, all required properties accounted for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedTask {
    /// Opaque per-extraction id for UI correlation (`"task-0"`, `"task-1"`, ...).
    pub id: String,
    pub identifier: TaskId,
    /// Human-readable label derived from the identifier.
    pub label: String,
    pub properties: PropertyMap,
    pub start: usize,
    pub end: usize,
}

/// Property schema for one task identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSchema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
}

impl TaskSchema {
    pub fn allows(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key) || self.optional.iter().any(|k| k == key)
    }
}

/// Per-identifier property schemas, supplied by the host.
pub type SchemaTable = HashMap<TaskId, TaskSchema>;

/// Maps recognized vocabulary to a canonical task identifier.
///
/// Implemented by the host; `None` means the pair is not part of the
/// vocabulary and the candidate will be dropped during validation.
pub trait TaskResolver {
    fn resolve(&self, command: &str, action: Option<&str>) -> Option<TaskId>;
}

impl<F> TaskResolver for F
where
    F: Fn(&str, Option<&str>) -> Option<TaskId>,
{
    fn resolve(&self, command: &str, action: Option<&str>) -> Option<TaskId> {
        self(command, action)
    }
}

/// Map-backed resolver so hosts can declare their vocabulary as data.
///
/// Lookups are case-insensitive since the commands are typed by a model.
#[derive(Debug, Clone, Default)]
pub struct VocabularyResolver {
    entries: HashMap<(String, String), TaskId>,
}

impl VocabularyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` (+ optional `action`) as resolving to `task`.
    pub fn insert(
        &mut self,
        command: impl Into<String>,
        action: Option<&str>,
        task: impl Into<TaskId>,
    ) {
        let key = (
            command.into().to_ascii_lowercase(),
            action.unwrap_or("").to_ascii_lowercase(),
        );
        self.entries.insert(key, task.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TaskResolver for VocabularyResolver {
    fn resolve(&self, command: &str, action: Option<&str>) -> Option<TaskId> {
        let key = (
            command.to_ascii_lowercase(),
            action.unwrap_or("").to_ascii_lowercase(),
        );
        self.entries.get(&key).cloned()
    }
}

/// Derive a display label from a CamelCase identifier: `"BotFind"` -> `"Bot Find"`.
pub fn display_label(identifier: &str) -> String {
    let mut label = String::with_capacity(identifier.len() + 4);
    let mut prev_lower = false;
    for ch in identifier.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            label.push(' ');
        }
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        label.push(ch);
    }
    label
}
