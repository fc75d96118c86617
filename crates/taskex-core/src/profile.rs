//! Extraction profile parsing (YAML).
//!
//! A profile is the declarative form of the caller-supplied collaborators:
//! the command vocabulary, per-identifier property schemas, the active task
//! mode, and the optional suggestion wrapper. Hosts load one and build an
//! [`ExtractionContext`](crate::extract::ExtractionContext) from it.

use crate::task::{PropertyMap, SchemaTable, VocabularyResolver};
use crate::wrapper::WrapperRule;
use serde::{Deserialize, Serialize};

/// Parsed extraction profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionProfile {
    /// Active conversational task mode.
    pub task_mode: String,
    /// Identifier accepted bare as a suggestion root.
    #[serde(default)]
    pub suggestion_root: Option<String>,
    pub vocabulary: Vec<VocabularyEntry>,
    #[serde(default)]
    pub schemas: SchemaTable,
    #[serde(default)]
    pub wrapper: Option<WrapperRule>,
    #[serde(default)]
    pub max_action_len: Option<usize>,
    /// Property values already known from prior context.
    #[serde(default)]
    pub existing_data: PropertyMap,
}

/// One vocabulary row: `command` (+ optional `action`) resolves to `task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub command: String,
    #[serde(default)]
    pub action: Option<String>,
    pub task: String,
}

/// Errors while parsing a profile.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProfileError {
    #[error("failed to parse profile: {0}")]
    Parse(String),
    #[error("profile declares no vocabulary")]
    EmptyVocabulary,
    #[error("duplicate vocabulary entry for `{command} {action}`")]
    DuplicateEntry { command: String, action: String },
}

/// Parse a YAML profile string.
pub fn parse_profile(yaml: &str) -> Result<ExtractionProfile, ProfileError> {
    let profile: ExtractionProfile =
        serde_yaml::from_str(yaml).map_err(|e| ProfileError::Parse(e.to_string()))?;
    validate_profile(&profile)?;
    Ok(profile)
}

fn validate_profile(profile: &ExtractionProfile) -> Result<(), ProfileError> {
    if profile.vocabulary.is_empty() {
        return Err(ProfileError::EmptyVocabulary);
    }
    let mut seen = std::collections::HashSet::new();
    for entry in &profile.vocabulary {
        let key = (
            entry.command.to_ascii_lowercase(),
            entry.action.as_deref().unwrap_or("").to_ascii_lowercase(),
        );
        if !seen.insert(key) {
            return Err(ProfileError::DuplicateEntry {
                command: entry.command.clone(),
                action: entry.action.clone().unwrap_or_default(),
            });
        }
    }
    Ok(())
}

impl ExtractionProfile {
    /// Build the vocabulary resolver declared by this profile.
    pub fn resolver(&self) -> VocabularyResolver {
        let mut resolver = VocabularyResolver::new();
        for entry in &self.vocabulary {
            resolver.insert(entry.command.as_str(), entry.action.as_deref(), &entry.task);
        }
        resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{PropertyValue, TaskResolver};

    const PROFILE: &str = r#"
task_mode: Start
suggestion_root: Start
vocabulary:
  - command: bot
    action: find
    task: BotFind
  - command: start
    task: Start
schemas:
  Start:
    optional: [greeting]
  BotFind:
    required: [searchString]
wrapper:
  keyword: suggested
  delimiter: ","
existing_data:
  greeting: "hello"
"#;

    #[test]
    fn test_parse_full_profile() {
        let profile = parse_profile(PROFILE).unwrap();
        assert_eq!(profile.task_mode, "Start");
        assert_eq!(profile.vocabulary.len(), 2);
        assert_eq!(profile.schemas["BotFind"].required, vec!["searchString"]);
        assert_eq!(profile.wrapper.as_ref().unwrap().delimiter, Some(','));
        assert_eq!(
            profile.existing_data.get("greeting"),
            Some(&PropertyValue::Str("hello".into()))
        );
    }

    #[test]
    fn test_profile_resolver() {
        let profile = parse_profile(PROFILE).unwrap();
        let resolver = profile.resolver();
        assert_eq!(
            resolver.resolve("bot", Some("find")),
            Some("BotFind".to_string())
        );
        assert_eq!(resolver.resolve("start", None), Some("Start".to_string()));
        assert_eq!(resolver.resolve("bot", None), None);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(matches!(
            parse_profile(": not yaml ["),
            Err(ProfileError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_vocabulary_is_an_error() {
        let yaml = "task_mode: Start\nvocabulary: []\n";
        assert_eq!(parse_profile(yaml), Err(ProfileError::EmptyVocabulary));
    }

    #[test]
    fn test_duplicate_vocabulary_entry_is_an_error() {
        let yaml = r#"
task_mode: Start
vocabulary:
  - command: bot
    action: find
    task: BotFind
  - command: Bot
    action: Find
    task: BotFind2
"#;
        assert!(matches!(
            parse_profile(yaml),
            Err(ProfileError::DuplicateEntry { .. })
        ));
    }
}
