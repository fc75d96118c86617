//! Orchestrator: run an extraction path, detect suggestion wrappers, split
//! candidates into run-now versus suggested, validate, and strip the matched
//! spans from the message.

use crate::json_extract::extract_json_tasks;
use crate::remove::remove_spans;
use crate::task::{PotentialTask, PropertyMap, SchemaTable, TaskId, TaskResolver, ValidatedTask};
use crate::tokenizer::{tokenize, TokenizerOptions};
use crate::validate::{validate_tasks, Strictness, ValidationContext};
use crate::wrapper::{detect_wrapper, WrapperRule};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which encoding the message uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Inline `/command action key=value` syntax in free-form text.
    Text,
    /// A JSON value following the command/action/properties convention.
    Json,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown extraction mode `{0}` (expected `text` or `json`)")]
pub struct ParseModeError(String);

impl FromStr for ExtractionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Caller-supplied collaborators and context for one extraction call.
pub struct ExtractionContext<'a> {
    pub resolver: &'a dyn TaskResolver,
    pub schema_table: &'a SchemaTable,
    /// Active conversational task mode; doubles as the fallback identifier
    /// for JSON objects without a `command`.
    pub task_mode: TaskId,
    /// Identifier accepted bare (no properties) as a suggestion root.
    pub suggestion_root: Option<TaskId>,
    pub existing_data: PropertyMap,
    /// Suggestion wrapper to look for in text mode.
    pub wrapper: Option<WrapperRule>,
    /// Cap on the tokenizer's action buffer.
    pub max_action_len: Option<usize>,
}

/// The extraction outcome handed back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// The message with all recognized task and wrapper spans deleted.
    pub message_without_tasks: String,
    pub tasks_to_run: Vec<ValidatedTask>,
    pub tasks_to_suggest: Vec<ValidatedTask>,
}

/// Extract, validate and strip tasks from a model message.
///
/// Malformed input is never an error: anything unrecognizable is left in the
/// message, and only validated spans (plus a matched wrapper's span) are
/// removed.
pub fn extract_tasks(
    message: &str,
    mode: ExtractionMode,
    ctx: &ExtractionContext,
) -> ExtractionResult {
    match mode {
        ExtractionMode::Text => extract_from_text(message, ctx),
        ExtractionMode::Json => extract_from_json(message, ctx),
    }
}

fn extract_from_text(message: &str, ctx: &ExtractionContext) -> ExtractionResult {
    let opts = TokenizerOptions {
        max_action_len: ctx.max_action_len,
        bracket_commands: ctx.wrapper.is_some(),
        bracket_delimiter: ctx.wrapper.as_ref().and_then(|w| w.delimiter),
    };
    let raw = tokenize(message, &opts);
    tracing::debug!(candidates = raw.len(), "text tokenizer finished");

    let wrapper_match = ctx
        .wrapper
        .as_ref()
        .and_then(|rule| detect_wrapper(message, &raw, rule));
    if let Some(m) = &wrapper_match {
        tracing::debug!(wrapped = m.task_indices.len(), "suggestion wrapper matched");
    }

    let mut to_run = Vec::new();
    let mut to_suggest = Vec::new();
    for (index, raw_task) in raw.iter().enumerate() {
        let potential = PotentialTask {
            identifier: ctx
                .resolver
                .resolve(&raw_task.command, raw_task.action.as_deref()),
            properties: Some(raw_task.properties.clone()),
            start: raw_task.start,
            end: raw_task.end,
        };
        let wrapped = wrapper_match
            .as_ref()
            .is_some_and(|m| m.task_indices.contains(&index));
        if wrapped {
            to_suggest.push(potential);
        } else {
            to_run.push(potential);
        }
    }

    let vctx = ValidationContext {
        schema_table: ctx.schema_table,
        task_mode: &ctx.task_mode,
        suggestion_root: ctx.suggestion_root.as_deref(),
        existing_data: &ctx.existing_data,
    };
    let tasks_to_run = validate_tasks(&to_run, &vctx, Strictness::Strict, 0);
    let tasks_to_suggest = validate_tasks(&to_suggest, &vctx, Strictness::Lenient, tasks_to_run.len());

    let mut spans: Vec<(usize, usize)> = tasks_to_run
        .iter()
        .chain(tasks_to_suggest.iter())
        .map(|t| (t.start, t.end))
        .collect();
    if let Some(m) = &wrapper_match {
        spans.push((m.start, m.end));
    }

    ExtractionResult {
        message_without_tasks: remove_spans(message, &spans),
        tasks_to_run,
        tasks_to_suggest,
    }
}

fn extract_from_json(message: &str, ctx: &ExtractionContext) -> ExtractionResult {
    let potentials = extract_json_tasks(message, ctx.resolver, &ctx.task_mode);
    tracing::debug!(candidates = potentials.len(), "json extractor finished");

    let vctx = ValidationContext {
        schema_table: ctx.schema_table,
        task_mode: &ctx.task_mode,
        suggestion_root: ctx.suggestion_root.as_deref(),
        existing_data: &ctx.existing_data,
    };
    let tasks_to_run = validate_tasks(&potentials, &vctx, Strictness::Strict, 0);

    let spans: Vec<(usize, usize)> = tasks_to_run.iter().map(|t| (t.start, t.end)).collect();
    ExtractionResult {
        message_without_tasks: remove_spans(message, &spans),
        tasks_to_run,
        tasks_to_suggest: Vec::new(),
    }
}
