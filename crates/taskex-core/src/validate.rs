//! Task validation against the host-supplied schema table.
//!
//! Validation never errors; a candidate either survives (possibly with
//! properties stripped) or is silently dropped.

use crate::task::{display_label, PotentialTask, PropertyMap, SchemaTable, ValidatedTask};

/// Host-supplied validation inputs for one extraction call.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub schema_table: &'a SchemaTable,
    /// Active conversational task mode; its schema governs which properties
    /// unwrapped tasks may carry.
    pub task_mode: &'a str,
    /// Identifier of the bare "suggestion root"; a candidate with this
    /// identifier and zero properties is always accepted as-is.
    pub suggestion_root: Option<&'a str>,
    /// Property values already known from prior context; they satisfy
    /// required-property checks without being restated in the message.
    pub existing_data: &'a PropertyMap,
}

/// How to treat a candidate whose required properties are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Drop the task (normal run-now validation).
    Strict,
    /// Keep it anyway (suggestions need not be immediately actionable).
    Lenient,
}

/// Filter and normalize candidates. Survivors get sequential opaque ids
/// starting at `id_base` and a display label derived from their identifier.
pub fn validate_tasks(
    tasks: &[PotentialTask],
    ctx: &ValidationContext,
    strictness: Strictness,
    id_base: usize,
) -> Vec<ValidatedTask> {
    let mode_schema = ctx.schema_table.get(ctx.task_mode).cloned().unwrap_or_default();

    let mut out = Vec::new();
    for task in tasks {
        let Some(identifier) = task.identifier.as_deref() else {
            continue;
        };
        let properties = task.properties.clone().unwrap_or_default();

        // A bare suggestion carries nothing to validate yet.
        let bare_root = ctx.suggestion_root == Some(identifier) && properties.is_empty();

        if !bare_root && !ctx.schema_table.contains_key(identifier) {
            tracing::debug!(identifier, "dropping task with unknown identifier");
            continue;
        }

        let kept: PropertyMap = properties
            .into_iter()
            .filter(|(key, _)| mode_schema.allows(key))
            .collect();

        if !bare_root && strictness == Strictness::Strict {
            let missing = mode_schema.required.iter().find(|req| {
                !kept.contains_key(*req) && !ctx.existing_data.contains_key(*req)
            });
            if let Some(missing) = missing {
                tracing::debug!(identifier, property = %missing, "dropping task missing required property");
                continue;
            }
        }

        out.push(ValidatedTask {
            id: format!("task-{}", id_base + out.len()),
            identifier: identifier.to_string(),
            label: display_label(identifier),
            properties: kept,
            start: task.start,
            end: task.end,
        });
    }
    out
}
