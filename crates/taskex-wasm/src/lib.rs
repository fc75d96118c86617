//! # taskex-wasm
//!
//! WASM compilation target for taskex-core.
//!
//! This demonstrates that the extraction logic is portable and can run in a
//! browser next to a streaming model UI. Nothing here performs I/O - the
//! host passes the message and profile in, and gets the extraction result
//! back as JSON.

use serde::{Deserialize, Serialize};
use taskex_core::{extract_tasks, ExtractionContext, ExtractionMode, ExtractionProfile};
use wasm_bindgen::prelude::*;

/// Input to the extraction function
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractInput {
    /// The model message to scan
    pub message: String,

    /// Message encoding: "text" or "json"
    pub mode: String,

    /// The extraction profile (vocabulary, schemas, wrapper, task mode)
    pub profile: ExtractionProfile,
}

/// Extract tasks from a model message
///
/// # Example
///
/// ```javascript
/// const input = {
///   message: "/bot find searchString=\"big bird\"",
///   mode: "text",
///   profile: { task_mode: "Start", vocabulary: [...], schemas: {...} }
/// };
/// const output = extract_message(JSON.stringify(input));
/// const result = JSON.parse(output);
/// console.log(result.tasksToRun, result.messageWithoutTasks);
/// ```
#[wasm_bindgen]
pub fn extract_message(input_json: &str) -> Result<String, JsValue> {
    let input: ExtractInput = serde_json::from_str(input_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid input JSON: {}", e)))?;

    let mode: ExtractionMode = input
        .mode
        .parse()
        .map_err(|e| JsValue::from_str(&format!("{}", e)))?;

    let resolver = input.profile.resolver();
    let ctx = ExtractionContext {
        resolver: &resolver,
        schema_table: &input.profile.schemas,
        task_mode: input.profile.task_mode.clone(),
        suggestion_root: input.profile.suggestion_root.clone(),
        existing_data: input.profile.existing_data.clone(),
        wrapper: input.profile.wrapper.clone(),
        max_action_len: input.profile.max_action_len,
    };

    let result = extract_tasks(&input.message, mode, &ctx);
    serde_json::to_string(&result)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize result: {}", e)))
}

/// Parse a YAML extraction profile into its JSON form
#[wasm_bindgen]
pub fn profile_from_yaml(yaml: &str) -> Result<String, JsValue> {
    let profile = taskex_core::parse_profile(yaml)
        .map_err(|e| JsValue::from_str(&format!("Invalid profile: {}", e)))?;
    serde_json::to_string(&profile)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize profile: {}", e)))
}
