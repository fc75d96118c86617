//! # taskex-core
//!
//! Pure Rust command/task extraction with no dependencies on OS, FFI, or
//! specific LLM implementations.
//!
//! This crate scans free-form model output (or structured JSON) for embedded
//! directives, and:
//! - tokenizes inline `/command action key=value` syntax in a single pass
//! - extracts the equivalent command/action/properties convention from JSON
//! - detects `keyword: [ ... ]` suggestion wrappers
//! - validates candidates against host-supplied schemas
//! - strips recognized spans from the message
//!
//! Model output is never trusted to be well-formed: malformed directives are
//! silently dropped, never surfaced as errors.
//!
//! This crate compiles to `wasm32-unknown-unknown` without any feature flags.

#![forbid(unsafe_code)]

pub mod chars;
pub mod extract;
pub mod json_extract;
pub mod profile;
pub mod remove;
pub mod task;
pub mod tokenizer;
pub mod validate;
pub mod wrapper;

// Re-export commonly used types
pub use extract::{extract_tasks, ExtractionContext, ExtractionMode, ExtractionResult};
pub use profile::{parse_profile, ExtractionProfile, ProfileError, VocabularyEntry};
pub use task::{
    PotentialTask, PropertyMap, PropertyValue, SchemaTable, TaskId, TaskResolver, TaskSchema,
    ValidatedTask, VocabularyResolver,
};
pub use tokenizer::{tokenize, RawTask, Tokenizer, TokenizerOptions};
pub use wrapper::{detect_wrapper, WrapperMatch, WrapperRule};
