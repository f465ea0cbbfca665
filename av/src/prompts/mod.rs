//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files, one per capability.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (user override, default `.agrivision/prompts/`)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax. Fields are written triple-stashed
//! (`{{{field}}}`) and rendering is strict: a field the record does not carry
//! is an error, never an empty string.

pub mod embedded;
mod error;
mod loader;

pub use error::ContractError;
pub use loader::PromptLoader;
