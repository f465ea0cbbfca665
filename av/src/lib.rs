//! AgriVision - Precision Agriculture Advisory Core
//!
//! AgriVision turns farm observations into advisory output by sending
//! schema-constrained prompts to a generative model and checking that what
//! comes back matches a typed record.
//!
//! # Core Concepts
//!
//! - **Typed Contracts**: Every capability has an input and an output record with
//!   field-level constraints, checked on both sides of the model call
//! - **One Call Per Invocation**: No caching, no retries, a deadline on every
//!   dispatch
//! - **Generic Failures**: Forms show one recoverable message per capability;
//!   details only reach the log
//! - **Session Context**: Farm, profile and language live in explicit,
//!   observable state owned by a `Session`
//!
//! # Modules
//!
//! - [`schema`] - Input/output records and their constraints
//! - [`prompts`] - Prompt templates and rendering
//! - [`llm`] - Generation backend clients
//! - [`flows`] - Capability invocation
//! - [`forms`] - View-models for operator-facing forms
//! - [`session`] - Per-session farm, profile and language state
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`repl`] - Interactive assistant

pub mod cli;
pub mod config;
pub mod flows;
pub mod forms;
pub mod llm;
pub mod prompts;
pub mod repl;
pub mod schema;
pub mod session;

// Re-export commonly used types
pub use config::{Config, FlowsConfig, LlmConfig, PromptsConfig, SessionConfig};
pub use flows::{
    AnalyzeNdvi, AskCropQuestion, Capability, CapabilityKind, EstimateYield, FlowError, FlowRunner, ForecastPests,
    GenerateAvatar, GenerationError, Invocation, InvocationState, PredictIrrigation, SummarizeDashboard,
};
pub use forms::{
    AssistantChat, AvatarGenerator, ChatMessage, ChatRole, DashboardPanel, FormAdapter, FormState, Presentable,
};
pub use llm::{GenerateRequest, GenerateResponse, LlmClient, LlmError, StubClient, StubReply, create_client};
pub use prompts::{ContractError, PromptLoader};
pub use schema::{Contract, DataUri, FieldError, OutputContract, SchemaError, ValidationError};
pub use session::{Session, SessionState};
