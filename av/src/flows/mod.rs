//! Flow invocation layer
//!
//! One entry point per capability. An invocation validates its input, renders
//! the capability's template, makes exactly one backend call under a deadline,
//! and validates what comes back. Nothing is cached or retried.

mod capability;
mod error;
mod invocation;
mod runner;

pub use capability::{
    AnalyzeNdvi, AskCropQuestion, Capability, CapabilityKind, EstimateYield, ForecastPests, GenerateAvatar,
    PredictIrrigation, SummarizeDashboard,
};
pub use error::{FlowError, GenerationError};
pub use invocation::{Invocation, InvocationState};
pub use runner::{DEFAULT_DEADLINE, FlowRunner};
