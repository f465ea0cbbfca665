//! Interactive assistant for AgriVision
//!
//! Crop questions go to the Q&A capability; slash commands inspect and change
//! the session's farm, language and profile.

mod session;

pub use session::{ReplSession, SlashCommand};

use eyre::{Result, WrapErr};

use crate::config::Config;
use crate::flows::FlowRunner;
use crate::session::Session;

/// Run the interactive assistant
///
/// This is the main entry point for `av assistant`.
pub async fn run_interactive(config: &Config, initial_question: Option<String>) -> Result<()> {
    let runner = FlowRunner::from_config(config).wrap_err("Failed to create LLM client")?;
    let session = Session::new(&config.session);

    ReplSession::new(runner, session).run(initial_question).await
}
