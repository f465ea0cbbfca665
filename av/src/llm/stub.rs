//! Scripted client for tests and offline runs
//!
//! Replies are consumed in order; once the script runs out the `always` reply
//! (if any) is used. Every request is recorded so tests can assert on the
//! rendered prompt and on how many calls were made.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{GenerateRequest, GenerateResponse, LlmClient, LlmError};
use crate::schema::DataUri;

/// What the stub answers with
#[derive(Debug, Clone)]
pub enum StubReply {
    /// Structured output
    Output(Value),

    /// A generated image
    Media(DataUri),

    /// A response carrying nothing
    Empty,

    /// A backend failure with this message
    Fail(String),
}

impl StubReply {
    fn into_result(self) -> Result<GenerateResponse, LlmError> {
        match self {
            StubReply::Output(value) => Ok(GenerateResponse::structured(value)),
            StubReply::Media(uri) => Ok(GenerateResponse::image(uri)),
            StubReply::Empty => Ok(GenerateResponse::empty()),
            StubReply::Fail(message) => Err(LlmError::ApiError { status: 500, message }),
        }
    }
}

#[derive(Default)]
struct Script {
    queue: VecDeque<(Duration, StubReply)>,
    always: Option<(Duration, StubReply)>,
    requests: Vec<GenerateRequest>,
}

/// Scripted generation client
#[derive(Default)]
pub struct StubClient {
    script: Mutex<Script>,
    call_count: AtomicUsize,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call with `reply`
    pub fn always(reply: StubReply) -> Self {
        debug!(?reply, "StubClient::always: called");
        let stub = Self::new();
        stub.lock().always = Some((Duration::ZERO, reply));
        stub
    }

    /// Answer every call with structured output
    pub fn with_output(value: Value) -> Self {
        Self::always(StubReply::Output(value))
    }

    /// Queue a reply returned immediately
    pub fn then(self, reply: StubReply) -> Self {
        self.then_after(Duration::ZERO, reply)
    }

    /// Queue a reply returned after `delay`
    pub fn then_after(self, delay: Duration, reply: StubReply) -> Self {
        self.lock().queue.push_back((delay, reply));
        self
    }

    /// Number of `generate` calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received, in call order
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.lock().requests.clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.lock().requests.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // a panic while holding the lock only happens inside a failing test
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LlmClient for StubClient {
    fn provider(&self) -> &str {
        "stub"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        debug!(%idx, "StubClient::generate: called");

        let next = {
            let mut script = self.lock();
            script.requests.push(request);
            script.queue.pop_front().or_else(|| script.always.clone())
        };

        let Some((delay, reply)) = next else {
            debug!("StubClient::generate: script exhausted");
            return Err(LlmError::InvalidResponse("No more stub replies".to_string()));
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply.into_result()
    }
}
