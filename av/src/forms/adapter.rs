//! FormAdapter - one form's view-model
//!
//! Submissions are independent. A new submission never cancels one in flight;
//! each carries a generation token and only the latest token may publish, so a
//! slow older response cannot overwrite a newer result.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use super::{FormState, Presentable};
use crate::flows::FlowRunner;
use crate::schema::Contract;

pub struct FormAdapter<C: Presentable> {
    runner: FlowRunner,
    state: watch::Sender<FormState<C::Output>>,
    generation: AtomicU64,
    _capability: PhantomData<C>,
}

impl<C: Presentable> FormAdapter<C> {
    pub fn new(runner: FlowRunner) -> Self {
        debug!(capability = C::NAME, "FormAdapter::new: called");
        let (state, _) = watch::channel(FormState::Idle);
        Self {
            runner,
            state,
            generation: AtomicU64::new(0),
            _capability: PhantomData,
        }
    }

    /// Currently published state
    pub fn state(&self) -> FormState<C::Output> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState<C::Output>> {
        self.state.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    /// Rendered text for the published state, if there is anything to show
    pub fn render(&self) -> Option<String> {
        match &*self.state.borrow() {
            FormState::Idle | FormState::Pending => None,
            FormState::Invalid(errors) => Some(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            FormState::Ready(output) => Some(C::render(output)),
            FormState::Failed(message) => Some(message.clone()),
        }
    }

    /// Validate, invoke, and publish the outcome
    ///
    /// Returns this submission's own outcome, which is only published if no
    /// newer submission was made in the meantime.
    pub async fn submit(&self, input: C::Input) -> FormState<C::Output> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(capability = C::NAME, %token, "FormAdapter::submit: called");

        if let Err(e) = input.validate() {
            debug!(capability = C::NAME, %token, field = %e.field_name(), "FormAdapter::submit: invalid input");
            let state = FormState::Invalid(e.errors().to_vec());
            self.publish(token, state.clone());
            return state;
        }

        self.publish(token, FormState::Pending);

        let state = match self.runner.run::<C>(&input).await {
            Ok(output) => FormState::Ready(output),
            Err(e) => {
                warn!(capability = C::NAME, %token, error = %e, "submission failed");
                FormState::Failed(C::FAILURE.to_string())
            }
        };

        self.publish(token, state.clone());
        state
    }

    /// Publish `state` if `token` is still the latest
    ///
    /// The token is compared while the channel's write lock is held, so a
    /// newer submission's state can never be overwritten by an older one.
    fn publish(&self, token: u64, state: FormState<C::Output>) -> bool {
        let mut latest = token;
        let published = self.state.send_if_modified(|current| {
            latest = self.generation.load(Ordering::SeqCst);
            if token != latest {
                return false;
            }
            *current = state;
            true
        });
        if !published {
            warn!(capability = C::NAME, %token, %latest, "discarding stale response");
        }
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::{AskCropQuestion, PredictIrrigation};
    use crate::llm::{StubClient, StubReply};
    use crate::prompts::PromptLoader;
    use crate::schema::{CropQuestion, IrrigationInput};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn runner(stub: &Arc<StubClient>) -> FlowRunner {
        FlowRunner::new(stub.clone(), PromptLoader::embedded_only())
    }

    #[tokio::test]
    async fn test_invalid_input_published_without_dispatch() {
        let stub = Arc::new(StubClient::new());
        let form = FormAdapter::<PredictIrrigation>::new(runner(&stub));

        let state = form
            .submit(IrrigationInput {
                humidity: -5.0,
                ..Default::default()
            })
            .await;

        assert!(matches!(state, FormState::Invalid(ref errors) if errors[0].field == "humidity"));
        assert_eq!(form.state(), state);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_message_is_generic() {
        let stub = Arc::new(StubClient::always(StubReply::Fail("upstream exploded: secret detail".to_string())));
        let form = FormAdapter::<PredictIrrigation>::new(runner(&stub));

        form.submit(IrrigationInput::default()).await;

        let text = form.render().unwrap();
        assert_eq!(text, "An error occurred while making a prediction. Please try again.");
        assert!(!text.contains("secret"));
    }

    #[tokio::test]
    async fn test_pending_while_outstanding() {
        let stub = Arc::new(StubClient::new().then_after(
            Duration::from_millis(100),
            StubReply::Output(json!({ "answer": "Sow after the first rains." })),
        ));
        let form = Arc::new(FormAdapter::<AskCropQuestion>::new(runner(&stub)));

        let task = {
            let form = form.clone();
            tokio::spawn(async move { form.submit(CropQuestion::new("When should I sow maize?")).await })
        };

        let mut rx = form.subscribe();
        rx.wait_for(|s| s.is_pending()).await.unwrap();
        assert!(form.is_pending());

        let state = task.await.unwrap();
        assert!(state.is_ready());
        assert!(form.state().is_ready());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_older_response_never_overwrites_newer_invalid() {
        let stub = Arc::new(StubClient::always(StubReply::Output(json!({
            "irrigationNeeded": true,
            "recommendation": "Apply 25mm of water.",
            "confidenceLevel": 0.8
        }))));

        for round in 0..2000 {
            let form = Arc::new(FormAdapter::<PredictIrrigation>::new(runner(&stub)));
            let mut rx = form.subscribe();

            let older = {
                let form = form.clone();
                tokio::spawn(async move { form.submit(IrrigationInput::default()).await })
            };

            // the older submission is in flight (or already done) before the newer one starts
            rx.wait_for(|s| !matches!(s, FormState::Idle)).await.unwrap();
            form.submit(IrrigationInput {
                humidity: -1.0,
                ..Default::default()
            })
            .await;
            older.await.unwrap();

            assert!(
                matches!(form.state(), FormState::Invalid(_)),
                "round {}: stale response published over newer submission",
                round
            );
        }
    }
}
