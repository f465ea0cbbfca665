//! Assistant conversation log

use std::sync::Mutex;

use tracing::debug;

use super::{FormAdapter, FormState, Presentable};
use crate::flows::{AskCropQuestion, FlowRunner};
use crate::schema::{Contract, CropQuestion, ValidationError};

/// First message of every conversation
pub const GREETING: &str = "Hello! How can I help you with your crops today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Question/answer log
///
/// Each question is an independent Q&A invocation; earlier turns are not sent
/// to the backend.
pub struct AssistantChat {
    form: FormAdapter<AskCropQuestion>,
    log: Mutex<Vec<ChatMessage>>,
}

impl AssistantChat {
    pub fn new(runner: FlowRunner) -> Self {
        Self {
            form: FormAdapter::new(runner),
            log: Mutex::new(vec![ChatMessage::assistant(GREETING)]),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.form.is_pending()
    }

    /// Back to just the greeting
    pub fn clear(&self) {
        debug!("AssistantChat::clear: called");
        *self.lock() = vec![ChatMessage::assistant(GREETING)];
    }

    /// Ask a question and return the assistant's reply
    ///
    /// Blank input is ignored and returns `Ok(None)`. A question that fails
    /// its constraints returns the field errors and leaves the log untouched.
    pub async fn ask(&self, question: &str) -> Result<Option<ChatMessage>, ValidationError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }
        debug!(len = question.len(), "AssistantChat::ask: called");

        let input = CropQuestion::new(question);
        input.validate()?;
        self.lock().push(ChatMessage::user(question));

        let reply = match self.form.submit(input).await {
            FormState::Ready(answer) => ChatMessage::assistant(AskCropQuestion::render(&answer)),
            _ => ChatMessage::assistant(AskCropQuestion::FAILURE),
        };

        self.lock().push(reply.clone());
        Ok(Some(reply))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChatMessage>> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{StubClient, StubReply};
    use crate::prompts::PromptLoader;
    use serde_json::json;
    use std::sync::Arc;

    fn chat(stub: &Arc<StubClient>) -> AssistantChat {
        AssistantChat::new(FlowRunner::new(stub.clone(), PromptLoader::embedded_only()))
    }

    #[test]
    fn test_starts_with_greeting() {
        let stub = Arc::new(StubClient::new());
        let messages = chat(&stub).messages();
        assert_eq!(messages, vec![ChatMessage::assistant(GREETING)]);
    }

    #[tokio::test]
    async fn test_answer_appended() {
        let stub = Arc::new(StubClient::with_output(json!({ "answer": "Use neem oil spray." })));
        let chat = chat(&stub);

        let reply = chat.ask("How do I control aphids?").await.unwrap().unwrap();

        assert_eq!(reply.content, "Use neem oil spray.");
        let messages = chat.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::user("How do I control aphids?"));
    }

    #[tokio::test]
    async fn test_short_question_rejected_without_dispatch() {
        let stub = Arc::new(StubClient::new());
        let chat = chat(&stub);

        let err = chat.ask("Why?").await.unwrap_err();

        assert_eq!(err.field_name(), "question");
        assert_eq!(chat.messages(), vec![ChatMessage::assistant(GREETING)]);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_apologizes() {
        let stub = Arc::new(StubClient::always(StubReply::Fail("quota".to_string())));
        let chat = chat(&stub);

        let reply = chat.ask("When should I harvest rice?").await.unwrap().unwrap();
        assert_eq!(reply.content, AskCropQuestion::FAILURE);
    }

    #[tokio::test]
    async fn test_blank_ignored_and_clear() {
        let stub = Arc::new(StubClient::with_output(json!({ "answer": "Yes." })));
        let chat = chat(&stub);

        assert!(chat.ask("   ").await.unwrap().is_none());
        chat.ask("Is urea safe for wheat?").await.unwrap();
        chat.clear();

        assert_eq!(chat.messages().len(), 1);
    }
}
