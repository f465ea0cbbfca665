//! Avatar generator

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use super::{FormAdapter, FormState};
use crate::flows::{FlowRunner, GenerateAvatar};
use crate::schema::{AvatarInput, AvatarOutput, PLACEHOLDER_AVATAR, ValidationError};
use crate::session::Session;

#[derive(Debug, Error)]
pub enum ProfilePictureError {
    #[error("no avatar has been generated yet")]
    Placeholder,

    #[error("an avatar is still being generated")]
    Pending,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Holds the current avatar; a failed generation leaves it as it was
pub struct AvatarGenerator {
    form: FormAdapter<GenerateAvatar>,
    current: watch::Sender<String>,
}

impl AvatarGenerator {
    pub fn new(runner: FlowRunner) -> Self {
        let (current, _) = watch::channel(PLACEHOLDER_AVATAR.to_string());
        Self {
            form: FormAdapter::new(runner),
            current,
        }
    }

    /// The avatar currently shown
    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn is_placeholder(&self) -> bool {
        *self.current.borrow() == PLACEHOLDER_AVATAR
    }

    pub fn is_pending(&self) -> bool {
        self.form.is_pending()
    }

    pub fn state(&self) -> FormState<AvatarOutput> {
        self.form.state()
    }

    pub fn render(&self) -> Option<String> {
        self.form.render()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }

    /// Generate a new avatar from `prompt_text`
    pub async fn generate(&self, prompt_text: impl Into<String>) -> FormState<AvatarOutput> {
        debug!("AvatarGenerator::generate: called");
        let state = self.form.submit(AvatarInput::new(prompt_text)).await;

        // only what the form published may replace the avatar
        if let FormState::Ready(output) = self.form.state() {
            let changed = self.current.send_if_modified(|current| {
                if *current == output.avatar_data_uri {
                    false
                } else {
                    *current = output.avatar_data_uri.clone();
                    true
                }
            });
            debug!(%changed, "AvatarGenerator::generate: published avatar applied");
        }
        state
    }

    /// Copy the current avatar into the user profile
    pub fn set_as_profile_picture(&self, session: &Session) -> Result<(), ProfilePictureError> {
        debug!("AvatarGenerator::set_as_profile_picture: called");
        if self.is_pending() {
            return Err(ProfilePictureError::Pending);
        }
        if self.is_placeholder() {
            return Err(ProfilePictureError::Placeholder);
        }

        let avatar = self.current();
        session.user.update(|profile| profile.avatar_url = avatar)?;
        info!("Avatar set as profile picture");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{StubClient, StubReply};
    use crate::prompts::PromptLoader;
    use crate::schema::DataUri;
    use std::sync::Arc;

    fn generator(stub: &Arc<StubClient>) -> AvatarGenerator {
        AvatarGenerator::new(FlowRunner::new(stub.clone(), PromptLoader::embedded_only()))
    }

    #[tokio::test]
    async fn test_success_replaces_placeholder() {
        let image = DataUri::from_bytes("image/png", b"avatar");
        let stub = Arc::new(StubClient::always(StubReply::Media(image.clone())));
        let avatars = generator(&stub);
        assert!(avatars.is_placeholder());

        let state = avatars.generate("a scarecrow in a cornfield, watercolor").await;

        assert!(state.is_ready());
        assert_eq!(avatars.current(), image.to_string());
        assert_eq!(
            stub.last_request().unwrap().prompt,
            "a square user avatar, a scarecrow in a cornfield, watercolor"
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_prior_avatar() {
        let image = DataUri::from_bytes("image/png", b"first");
        let stub = Arc::new(
            StubClient::new()
                .then(StubReply::Media(image.clone()))
                .then(StubReply::Empty),
        );
        let avatars = generator(&stub);

        avatars.generate("a farmer").await;
        let state = avatars.generate("a tractor").await;

        assert_eq!(state.failure(), Some("Failed to generate avatar. Please try again."));
        assert_eq!(avatars.current(), image.to_string());
    }

    #[tokio::test]
    async fn test_set_profile_picture_refused_for_placeholder() {
        let stub = Arc::new(StubClient::new());
        let avatars = generator(&stub);
        let session = Session::default();

        let err = avatars.set_as_profile_picture(&session).unwrap_err();
        assert!(matches!(err, ProfilePictureError::Placeholder));
        assert_eq!(session.user.get().avatar_url, PLACEHOLDER_AVATAR);
    }

    #[tokio::test]
    async fn test_set_profile_picture() {
        let image = DataUri::from_bytes("image/png", b"avatar");
        let stub = Arc::new(StubClient::always(StubReply::Media(image.clone())));
        let avatars = generator(&stub);
        let session = Session::default();

        avatars.generate("a farmer").await;
        avatars.set_as_profile_picture(&session).unwrap();

        assert_eq!(session.user.get().avatar_url, image.to_string());
    }
}
