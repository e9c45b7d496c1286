//! Content generation behind the AI node kinds.
//!
//! The model backend is external; nodes only see this trait. A failed request never
//! leaves a node half-updated.

use super::node::{ChatMessage, ChatPayload, ImagePayload, UiPayload};
use crate::storage::BoxFuture;
use thiserror::Error;

/// Reply shown in a chat node when the backend fails.
pub const CHAT_ERROR_REPLY: &str = "Error processing request. Please try again.";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeneratorError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),
    #[error("Generation failed: {0}")]
    Failed(String),
}

/// A text/image/markup generator.
pub trait Generator: Send + Sync {
    /// Produce a reply to the conversation so far. For image nodes the reply is an image
    /// URL, for UI nodes it is markup.
    fn generate<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> BoxFuture<'a, Result<String, GeneratorError>>;
}

impl ChatPayload {
    /// Send `prompt` and append the reply. Blank prompts are ignored.
    /// Returns whether anything was appended.
    pub async fn submit(&mut self, prompt: &str, generator: &dyn Generator) -> bool {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return false;
        }
        self.messages.push(ChatMessage::user(prompt));
        let reply = match generator.generate(&self.messages).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("Chat request failed: {e}");
                CHAT_ERROR_REPLY.to_string()
            }
        };
        self.content = reply.clone();
        self.messages.push(ChatMessage::assistant(reply));
        true
    }
}

impl ImagePayload {
    /// Generate an image for `prompt`. On failure the payload is left as it was.
    pub async fn generate(
        &mut self,
        prompt: &str,
        generator: &dyn Generator,
    ) -> Result<(), GeneratorError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(());
        }
        let request = [ChatMessage::user(prompt)];
        let url = generator.generate(&request).await?;
        if let Some(previous) = self.image_url.replace(url) {
            self.history.push(previous);
        }
        self.content = prompt.to_string();
        Ok(())
    }
}

impl UiPayload {
    /// Generate markup for `prompt`. On failure the payload is left as it was.
    pub async fn generate(
        &mut self,
        prompt: &str,
        generator: &dyn Generator,
    ) -> Result<(), GeneratorError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(());
        }
        let request = [ChatMessage::user(prompt)];
        let code = generator.generate(&request).await?;
        self.ui_code = Some(code);
        self.content = prompt.to_string();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::graph::node::ChatRole;
    use crate::storage::block_on;

    /// Answers every request with a fixed result.
    pub(crate) struct FixedGenerator(pub Result<String, GeneratorError>);

    impl Generator for FixedGenerator {
        fn generate<'a>(
            &'a self,
            _messages: &'a [ChatMessage],
        ) -> BoxFuture<'a, Result<String, GeneratorError>> {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    #[test]
    fn test_chat_appends_exchange() {
        let mut chat = ChatPayload::default();
        let generator = FixedGenerator(Ok("Hi there".to_string()));
        assert!(block_on(chat.submit("  hello ", &generator)));

        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0], ChatMessage::user("hello"));
        assert_eq!(chat.messages[1].role, ChatRole::Assistant);
        assert_eq!(chat.content, "Hi there");
    }

    #[test]
    fn test_chat_failure_shows_error_reply() {
        let mut chat = ChatPayload::default();
        let generator = FixedGenerator(Err(GeneratorError::Failed("500".to_string())));
        block_on(chat.submit("hello", &generator));
        assert_eq!(chat.messages[1].content, CHAT_ERROR_REPLY);
    }

    #[test]
    fn test_blank_prompt_ignored() {
        let mut chat = ChatPayload::default();
        let generator = FixedGenerator(Ok("x".to_string()));
        assert!(!block_on(chat.submit("   ", &generator)));
        assert!(chat.messages.is_empty());
    }

    #[test]
    fn test_image_history_and_failure() {
        let mut image = ImagePayload::default();
        block_on(image.generate("cat", &FixedGenerator(Ok("https://img/1".to_string())))).unwrap();
        block_on(image.generate("dog", &FixedGenerator(Ok("https://img/2".to_string())))).unwrap();
        assert_eq!(image.image_url.as_deref(), Some("https://img/2"));
        assert_eq!(image.history, vec!["https://img/1".to_string()]);

        let before = image.clone();
        let failing = FixedGenerator(Err(GeneratorError::Unavailable("offline".to_string())));
        assert!(block_on(image.generate("bird", &failing)).is_err());
        assert_eq!(image, before);
    }

    #[test]
    fn test_ui_generation() {
        let mut ui = UiPayload::default();
        block_on(ui.generate("a login form", &FixedGenerator(Ok("<form/>".to_string())))).unwrap();
        assert_eq!(ui.ui_code.as_deref(), Some("<form/>"));
        assert_eq!(ui.content, "a login form");
    }
}
