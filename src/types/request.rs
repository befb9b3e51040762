//! Upstream call request

use super::message::Message;
use crate::{Error, Result};

/// Optional generation parameters forwarded to the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature in `[0, 1]`
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens; must be positive
    pub max_output_tokens: Option<u32>,
}

impl GenerationParams {
    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    fn validate(&self) -> Result<()> {
        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(Error::validation(
                    "request.temperature",
                    "temperature must be between 0 and 1",
                ));
            }
        }
        if self.max_output_tokens == Some(0) {
            return Err(Error::validation(
                "request.max_output_tokens",
                "max_output_tokens must be a positive integer",
            ));
        }
        Ok(())
    }
}

/// One upstream call: provider model id, ordered messages, generation parameters.
///
/// Created per inbound request and dropped when that request completes.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    /// Provider model id (e.g. "gpt-4o-mini")
    pub model: String,
    pub messages: Vec<Message>,
    pub params: GenerationParams,
}

impl CallRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Checks everything that can be rejected without contacting upstream.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::validation("request.model", "model must not be empty"));
        }
        // A system prompt alone is not a conversation.
        let mut conversation = self.messages.iter().filter(|m| !m.is_system()).peekable();
        if conversation.peek().is_none() {
            return Err(Error::validation(
                "request.messages",
                "messages must not be empty",
            ));
        }
        if conversation.all(Message::is_blank) {
            return Err(Error::validation(
                "request.messages",
                "messages must contain non-empty content",
            ));
        }
        self.params.validate()
    }

    /// Messages as they are sent upstream.
    ///
    /// Only the last system message is active; it is moved to the front and
    /// every other message keeps its relative order.
    pub fn normalized_messages(&self) -> Vec<Message> {
        let system = self.messages.iter().rev().find(|m| m.is_system()).cloned();
        system
            .into_iter()
            .chain(self.messages.iter().filter(|m| !m.is_system()).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn request(messages: Vec<Message>) -> CallRequest {
        CallRequest::new("gpt-4o-mini", messages)
    }

    #[test]
    fn empty_messages_are_invalid() {
        let err = request(vec![]).validate().unwrap_err();
        assert_eq!(ErrorKind::classify(&err), ErrorKind::InvalidRequest);
        assert!(err.to_string().contains("messages must not be empty"));
    }

    #[test]
    fn system_prompt_alone_is_invalid() {
        let err = request(vec![Message::system("you are a tutor")])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("messages must not be empty"));
    }

    #[test]
    fn blank_messages_are_invalid() {
        let err = request(vec![Message::user("   "), Message::system("")])
            .validate()
            .unwrap_err();
        assert_eq!(ErrorKind::classify(&err), ErrorKind::InvalidRequest);
    }

    #[test]
    fn params_out_of_range_are_invalid() {
        let hot = request(vec![Message::user("hi")])
            .with_params(GenerationParams::default().temperature(1.5));
        assert!(hot.validate().is_err());

        let zero = request(vec![Message::user("hi")])
            .with_params(GenerationParams::default().max_output_tokens(0));
        assert!(zero.validate().is_err());

        let ok = request(vec![Message::user("hi")]).with_params(
            GenerationParams::default()
                .temperature(0.0)
                .max_output_tokens(256),
        );
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn last_system_message_wins() {
        let req = request(vec![
            Message::system("default tutor prompt"),
            Message::user("first"),
            Message::assistant("answer"),
            Message::system("override prompt"),
            Message::user("second"),
        ]);

        let normalized = req.normalized_messages();
        assert_eq!(normalized.len(), 4);
        assert_eq!(normalized[0], Message::system("override prompt"));
        assert_eq!(normalized[1], Message::user("first"));
        assert_eq!(normalized[2], Message::assistant("answer"));
        assert_eq!(normalized[3], Message::user("second"));
    }

    #[test]
    fn no_system_message_is_left_untouched() {
        let req = request(vec![Message::user("a"), Message::assistant("b")]);
        assert_eq!(req.normalized_messages(), req.messages);
    }
}
