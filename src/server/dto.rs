use crate::prompts::StudyTask;
use crate::{CallRequest, GenerationParams, Message};
use serde::{Deserialize, Serialize};

/// Body accepted by every AI-backed route.
#[derive(Debug, Default, Deserialize)]
pub struct StudyRequest {
    /// Prior conversation, oldest first
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Shorthand for a single trailing user message
    #[serde(default, alias = "text")]
    pub message: Option<String>,
    /// Generation context tag appended to the route's system prompt
    #[serde(default)]
    pub context: Option<String>,
    /// Requested flashcard / question count
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Overrides the route's default delivery
    #[serde(default)]
    pub stream: Option<bool>,
}

impl StudyRequest {
    /// `messages` followed by `message` as a user turn, if present.
    pub fn conversation(&self) -> Vec<Message> {
        let mut conversation = self.messages.clone();
        if let Some(text) = &self.message {
            conversation.push(Message::user(text.clone()));
        }
        conversation
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// Shapes the upstream request for `task`.
    pub fn to_call(&self, model: &str, task: StudyTask) -> CallRequest {
        let messages = task.messages(self.conversation(), self.context.as_deref());
        CallRequest::new(model, messages).with_params(self.params())
    }
}

/// Buffered success body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContentResponse {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageRole;

    #[test]
    fn text_alias_and_defaults() {
        let req: StudyRequest =
            serde_json::from_str(r#"{"text": "Cells are the unit of life."}"#).unwrap();
        assert_eq!(req.message.as_deref(), Some("Cells are the unit of life."));
        assert!(req.messages.is_empty());
        assert!(req.stream.is_none());
        assert_eq!(req.params(), GenerationParams::default());
    }

    #[test]
    fn message_is_appended_after_history() {
        let req: StudyRequest = serde_json::from_str(
            r#"{
                "messages": [
                    {"role": "user", "content": "what is ATP?"},
                    {"role": "assistant", "content": "an energy carrier"}
                ],
                "message": "how is it made?",
                "temperature": 0.2
            }"#,
        )
        .unwrap();

        let conversation = req.conversation();
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation[2], Message::user("how is it made?"));
        assert_eq!(req.params().temperature, Some(0.2));
    }

    #[test]
    fn call_request_gets_task_prompt() {
        let req = StudyRequest {
            message: Some("photosynthesis notes".into()),
            context: Some("biology".into()),
            ..StudyRequest::default()
        };
        let call = req.to_call("gpt-4o-mini", StudyTask::Flashcards { count: 4 });
        let normalized = call.normalized_messages();
        assert_eq!(normalized[0].role, MessageRole::System);
        assert!(normalized[0].content.contains("exactly 4 flashcards"));
        assert!(normalized[0].content.ends_with("Context: biology"));
        assert_eq!(normalized[1], Message::user("photosynthesis notes"));
        assert!(call.validate().is_ok());
    }

    #[test]
    fn empty_body_yields_invalid_call() {
        let req: StudyRequest = serde_json::from_str("{}").unwrap();
        let call = req.to_call("gpt-4o-mini", StudyTask::Chat);
        assert!(call.validate().is_err());
    }
}
