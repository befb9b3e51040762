//! Per-route system prompts.
//!
//! Each AI-backed route is a [`StudyTask`]. The task supplies the system
//! message; the request's optional context tag is appended to it.

use crate::Message;

/// Upper bound for generated flashcards / quiz questions per request.
pub const MAX_ITEMS: u32 = 50;

/// What a route asks the model to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyTask {
    Chat,
    Summarize,
    Flashcards { count: u32 },
    Quiz { count: u32 },
}

impl StudyTask {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            StudyTask::Chat => "chat",
            StudyTask::Summarize => "summarize",
            StudyTask::Flashcards { .. } => "flashcards",
            StudyTask::Quiz { .. } => "quiz",
        }
    }

    pub fn system_prompt(&self, context: Option<&str>) -> String {
        let mut prompt = match self {
            StudyTask::Chat => "You are a patient study tutor. Explain concepts step by step, \
                check understanding with short questions, and keep answers focused on \
                what the student asked."
                .to_string(),
            StudyTask::Summarize => "You summarize study material. Produce a concise summary \
                with the key ideas as bullet points, followed by a one-sentence takeaway. \
                Do not add facts that are not in the material."
                .to_string(),
            StudyTask::Flashcards { count } => format!(
                "You create study flashcards. Produce exactly {} flashcards from the material. \
                 Answer with a JSON array only, each element an object with \"front\" and \
                 \"back\" string fields.",
                count
            ),
            StudyTask::Quiz { count } => format!(
                "You write practice quizzes. Produce exactly {} multiple-choice questions from \
                 the material. Answer with a JSON array only, each element an object with \
                 \"question\", \"options\" (four strings) and \"answer\" (the index of the \
                 correct option).",
                count
            ),
        };

        if let Some(ctx) = context.map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push_str("\n\nContext: ");
            prompt.push_str(ctx);
        }
        prompt
    }

    /// Conversation sent upstream: the caller's messages followed by this
    /// task's system message, which therefore replaces any system message the
    /// caller supplied.
    pub fn messages(&self, conversation: Vec<Message>, context: Option<&str>) -> Vec<Message> {
        let mut messages = conversation;
        messages.push(Message::system(self.system_prompt(context)));
        messages
    }
}

/// Clamps a requested item count into `1..=MAX_ITEMS`, using `default` when absent.
pub fn item_count(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, MAX_ITEMS)
}
