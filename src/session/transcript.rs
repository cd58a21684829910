//! Conversation transcript.
//!
//! Messages are appended, never removed. The newest message may grow while
//! it is the open assistant reply of the current turn; everything before it
//! is frozen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TranscriptError;

/// Greeting shown before the first question.
pub const WELCOME_MESSAGE: &str = "Hello! I am your Smart Homework Helper. \n\n\
I run a 4-agent pipeline to give you personalized help: \n\
1. **Classifier Agent** 🔍 \n\
2. **Assessor Agent** 📊 \n\
3. **Solver Agent** ✏️ \n\
4. **Practice Agent** 📝 \n\n\
Ask me any homework question!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript seeded with the welcome message.
    pub fn with_welcome() -> Self {
        Self {
            messages: vec![Message::new(MessageRole::Assistant, WELCOME_MESSAGE)],
        }
    }

    /// Append a message and return it.
    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) -> &Message {
        self.messages.push(Message::new(role, content));
        &self.messages[self.messages.len() - 1]
    }

    /// Append text to the open assistant message.
    ///
    /// Only the newest message, and only if it is an assistant message,
    /// accepts more text.
    pub fn append_content(&mut self, id: Uuid, text: &str) -> Result<&Message, TranscriptError> {
        let last_index = self.messages.len().checked_sub(1);
        let index = self
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or(TranscriptError::NotFound { id })?;

        if Some(index) != last_index || self.messages[index].role != MessageRole::Assistant {
            return Err(TranscriptError::Closed { id });
        }

        let message = &mut self.messages[index];
        message.content.push_str(text);
        Ok(&*message)
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
