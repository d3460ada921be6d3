use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One conversation: a flat log that always opens with the greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    greeting: String,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            messages: vec![ChatMessage::assistant(greeting.clone())],
            greeting,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Drop everything and start over from the greeting.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.messages.push(ChatMessage::assistant(self.greeting.clone()));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True when the last message is not from the assistant.
    pub fn needs_reply(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.role != Role::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_holds_only_the_greeting() {
        let session = ChatSession::new("Hi!");
        assert_eq!(session.messages(), &[ChatMessage::assistant("Hi!")]);
        assert!(!session.needs_reply());
    }

    #[test]
    fn user_message_needs_reply() {
        let mut session = ChatSession::new("Hi!");
        session.push_user("what is memory?");
        assert!(session.needs_reply());
        session.push_assistant("a faculty of the mind");
        assert!(!session.needs_reply());
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn clear_restores_greeting() {
        let mut session = ChatSession::new("Hi!");
        session.push_user("one");
        session.push_assistant("two");
        session.clear();
        assert_eq!(session.messages(), &[ChatMessage::assistant("Hi!")]);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("x")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"x"}"#);
    }
}
