//! Chat transcripts stored in datasets as plain text.
//!
//! A prompt such as
//!
//! ```text
//! System: You are terse.
//! Human: What is 2+2?
//! AI: 4
//! ```
//!
//! becomes one message per role marker. A marker is a role name followed by
//! `": "` at the start of a line. Lines without a marker continue the
//! previous message; text before the first marker is dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_ROLES: &[&str] = &["human", "ai", "system"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Human,
    Ai,
    System,
    Other(String),
}

impl ChatRole {
    fn from_marker(marker: &str) -> Self {
        match marker.to_ascii_lowercase().as_str() {
            "human" => Self::Human,
            "ai" => Self::Ai,
            "system" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => f.write_str("human"),
            Self::Ai => f.write_str("ai"),
            Self::System => f.write_str("system"),
            Self::Other(role) => f.write_str(role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Parse a transcript using the default roles (`Human`, `AI`, `System`).
pub fn parse_chat_messages(text: &str) -> Vec<ChatMessage> {
    parse_chat_messages_with_roles(text, DEFAULT_ROLES)
}

/// Parse a transcript recognizing `roles` (matched case-insensitively).
pub fn parse_chat_messages_with_roles(text: &str, roles: &[&str]) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = Vec::new();

    for line in text.lines() {
        match split_marker(line, roles) {
            Some((role, rest)) => messages.push(ChatMessage::new(role, rest)),
            None => {
                if let Some(last) = messages.last_mut() {
                    last.content.push('\n');
                    last.content.push_str(line);
                }
            }
        }
    }

    for m in &mut messages {
        let trimmed = m.content.trim_end_matches('\n').len();
        m.content.truncate(trimmed);
    }
    messages
}

fn split_marker<'a>(line: &'a str, roles: &[&str]) -> Option<(ChatRole, &'a str)> {
    let (marker, rest) = line.split_once(": ")?;
    roles
        .iter()
        .any(|r| r.eq_ignore_ascii_case(marker))
        .then(|| (ChatRole::from_marker(marker), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_roles() {
        let msgs = parse_chat_messages("System: be brief\nHuman: 2+2?\nAI: 4");
        assert_eq!(
            msgs,
            vec![
                ChatMessage::new(ChatRole::System, "be brief"),
                ChatMessage::new(ChatRole::Human, "2+2?"),
                ChatMessage::new(ChatRole::Ai, "4"),
            ]
        );
    }

    #[test]
    fn continuation_lines_join_previous_message() {
        let msgs = parse_chat_messages("Human: line one\nline two\n\nAI: ok\n");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "line one\nline two");
        assert_eq!(msgs[1].content, "ok");
    }

    #[test]
    fn preamble_before_first_marker_is_dropped() {
        let msgs = parse_chat_messages("transcript follows\nHuman: hi");
        assert_eq!(msgs, vec![ChatMessage::new(ChatRole::Human, "hi")]);
    }

    #[test]
    fn custom_roles() {
        let msgs = parse_chat_messages_with_roles("Judge: guilty\nHuman: no", &["judge"]);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, ChatRole::Other("judge".into()));
        assert_eq!(msgs[0].content, "guilty\nHuman: no");
    }

    #[test]
    fn unknown_marker_is_plain_text() {
        let msgs = parse_chat_messages("Human: note: remember this");
        assert_eq!(msgs[0].content, "note: remember this");
    }
}
