//! Conversation messages and lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One entry in the session transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Still gathering information
    #[default]
    Active,
    /// Readiness gate passed, qualification pending
    ReadyToQualify,
    /// Qualification produced a qualified lead
    Qualified,
    /// Finished; no further turns expected
    Completed,
    /// Timed out without enough information
    Abandoned,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::ReadyToQualify => "ready_to_qualify",
            ConversationStatus::Qualified => "qualified",
            ConversationStatus::Completed => "completed",
            ConversationStatus::Abandoned => "abandoned",
        }
    }

    /// Whether the session is finished, successfully or not
    pub fn is_closed(&self) -> bool {
        matches!(self, ConversationStatus::Completed | ConversationStatus::Abandoned)
    }

    /// Check whether moving to `next` is a legal transition
    ///
    /// Transitions only go forward, except the active/ready loop while
    /// information is still being gathered.
    pub fn can_transition_to(&self, next: ConversationStatus) -> bool {
        use ConversationStatus::*;

        if *self == next {
            return true;
        }
        match (self, next) {
            (Active, ReadyToQualify) | (ReadyToQualify, Active) => true,
            (Active | ReadyToQualify, Qualified) => true,
            (Active | ReadyToQualify | Qualified, Abandoned) => true,
            (Active | ReadyToQualify | Qualified | Abandoned, Completed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
