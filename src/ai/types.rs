use serde::{Deserialize, Serialize};

use super::AiError;

/// Transport seam between the assistant and a remote completion service.
///
/// One call is one chat completion: a system role string plus a user role
/// string in, a single text blob out.
pub trait LlmClient: Send + Sync {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError>;

    /// Whether a credential is configured. Checked before any request is built.
    fn has_credential(&self) -> bool;
}

/// Chat message role as understood by chat-completion APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
        }
    }
}
