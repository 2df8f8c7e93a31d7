use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentPart, MessageContent, Role};

/// The current canonical message generation.
///
/// Identity is `id`; once stored, no two messages share an `id`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub content: MessageContent,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            id: id.into(),
            role,
            created_at: Utc::now(),
            thread_id: None,
            resource_id: None,
            kind: None,
            content: MessageContent::new(parts),
        }
    }

    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Role::User, vec![ContentPart::text(text)])
    }

    pub fn assistant(id: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self::new(id, Role::Assistant, parts)
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn parts(&self) -> &[ContentPart] {
        &self.content.parts
    }
}
