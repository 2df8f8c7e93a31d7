//! ContentPart - Canonical message content types
//!
//! Defines the parts that can appear in the body of a canonical message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator carried by `content.format` on the current generation.
pub const CURRENT_FORMAT: u8 = 3;

fn current_format() -> u8 {
    CURRENT_FORMAT
}

/// Lifecycle of a tool invocation inside a message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    /// Arguments are still being streamed.
    InputStreaming,
    /// The call is complete but no result has arrived.
    InputAvailable,
    /// The result is attached.
    OutputAvailable,
}

impl ToolState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolState::InputStreaming => "input-streaming",
            ToolState::InputAvailable => "input-available",
            ToolState::OutputAvailable => "output-available",
        }
    }

    /// A call that cannot be replayed to a model yet.
    pub fn is_in_flight(&self) -> bool {
        !matches!(self, ToolState::OutputAvailable)
    }
}

/// A part of canonical message content
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    /// Text content
    Text { text: String },

    /// File content, inline (data URL) or by reference
    #[serde(rename_all = "camelCase")]
    File {
        url: String,
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },

    /// Model reasoning text
    Reasoning { text: String },

    /// A cited source
    #[serde(rename_all = "camelCase")]
    SourceUrl {
        source_id: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },

    /// Marks the start of a new model step
    #[serde(alias = "step-start")]
    StepBoundary,

    /// A tool call and, once available, its result
    #[serde(rename_all = "camelCase")]
    ToolInvocation {
        tool_call_id: String,
        tool_name: String,
        state: ToolState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
    },
}

impl ContentPart {
    /// Create a text content part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a reasoning content part
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }

    /// Create a file content part
    pub fn file(url: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::File {
            url: url.into(),
            media_type: media_type.into(),
            filename: None,
        }
    }

    /// Create a tool invocation for a call whose result has not arrived yet
    pub fn tool_call(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Self {
        Self::ToolInvocation {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            state: ToolState::InputAvailable,
            input: Some(input),
            output: None,
        }
    }

    /// Create a completed tool invocation
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Option<Value>,
        output: Value,
    ) -> Self {
        Self::ToolInvocation {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            state: ToolState::OutputAvailable,
            input,
            output: Some(output),
        }
    }

    /// The wire `type` tag of this part
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::File { .. } => "file",
            Self::Reasoning { .. } => "reasoning",
            Self::SourceUrl { .. } => "source-url",
            Self::StepBoundary => "step-boundary",
            Self::ToolInvocation { .. } => "tool-invocation",
        }
    }

    /// Get text content if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Self::ToolInvocation { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }

    pub fn tool_state(&self) -> Option<ToolState> {
        match self {
            Self::ToolInvocation { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// Step boundaries carry no content and are skipped when comparing part types.
    pub fn is_substantive(&self) -> bool {
        !matches!(self, Self::StepBoundary)
    }
}

/// Body of a canonical message
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageContent {
    #[serde(default = "current_format")]
    pub format: u8,
    #[serde(default)]
    pub parts: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MessageContent {
    pub fn new(parts: Vec<ContentPart>) -> Self {
        Self {
            format: CURRENT_FORMAT,
            parts,
            metadata: None,
        }
    }

    /// Create content with a single text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ContentPart::text(text)])
    }

    /// Add a content part
    pub fn push(&mut self, part: ContentPart) {
        self.parts.push(part);
    }

    /// Get all text content concatenated
    pub fn as_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn first_substantive(&self) -> Option<&ContentPart> {
        self.parts.iter().find(|p| p.is_substantive())
    }

    pub fn last_substantive(&self) -> Option<&ContentPart> {
        self.parts.iter().rev().find(|p| p.is_substantive())
    }

    /// Find the tool invocation carrying `tool_call_id`.
    pub fn tool_invocation(&self, tool_call_id: &str) -> Option<&ContentPart> {
        self.parts
            .iter()
            .rev()
            .find(|p| p.tool_call_id() == Some(tool_call_id))
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}
