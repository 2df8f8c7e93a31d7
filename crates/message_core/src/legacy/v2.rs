use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::Role;

/// Discriminator carried by `content.format` on the prior generation.
pub const V2_FORMAT: u8 = 2;

fn v2_format() -> u8 {
    V2_FORMAT
}

/// Prior canonical generation. Still the shape handed to storage.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageV2 {
    pub id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub content: ContentV2,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentV2 {
    #[serde(default = "v2_format")]
    pub format: u8,
    #[serde(default)]
    pub parts: Vec<V2Part>,
    /// Flattened text, kept for readers that predate `parts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_invocations: Option<Vec<ToolInvocationV2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(
        rename = "experimental_attachments",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub experimental_attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Default for ContentV2 {
    fn default() -> Self {
        Self {
            format: V2_FORMAT,
            parts: Vec::new(),
            content: None,
            tool_invocations: None,
            reasoning: None,
            experimental_attachments: None,
            metadata: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum V2Part {
    Text {
        text: String,
    },
    Reasoning {
        reasoning: String,
        #[serde(default)]
        details: Vec<ReasoningDetail>,
    },
    #[serde(rename_all = "camelCase")]
    ToolInvocation {
        tool_invocation: ToolInvocationV2,
    },
    Source {
        source: SourceV2,
    },
    #[serde(rename_all = "camelCase")]
    File {
        mime_type: String,
        data: String,
    },
    StepStart,
    #[serde(other)]
    Unknown,
}

impl V2Part {
    pub fn type_tag(&self) -> &'static str {
        match self {
            V2Part::Text { .. } => "text",
            V2Part::Reasoning { .. } => "reasoning",
            V2Part::ToolInvocation { .. } => "tool-invocation",
            V2Part::Source { .. } => "source",
            V2Part::File { .. } => "file",
            V2Part::StepStart => "step-start",
            V2Part::Unknown => "unknown",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReasoningDetail {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    Redacted {
        data: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ToolInvocationStateV2 {
    PartialCall,
    Call,
    Result,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocationV2 {
    pub state: ToolInvocationStateV2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceV2 {
    #[serde(default = "url_source_type")]
    pub source_type: String,
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn url_source_type() -> String {
    "url".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
