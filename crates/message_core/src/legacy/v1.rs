use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::DataContent;
use crate::message::WireRole;

/// Oldest canonical generation: one message per role turn, tool results in
/// separate `tool` messages.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageV1 {
    pub id: String,
    pub role: WireRole,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: MessageV1Type,
    pub content: V1Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_args: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_names: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageV1Type {
    #[default]
    Text,
    ToolCall,
    ToolResult,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum V1Content {
    Text(String),
    Parts(Vec<V1Part>),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum V1Part {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        image: DataContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    File {
        data: DataContent,
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    Reasoning {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    RedactedReasoning {
        data: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        args: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Unknown,
}

impl V1Part {
    pub fn type_tag(&self) -> &'static str {
        match self {
            V1Part::Text { .. } => "text",
            V1Part::Image { .. } => "image",
            V1Part::File { .. } => "file",
            V1Part::Reasoning { .. } => "reasoning",
            V1Part::RedactedReasoning { .. } => "redacted-reasoning",
            V1Part::ToolCall { .. } => "tool-call",
            V1Part::ToolResult { .. } => "tool-result",
            V1Part::Unknown => "unknown",
        }
    }
}
