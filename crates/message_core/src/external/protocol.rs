use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::DataContent;
use crate::message::WireRole;

/// A model-input message.
///
/// Both protocol generations parse into this type: the older one spells tool
/// payloads `args`/`result` and media types `mimeType`, the newer one
/// `input`/`output` and `mediaType`. Serialization always uses the newer
/// spelling.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProtocolMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: WireRole,
    pub content: ProtocolContent,
}

impl ProtocolMessage {
    pub fn new(role: WireRole, content: ProtocolContent) -> Self {
        Self {
            id: None,
            role,
            content,
        }
    }

    pub fn text(role: WireRole, text: impl Into<String>) -> Self {
        Self::new(role, ProtocolContent::Text(text.into()))
    }

    pub fn parts(role: WireRole, parts: Vec<ProtocolPart>) -> Self {
        Self::new(role, ProtocolContent::Parts(parts))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ProtocolContent {
    Text(String),
    Parts(Vec<ProtocolPart>),
}

impl ProtocolContent {
    pub fn is_empty(&self) -> bool {
        match self {
            ProtocolContent::Text(text) => text.is_empty(),
            ProtocolContent::Parts(parts) => parts.is_empty(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProtocolPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        image: DataContent,
        #[serde(default, alias = "mimeType", skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    File {
        data: DataContent,
        #[serde(alias = "mimeType")]
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    Reasoning {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        #[serde(default, alias = "args")]
        input: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        #[serde(default, alias = "result")]
        output: Value,
    },
    #[serde(other)]
    Unknown,
}

impl ProtocolPart {
    pub fn type_tag(&self) -> &'static str {
        match self {
            ProtocolPart::Text { .. } => "text",
            ProtocolPart::Image { .. } => "image",
            ProtocolPart::File { .. } => "file",
            ProtocolPart::Reasoning { .. } => "reasoning",
            ProtocolPart::ToolCall { .. } => "tool-call",
            ProtocolPart::ToolResult { .. } => "tool-result",
            ProtocolPart::Unknown => "unknown",
        }
    }
}
