use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::legacy::{Attachment, V2Part};
use crate::message::WireRole;

const TOOL_PREFIX: &str = "tool-";
const DYNAMIC_TOOL: &str = "dynamic-tool";

/// A message as exchanged with a chat UI.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub id: String,
    pub role: WireRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub parts: Vec<UiPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(
        rename = "experimental_attachments",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub experimental_attachments: Option<Vec<Attachment>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UiToolState {
    InputStreaming,
    InputAvailable,
    OutputAvailable,
    OutputError,
}

/// A UI message part.
///
/// Tool parts are tagged `tool-<toolName>` (or `dynamic-tool` with an explicit
/// `toolName`), so this type is parsed by hand. Parts in the older UI
/// generation share their shape with the gen 2 canonical parts and are kept
/// as [`UiPart::Legacy`].
#[derive(Clone, Debug, PartialEq)]
pub enum UiPart {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
    },
    File {
        url: String,
        media_type: String,
        filename: Option<String>,
    },
    SourceUrl {
        source_id: String,
        url: String,
        title: Option<String>,
    },
    StepStart,
    Tool {
        tool_name: String,
        tool_call_id: String,
        state: UiToolState,
        input: Option<Value>,
        output: Option<Value>,
        error_text: Option<String>,
        dynamic: bool,
    },
    Legacy(V2Part),
    /// Any other part type, kept only by its tag.
    Unknown(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileFields {
    url: String,
    media_type: String,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceUrlFields {
    source_id: String,
    url: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolFields {
    #[serde(default)]
    tool_name: Option<String>,
    tool_call_id: String,
    state: UiToolState,
    #[serde(default)]
    input: Option<Value>,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error_text: Option<String>,
}

#[derive(Deserialize)]
struct TextFields {
    text: String,
}

impl UiPart {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| serde_json::Error::custom("ui part is missing a string `type`"))?
            .to_string();
        let has_text = value.get("text").is_some();
        let has_url = value.get("url").is_some();

        let part = match kind.as_str() {
            "text" => {
                let fields: TextFields = serde_json::from_value(value)?;
                UiPart::Text { text: fields.text }
            }
            "reasoning" if has_text => {
                let fields: TextFields = serde_json::from_value(value)?;
                UiPart::Reasoning { text: fields.text }
            }
            "file" if has_url => {
                let fields: FileFields = serde_json::from_value(value)?;
                UiPart::File {
                    url: fields.url,
                    media_type: fields.media_type,
                    filename: fields.filename,
                }
            }
            "source-url" => {
                let fields: SourceUrlFields = serde_json::from_value(value)?;
                UiPart::SourceUrl {
                    source_id: fields.source_id,
                    url: fields.url,
                    title: fields.title,
                }
            }
            "step-start" => UiPart::StepStart,
            "reasoning" | "file" | "source" | "tool-invocation" => {
                UiPart::Legacy(serde_json::from_value(value)?)
            }
            DYNAMIC_TOOL => {
                let fields: ToolFields = serde_json::from_value(value)?;
                let tool_name = fields
                    .tool_name
                    .clone()
                    .ok_or_else(|| serde_json::Error::custom("dynamic-tool part is missing `toolName`"))?;
                Self::tool(tool_name, fields, true)
            }
            other if other.starts_with(TOOL_PREFIX) => {
                let tool_name = other[TOOL_PREFIX.len()..].to_string();
                let fields: ToolFields = serde_json::from_value(value)?;
                Self::tool(tool_name, fields, false)
            }
            _ => UiPart::Unknown(kind),
        };
        Ok(part)
    }

    fn tool(tool_name: String, fields: ToolFields, dynamic: bool) -> Self {
        UiPart::Tool {
            tool_name,
            tool_call_id: fields.tool_call_id,
            state: fields.state,
            input: fields.input,
            output: fields.output,
            error_text: fields.error_text,
            dynamic,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let value = match self {
            UiPart::Text { text } => json!({"type": "text", "text": text}),
            UiPart::Reasoning { text } => json!({"type": "reasoning", "text": text}),
            UiPart::File {
                url,
                media_type,
                filename,
            } => {
                let mut value = json!({"type": "file", "url": url, "mediaType": media_type});
                insert_some(&mut value, "filename", filename.clone().map(Value::String));
                value
            }
            UiPart::SourceUrl {
                source_id,
                url,
                title,
            } => {
                let mut value = json!({"type": "source-url", "sourceId": source_id, "url": url});
                insert_some(&mut value, "title", title.clone().map(Value::String));
                value
            }
            UiPart::StepStart => json!({"type": "step-start"}),
            UiPart::Tool {
                tool_name,
                tool_call_id,
                state,
                input,
                output,
                error_text,
                dynamic,
            } => {
                let mut value = if *dynamic {
                    json!({"type": DYNAMIC_TOOL, "toolName": tool_name})
                } else {
                    json!({"type": format!("{TOOL_PREFIX}{tool_name}")})
                };
                insert_some(&mut value, "toolCallId", Some(Value::String(tool_call_id.clone())));
                insert_some(&mut value, "state", Some(serde_json::to_value(state)?));
                insert_some(&mut value, "input", input.clone());
                insert_some(&mut value, "output", output.clone());
                insert_some(&mut value, "errorText", error_text.clone().map(Value::String));
                value
            }
            UiPart::Legacy(part) => serde_json::to_value(part)?,
            UiPart::Unknown(kind) => json!({"type": kind}),
        };
        Ok(value)
    }
}

fn insert_some(target: &mut Value, key: &str, value: Option<Value>) {
    if let (Some(map), Some(value)) = (target.as_object_mut(), value) {
        map.insert(key.to_string(), value);
    }
}

impl<'de> Deserialize<'de> for UiPart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        UiPart::from_value(value).map_err(D::Error::custom)
    }
}

impl Serialize for UiPart {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::Error as _;
        self.to_value()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_tool_part() {
        let part = UiPart::from_value(json!({
            "type": "tool-weather",
            "toolCallId": "c1",
            "state": "output-available",
            "input": {"city": "Oslo"},
            "output": {"temp": 3}
        }))
        .unwrap();

        match &part {
            UiPart::Tool {
                tool_name,
                state,
                dynamic,
                ..
            } => {
                assert_eq!(tool_name, "weather");
                assert_eq!(*state, UiToolState::OutputAvailable);
                assert!(!dynamic);
            }
            other => panic!("unexpected part {other:?}"),
        }

        let back = part.to_value().unwrap();
        assert_eq!(back["type"], json!("tool-weather"));
        assert_eq!(back["output"], json!({"temp": 3}));
    }

    #[test]
    fn test_dynamic_tool_requires_name() {
        let err = UiPart::from_value(json!({
            "type": "dynamic-tool",
            "toolCallId": "c1",
            "state": "input-available"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("toolName"));
    }

    #[test]
    fn test_older_generation_parts_are_legacy() {
        let part = UiPart::from_value(json!({
            "type": "reasoning",
            "reasoning": "thinking",
            "details": []
        }))
        .unwrap();
        assert!(matches!(part, UiPart::Legacy(V2Part::Reasoning { .. })));

        let part = UiPart::from_value(json!({"type": "file", "mimeType": "text/plain", "data": "aGk="}))
            .unwrap();
        assert!(matches!(part, UiPart::Legacy(V2Part::File { .. })));
    }

    #[test]
    fn test_unknown_part_keeps_tag() {
        let part = UiPart::from_value(json!({"type": "data-progress", "data": 3})).unwrap();
        assert_eq!(part, UiPart::Unknown("data-progress".to_string()));
    }
}
