use chrono::Utc;
use message_core::{
    ContentPart, Message, MessageContent, ToolState, UiMessage, UiPart, UiToolState, WireRole,
};
use serde_json::json;

use super::gen2::{attachment_to_part, convert_part};
use super::{canonical_role, ensure_part_allowed, push_part, ConvertContext};
use crate::error::Result;

/// Convert a UI message (either generation) to the current generation.
pub(super) fn to_canonical(message: UiMessage, ctx: &mut ConvertContext<'_>) -> Result<Message> {
    let role = canonical_role(message.role)?;
    let UiMessage {
        id,
        role: wire_role,
        created_at,
        parts: source_parts,
        metadata,
        experimental_attachments,
    } = message;

    for part in &source_parts {
        if let Some(part_type) = checked_type(part) {
            ensure_part_allowed(wire_role, part_type)?;
        }
    }

    let mut parts = Vec::with_capacity(source_parts.len());
    for part in source_parts {
        if let Some(part) = convert(part, ctx) {
            push_part(&mut parts, part);
        }
    }
    for attachment in experimental_attachments.unwrap_or_default() {
        let duplicate = parts
            .iter()
            .any(|p| matches!(p, ContentPart::File { url, .. } if *url == attachment.url));
        if !duplicate {
            parts.push(attachment_to_part(attachment));
        }
    }

    Ok(Message {
        id,
        role,
        created_at: created_at.unwrap_or_else(Utc::now),
        thread_id: None,
        resource_id: None,
        kind: None,
        content: MessageContent {
            metadata,
            ..MessageContent::new(parts)
        },
    })
}

/// Part types subject to the per-role rules; tool parts count as calls.
fn checked_type(part: &UiPart) -> Option<&'static str> {
    match part {
        UiPart::Text { .. } => Some("text"),
        UiPart::Reasoning { .. } => Some("reasoning"),
        UiPart::File { .. } => Some("file"),
        UiPart::Tool { .. } => Some("tool-call"),
        _ => None,
    }
}

fn convert(part: UiPart, ctx: &ConvertContext<'_>) -> Option<ContentPart> {
    match part {
        UiPart::Text { text } => Some(ContentPart::Text { text }),
        UiPart::Reasoning { text } => {
            if text.is_empty() {
                ctx.dropped("reasoning", "no reasoning text");
                None
            } else {
                Some(ContentPart::Reasoning { text })
            }
        }
        UiPart::File {
            url,
            media_type,
            filename,
        } => Some(ContentPart::File {
            url,
            media_type,
            filename,
        }),
        UiPart::SourceUrl {
            source_id,
            url,
            title,
        } => Some(ContentPart::SourceUrl {
            source_id,
            url,
            title,
        }),
        UiPart::StepStart => Some(ContentPart::StepBoundary),
        UiPart::Tool {
            tool_name,
            tool_call_id,
            state,
            input,
            output,
            error_text,
            ..
        } => {
            let (state, output) = match state {
                UiToolState::InputStreaming => (ToolState::InputStreaming, None),
                UiToolState::InputAvailable => (ToolState::InputAvailable, None),
                UiToolState::OutputAvailable => (ToolState::OutputAvailable, output),
                UiToolState::OutputError => (
                    ToolState::OutputAvailable,
                    Some(json!({ "error": error_text.unwrap_or_default() })),
                ),
            };
            Some(ContentPart::ToolInvocation {
                tool_call_id,
                tool_name,
                state,
                input,
                output,
            })
        }
        UiPart::Legacy(part) => convert_part(part, ctx),
        UiPart::Unknown(kind) => {
            ctx.dropped(&kind, "unsupported ui part type");
            None
        }
    }
}

/// Project a canonical message onto the UI protocol.
pub fn to_ui_message(message: &Message) -> UiMessage {
    let parts = message
        .content
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::Text { text } => UiPart::Text { text: text.clone() },
            ContentPart::Reasoning { text } => UiPart::Reasoning { text: text.clone() },
            ContentPart::File {
                url,
                media_type,
                filename,
            } => UiPart::File {
                url: url.clone(),
                media_type: media_type.clone(),
                filename: filename.clone(),
            },
            ContentPart::SourceUrl {
                source_id,
                url,
                title,
            } => UiPart::SourceUrl {
                source_id: source_id.clone(),
                url: url.clone(),
                title: title.clone(),
            },
            ContentPart::StepBoundary => UiPart::StepStart,
            ContentPart::ToolInvocation {
                tool_call_id,
                tool_name,
                state,
                input,
                output,
            } => UiPart::Tool {
                tool_name: tool_name.clone(),
                tool_call_id: tool_call_id.clone(),
                state: match state {
                    ToolState::InputStreaming => UiToolState::InputStreaming,
                    ToolState::InputAvailable => UiToolState::InputAvailable,
                    ToolState::OutputAvailable => UiToolState::OutputAvailable,
                },
                input: input.clone(),
                output: output.clone(),
                error_text: None,
                dynamic: false,
            },
        })
        .collect();

    UiMessage {
        id: message.id.clone(),
        role: WireRole::from(message.role),
        created_at: Some(message.created_at),
        parts,
        metadata: message.content.metadata.clone(),
        experimental_attachments: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MessageListError;
    use message_core::Role;
    use serde_json::Value;

    fn parse(value: Value) -> UiMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_newer_parts_convert() {
        let mut ctx = ConvertContext::new(None);
        let message = to_canonical(
            parse(json!({
                "id": "a1",
                "role": "assistant",
                "createdAt": "2024-05-01T10:00:00Z",
                "parts": [
                    {"type": "step-start"},
                    {"type": "text", "text": "looking"},
                    {"type": "tool-weather", "toolCallId": "c1", "state": "output-error", "input": {}, "errorText": "offline"},
                    {"type": "data-progress", "data": 1}
                ]
            })),
            &mut ctx,
        )
        .unwrap();

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.parts().len(), 3);
        assert_eq!(
            message.parts()[2],
            ContentPart::tool_result("c1", "weather", Some(json!({})), json!({"error": "offline"}))
        );
        assert_eq!(message.created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_older_parts_and_attachments() {
        let mut ctx = ConvertContext::new(None);
        let message = to_canonical(
            parse(json!({
                "id": "u1",
                "role": "user",
                "parts": [
                    {"type": "text", "text": "see attached"},
                    {"type": "file", "mimeType": "text/plain", "data": "aGk="}
                ],
                "experimental_attachments": [
                    {"url": "https://x/a.png", "contentType": "image/png", "name": "a.png"}
                ]
            })),
            &mut ctx,
        )
        .unwrap();

        assert_eq!(
            message.parts(),
            &[
                ContentPart::text("see attached"),
                ContentPart::file("data:text/plain;base64,aGk=", "text/plain"),
                ContentPart::File {
                    url: "https://x/a.png".to_string(),
                    media_type: "image/png".to_string(),
                    filename: Some("a.png".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_user_tool_part_is_incompatible() {
        let mut ctx = ConvertContext::new(None);
        let err = to_canonical(
            parse(json!({
                "id": "u1",
                "role": "user",
                "parts": [{"type": "tool-x", "toolCallId": "c1", "state": "input-available"}]
            })),
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(err, MessageListError::IncompatibleContent { .. }));
    }

    #[test]
    fn test_to_ui_message_names_tool_parts() {
        let message = Message::assistant(
            "a1",
            vec![ContentPart::tool_result("c1", "search", Some(json!({"q": 1})), json!("ok"))],
        );
        let ui = to_ui_message(&message);
        let value = serde_json::to_value(&ui).unwrap();
        assert_eq!(value["parts"][0]["type"], json!("tool-search"));
        assert_eq!(value["parts"][0]["state"], json!("output-available"));
        assert_eq!(value["role"], json!("assistant"));
    }
}
