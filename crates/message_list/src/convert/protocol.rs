use chrono::Utc;
use message_core::{
    ContentPart, DataContent, Message, MessageContent, ProtocolContent, ProtocolMessage,
    ProtocolPart, Role, ToolState, WireRole,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::data::{encode, image_media_type};
use super::{canonical_role, ensure_part_allowed, push_part, ConvertContext};
use crate::error::Result;

pub(super) fn part_count(message: &ProtocolMessage) -> usize {
    match &message.content {
        ProtocolContent::Text(_) => 1,
        ProtocolContent::Parts(parts) => parts.len(),
    }
}

/// Convert a model-input message to the current generation.
///
/// Tool calls and their results collapse into one tool invocation. A result
/// is matched against calls earlier in the same message, then against the
/// most recent stored assistant message; unmatched results are dropped.
pub(super) fn to_canonical(message: ProtocolMessage, ctx: &mut ConvertContext<'_>) -> Result<Message> {
    let role = canonical_role(message.role)?;
    let ProtocolMessage {
        id,
        role: wire_role,
        content,
    } = message;

    let parts = match content {
        ProtocolContent::Text(text) => {
            ensure_part_allowed(wire_role, "text")?;
            vec![ContentPart::text(text)]
        }
        ProtocolContent::Parts(source_parts) => {
            for part in &source_parts {
                if !matches!(part, ProtocolPart::Unknown) {
                    ensure_part_allowed(wire_role, part.type_tag())?;
                }
            }
            if let [ProtocolPart::ToolResult { tool_call_id, .. }] = source_parts.as_slice() {
                ctx.sole_tool_result = Some(tool_call_id.clone());
            }
            convert_parts(source_parts, ctx)
        }
    };

    Ok(Message {
        id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        role,
        created_at: Utc::now(),
        thread_id: None,
        resource_id: None,
        kind: None,
        content: MessageContent::new(parts),
    })
}

fn convert_parts(source_parts: Vec<ProtocolPart>, ctx: &ConvertContext<'_>) -> Vec<ContentPart> {
    let mut parts: Vec<ContentPart> = Vec::with_capacity(source_parts.len());

    for part in source_parts {
        match part {
            ProtocolPart::Text { text } => parts.push(ContentPart::Text { text }),
            ProtocolPart::Image { image, media_type } => {
                let media_type = image_media_type(&image, media_type.as_deref());
                if let Some(url) = encode(&image, &media_type) {
                    parts.push(ContentPart::File {
                        url,
                        media_type,
                        filename: None,
                    });
                }
            }
            ProtocolPart::File {
                data,
                media_type,
                filename,
            } => {
                if let Some(url) = encode(&data, &media_type) {
                    parts.push(ContentPart::File {
                        url,
                        media_type,
                        filename,
                    });
                }
            }
            ProtocolPart::Reasoning { text } => {
                if text.is_empty() {
                    ctx.dropped("reasoning", "no reasoning text");
                } else {
                    parts.push(ContentPart::Reasoning { text });
                }
            }
            ProtocolPart::ToolCall {
                tool_call_id,
                tool_name,
                input,
            } => push_part(
                &mut parts,
                ContentPart::ToolInvocation {
                    tool_call_id,
                    tool_name,
                    state: ToolState::InputAvailable,
                    input: (!input.is_null()).then_some(input),
                    output: None,
                },
            ),
            ProtocolPart::ToolResult {
                tool_call_id,
                tool_name,
                output,
            } => attach_result(&mut parts, tool_call_id, tool_name, output, ctx),
            ProtocolPart::Unknown => ctx.dropped("unknown", "unsupported protocol part type"),
        }
    }

    parts
}

fn attach_result(
    parts: &mut Vec<ContentPart>,
    tool_call_id: String,
    tool_name: String,
    output: Value,
    ctx: &ConvertContext<'_>,
) {
    if let Some(ContentPart::ToolInvocation {
        state,
        output: stored_output,
        ..
    }) = parts
        .iter_mut()
        .find(|part| part.tool_call_id() == Some(tool_call_id.as_str()))
    {
        *state = ToolState::OutputAvailable;
        *stored_output = Some(output);
        return;
    }

    match ctx.stored_call(&tool_call_id) {
        Some(ContentPart::ToolInvocation { input, .. }) => parts.push(ContentPart::ToolInvocation {
            tool_call_id,
            tool_name,
            state: ToolState::OutputAvailable,
            input: input.clone(),
            output: Some(output),
        }),
        _ => {
            debug!(tool_call_id = %tool_call_id, tool_name = %tool_name, "tool result has no matching call");
            ctx.dropped("tool-result", "no matching tool call");
        }
    }
}

/// Project canonical messages onto the model-input protocol.
///
/// In-flight tool invocations are stripped and messages left without content
/// are skipped. Each assistant step becomes an assistant message carrying
/// its tool calls, followed by a `tool` message with their results.
pub fn to_model_input<'a, I>(messages: I) -> Vec<ProtocolMessage>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut output = Vec::new();
    for message in messages {
        match message.role {
            Role::User => {
                let parts: Vec<ProtocolPart> = message
                    .content
                    .parts
                    .iter()
                    .filter_map(user_part)
                    .collect();
                if !parts.is_empty() {
                    output.push(ProtocolMessage::new(WireRole::User, collapse(parts)));
                }
            }
            Role::Assistant => {
                for step in message.content.parts.split(|part| *part == ContentPart::StepBoundary) {
                    push_assistant_step(&mut output, step);
                }
            }
        }
    }
    output
}

fn user_part(part: &ContentPart) -> Option<ProtocolPart> {
    match part {
        ContentPart::Text { text } => Some(ProtocolPart::Text { text: text.clone() }),
        ContentPart::File {
            url,
            media_type,
            filename,
        } => Some(file_part(url, media_type, filename.as_deref(), true)),
        _ => None,
    }
}

fn file_part(url: &str, media_type: &str, filename: Option<&str>, allow_image: bool) -> ProtocolPart {
    if allow_image && media_type.starts_with("image/") {
        ProtocolPart::Image {
            image: DataContent::Text(url.to_string()),
            media_type: Some(media_type.to_string()),
        }
    } else {
        ProtocolPart::File {
            data: DataContent::Text(url.to_string()),
            media_type: media_type.to_string(),
            filename: filename.map(str::to_string),
        }
    }
}

fn push_assistant_step(output: &mut Vec<ProtocolMessage>, step: &[ContentPart]) {
    let mut turn = Vec::new();
    let mut results = Vec::new();

    for part in step {
        match part {
            ContentPart::Text { text } => turn.push(ProtocolPart::Text { text: text.clone() }),
            ContentPart::Reasoning { text } => {
                turn.push(ProtocolPart::Reasoning { text: text.clone() })
            }
            ContentPart::File {
                url,
                media_type,
                filename,
            } => turn.push(file_part(url, media_type, filename.as_deref(), false)),
            ContentPart::ToolInvocation {
                tool_call_id,
                tool_name,
                state,
                input,
                output: result,
            } => {
                if state.is_in_flight() {
                    continue;
                }
                turn.push(ProtocolPart::ToolCall {
                    tool_call_id: tool_call_id.clone(),
                    tool_name: tool_name.clone(),
                    input: input.clone().unwrap_or(Value::Null),
                });
                results.push(ProtocolPart::ToolResult {
                    tool_call_id: tool_call_id.clone(),
                    tool_name: tool_name.clone(),
                    output: result.clone().unwrap_or(Value::Null),
                });
            }
            ContentPart::SourceUrl { .. } | ContentPart::StepBoundary => {}
        }
    }

    if !turn.is_empty() {
        output.push(ProtocolMessage::new(WireRole::Assistant, collapse(turn)));
    }
    if !results.is_empty() {
        output.push(ProtocolMessage::parts(WireRole::Tool, results));
    }
}

/// A lone text part is sent as plain string content.
fn collapse(parts: Vec<ProtocolPart>) -> ProtocolContent {
    match parts.as_slice() {
        [ProtocolPart::Text { text }] => ProtocolContent::Text(text.clone()),
        _ => ProtocolContent::Parts(parts),
    }
}
