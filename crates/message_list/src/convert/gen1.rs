use message_core::{
    ContentV2, Message, MessageV1, MessageV1Type, MessageV2, ReasoningDetail, Role,
    ToolInvocationStateV2, ToolInvocationV2, V1Content, V1Part, V2Part, WireRole,
};
use serde_json::Value;

use super::data::{encode, image_media_type, to_legacy_payload};
use super::gen2::to_prior_gen;
use super::{canonical_role, ensure_part_allowed, ConvertContext, Versioned};
use crate::error::Result;

const TOOL_RESULTS_SUFFIX: &str = "__tool-results";

pub(super) fn part_count(message: &MessageV1) -> usize {
    match &message.content {
        V1Content::Text(_) => 1,
        V1Content::Parts(parts) => parts.len(),
    }
}

/// Table step: gen 1 → gen 2.
pub(super) fn upconvert(message: Versioned, ctx: &mut ConvertContext<'_>) -> Result<Versioned> {
    match message {
        Versioned::Gen1(message) => Ok(Versioned::Gen2(to_gen2(message, ctx)?)),
        other => Ok(other),
    }
}

fn to_gen2(message: MessageV1, ctx: &mut ConvertContext<'_>) -> Result<MessageV2> {
    let role = canonical_role(message.role)?;
    let MessageV1 {
        id,
        role: wire_role,
        created_at,
        thread_id,
        resource_id,
        kind,
        content,
        tool_call_ids,
        tool_call_args,
        ..
    } = message;

    let mut parts = Vec::new();
    let mut flat_text = None;

    match content {
        V1Content::Text(text) => {
            ensure_part_allowed(wire_role, "text")?;
            parts.push(V2Part::Text { text: text.clone() });
            flat_text = Some(text);
        }
        V1Content::Parts(source_parts) => {
            let lone_result = match source_parts.as_slice() {
                [V1Part::ToolResult { tool_call_id, .. }] => Some(tool_call_id.clone()),
                _ => None,
            };

            for part in &source_parts {
                if !matches!(part, V1Part::Unknown) {
                    ensure_part_allowed(wire_role, part.type_tag())?;
                }
            }

            for part in source_parts {
                let converted = match part {
                    V1Part::Text { text } => Some(V2Part::Text { text }),
                    V1Part::Image { image, mime_type } => {
                        let media_type = image_media_type(&image, mime_type.as_deref());
                        encode(&image, &media_type).map(|url| V2Part::File {
                            mime_type: media_type,
                            data: to_legacy_payload(&url),
                        })
                    }
                    V1Part::File {
                        data, mime_type, ..
                    } => encode(&data, &mime_type).map(|url| V2Part::File {
                        mime_type,
                        data: to_legacy_payload(&url),
                    }),
                    V1Part::Reasoning { text, signature } => Some(V2Part::Reasoning {
                        reasoning: text.clone(),
                        details: vec![ReasoningDetail::Text { text, signature }],
                    }),
                    V1Part::RedactedReasoning { data } => Some(V2Part::Reasoning {
                        reasoning: String::new(),
                        details: vec![ReasoningDetail::Redacted { data }],
                    }),
                    V1Part::ToolCall {
                        tool_call_id,
                        tool_name,
                        args,
                    } => Some(invocation(
                        ToolInvocationStateV2::Call,
                        tool_call_id,
                        tool_name,
                        args,
                        None,
                    )),
                    V1Part::ToolResult {
                        tool_call_id,
                        tool_name,
                        result,
                        ..
                    } => {
                        let args = call_args(
                            &tool_call_id,
                            &parts,
                            tool_call_ids.as_deref(),
                            tool_call_args.as_deref(),
                            ctx,
                        );
                        Some(invocation(
                            ToolInvocationStateV2::Result,
                            tool_call_id,
                            tool_name,
                            args,
                            Some(result),
                        ))
                    }
                    V1Part::Unknown => {
                        ctx.dropped("unknown", "unsupported gen 1 part type");
                        None
                    }
                };

                if let Some(converted) = converted {
                    merge_invocation(&mut parts, converted);
                }
            }

            if lone_result.is_some() && parts.len() == 1 {
                ctx.sole_tool_result = lone_result;
            }
        }
    }

    Ok(MessageV2 {
        id,
        role,
        created_at,
        thread_id,
        resource_id,
        kind: Some(kind_str(kind).to_string()),
        content: ContentV2 {
            parts,
            content: flat_text,
            ..ContentV2::default()
        },
    })
}

fn invocation(
    state: ToolInvocationStateV2,
    tool_call_id: String,
    tool_name: String,
    args: Value,
    result: Option<Value>,
) -> V2Part {
    V2Part::ToolInvocation {
        tool_invocation: ToolInvocationV2 {
            state,
            step: None,
            tool_call_id,
            tool_name,
            args,
            result,
        },
    }
}

/// A result following its call in the same message replaces the call.
fn merge_invocation(parts: &mut Vec<V2Part>, part: V2Part) {
    if let V2Part::ToolInvocation { tool_invocation } = &part {
        if let Some(existing) = parts.iter_mut().find(|existing| {
            matches!(existing, V2Part::ToolInvocation { tool_invocation: other }
                if other.tool_call_id == tool_invocation.tool_call_id)
        }) {
            *existing = part;
            return;
        }
    }
    parts.push(part);
}

/// Arguments for a tool result: from the call in the same message, the
/// message's own `toolCallArgs`, or the stored call it answers.
fn call_args(
    tool_call_id: &str,
    parts: &[V2Part],
    ids: Option<&[String]>,
    args: Option<&[Value]>,
    ctx: &ConvertContext<'_>,
) -> Value {
    let same_message = parts.iter().find_map(|part| match part {
        V2Part::ToolInvocation { tool_invocation } if tool_invocation.tool_call_id == tool_call_id => {
            Some(tool_invocation.args.clone())
        }
        _ => None,
    });
    let listed = ids
        .and_then(|ids| ids.iter().position(|id| id == tool_call_id))
        .and_then(|index| args.and_then(|args| args.get(index)))
        .cloned();
    let stored = ctx.stored_call(tool_call_id).and_then(|part| match part {
        message_core::ContentPart::ToolInvocation { input, .. } => input.clone(),
        _ => None,
    });

    same_message.or(listed).or(stored).unwrap_or(Value::Null)
}

fn kind_str(kind: MessageV1Type) -> &'static str {
    match kind {
        MessageV1Type::Text => "text",
        MessageV1Type::ToolCall => "tool-call",
        MessageV1Type::ToolResult => "tool-result",
    }
}

/// Convert a canonical message to the oldest generation, via gen 2.
///
/// An assistant message holding completed tool invocations becomes two
/// messages: the assistant turn with its tool calls, then a `tool` message
/// with the results. Lossy: sources, step boundaries, file names and the
/// message `type` are not representable.
pub fn to_oldest_gen(message: &Message) -> Vec<MessageV1> {
    let prior = to_prior_gen(message);
    let mut turn = Vec::new();
    let mut results = Vec::new();
    let mut call_ids = Vec::new();
    let mut call_args = Vec::new();
    let mut tool_names = Vec::new();

    for part in prior.content.parts {
        match part {
            V2Part::Text { text } => turn.push(V1Part::Text { text }),
            V2Part::File { mime_type, data } => {
                if message.role == Role::User && mime_type.starts_with("image/") {
                    turn.push(V1Part::Image {
                        image: data.into(),
                        mime_type: Some(mime_type),
                    });
                } else {
                    turn.push(V1Part::File {
                        data: data.into(),
                        mime_type,
                        filename: None,
                    });
                }
            }
            V2Part::Reasoning { reasoning, details } => {
                let signature = details.into_iter().find_map(|detail| match detail {
                    ReasoningDetail::Text { signature, .. } => signature,
                    ReasoningDetail::Redacted { .. } => None,
                });
                turn.push(V1Part::Reasoning {
                    text: reasoning,
                    signature,
                });
            }
            V2Part::ToolInvocation { tool_invocation } => {
                let ToolInvocationV2 {
                    state,
                    tool_call_id,
                    tool_name,
                    args,
                    result,
                    ..
                } = tool_invocation;
                call_ids.push(tool_call_id.clone());
                call_args.push(args.clone());
                tool_names.push(tool_name.clone());
                if state == ToolInvocationStateV2::Result {
                    results.push(V1Part::ToolResult {
                        tool_call_id: tool_call_id.clone(),
                        tool_name: tool_name.clone(),
                        result: result.unwrap_or(Value::Null),
                        is_error: None,
                    });
                }
                turn.push(V1Part::ToolCall {
                    tool_call_id,
                    tool_name,
                    args,
                });
            }
            V2Part::Source { .. } | V2Part::StepStart | V2Part::Unknown => {}
        }
    }

    let has_calls = !call_ids.is_empty();
    let content = match turn.as_slice() {
        [V1Part::Text { text }] if !has_calls => V1Content::Text(text.clone()),
        _ => V1Content::Parts(turn),
    };

    let mut messages = vec![MessageV1 {
        id: prior.id.clone(),
        role: WireRole::from(prior.role),
        created_at: prior.created_at,
        thread_id: prior.thread_id.clone(),
        resource_id: prior.resource_id.clone(),
        kind: if has_calls {
            MessageV1Type::ToolCall
        } else {
            MessageV1Type::Text
        },
        content,
        tool_call_ids: has_calls.then(|| call_ids.clone()),
        tool_call_args: has_calls.then(|| call_args.clone()),
        tool_names: has_calls.then(|| tool_names.clone()),
    }];

    if !results.is_empty() {
        messages.push(MessageV1 {
            id: format!("{}{TOOL_RESULTS_SUFFIX}", prior.id),
            role: WireRole::Tool,
            created_at: prior.created_at,
            thread_id: prior.thread_id,
            resource_id: prior.resource_id,
            kind: MessageV1Type::ToolResult,
            content: V1Content::Parts(results),
            tool_call_ids: Some(call_ids),
            tool_call_args: Some(call_args),
            tool_names: Some(tool_names),
        });
    }

    messages
}
