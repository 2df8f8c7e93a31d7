use message_core::{
    Attachment, ContentPart, ContentV2, Message, MessageContent, MessageV2, ReasoningDetail,
    SourceV2, ToolInvocationStateV2, ToolInvocationV2, ToolState, V2Part,
};
use serde_json::Value;

use super::data::{to_legacy_payload, to_url};
use super::{push_part, ConvertContext, Versioned};
use crate::error::Result;

/// Table step: gen 2 → current.
pub(super) fn upconvert(message: Versioned, ctx: &mut ConvertContext<'_>) -> Result<Versioned> {
    match message {
        Versioned::Gen2(message) => Ok(Versioned::Current(to_current(message, ctx))),
        other => Ok(other),
    }
}

fn to_current(message: MessageV2, ctx: &ConvertContext<'_>) -> Message {
    let MessageV2 {
        id,
        role,
        created_at,
        thread_id,
        resource_id,
        kind,
        content,
    } = message;
    let ContentV2 {
        parts: source_parts,
        content: flat_text,
        tool_invocations,
        reasoning,
        experimental_attachments,
        metadata,
        ..
    } = content;

    let mut parts = Vec::with_capacity(source_parts.len());
    for part in source_parts {
        if let Some(part) = convert_part(part, ctx) {
            push_part(&mut parts, part);
        }
    }

    // Older writers only filled the flat fields; fold them in when `parts`
    // does not already carry the same content.
    if let Some(text) = flat_text.filter(|t| !t.is_empty()) {
        if !parts.iter().any(|p| matches!(p, ContentPart::Text { .. })) {
            parts.insert(0, ContentPart::text(text));
        }
    }
    if let Some(text) = reasoning.filter(|r| !r.is_empty()) {
        if !parts.iter().any(|p| matches!(p, ContentPart::Reasoning { .. })) {
            parts.insert(0, ContentPart::reasoning(text));
        }
    }
    for invocation in tool_invocations.unwrap_or_default() {
        if parts
            .iter()
            .all(|p| p.tool_call_id() != Some(invocation.tool_call_id.as_str()))
        {
            parts.push(invocation_to_part(invocation));
        }
    }
    parts.extend(attachments_to_parts(experimental_attachments, &parts));

    Message {
        id,
        role,
        created_at,
        thread_id,
        resource_id,
        kind,
        content: MessageContent {
            metadata,
            ..MessageContent::new(parts)
        },
    }
}

/// Convert one gen 2 part. Also used for parts of the older UI generation.
pub(super) fn convert_part(part: V2Part, ctx: &ConvertContext<'_>) -> Option<ContentPart> {
    match part {
        V2Part::Text { text } => Some(ContentPart::Text { text }),
        V2Part::Reasoning { reasoning, details } => {
            let text = if reasoning.is_empty() {
                details
                    .into_iter()
                    .filter_map(|detail| match detail {
                        ReasoningDetail::Text { text, .. } => Some(text),
                        ReasoningDetail::Redacted { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("")
            } else {
                reasoning
            };
            if text.is_empty() {
                ctx.dropped("reasoning", "no reasoning text");
                None
            } else {
                Some(ContentPart::Reasoning { text })
            }
        }
        V2Part::ToolInvocation { tool_invocation } => Some(invocation_to_part(tool_invocation)),
        V2Part::Source { source } => {
            if source.source_type == "url" {
                Some(ContentPart::SourceUrl {
                    source_id: source.id,
                    url: source.url,
                    title: source.title,
                })
            } else {
                ctx.dropped("source", "only url sources are kept");
                None
            }
        }
        V2Part::File { mime_type, data } => Some(ContentPart::File {
            url: to_url(&mime_type, &data),
            media_type: mime_type,
            filename: None,
        }),
        V2Part::StepStart => Some(ContentPart::StepBoundary),
        V2Part::Unknown => {
            ctx.dropped("unknown", "unsupported gen 2 part type");
            None
        }
    }
}

fn invocation_to_part(invocation: ToolInvocationV2) -> ContentPart {
    let ToolInvocationV2 {
        state,
        tool_call_id,
        tool_name,
        args,
        result,
        ..
    } = invocation;
    let input = (!args.is_null()).then_some(args);

    match state {
        ToolInvocationStateV2::PartialCall | ToolInvocationStateV2::Call => {
            ContentPart::ToolInvocation {
                tool_call_id,
                tool_name,
                state: if state == ToolInvocationStateV2::Call {
                    ToolState::InputAvailable
                } else {
                    ToolState::InputStreaming
                },
                input,
                output: None,
            }
        }
        ToolInvocationStateV2::Result => ContentPart::ToolInvocation {
            tool_call_id,
            tool_name,
            state: ToolState::OutputAvailable,
            input,
            output: Some(result.unwrap_or(Value::Null)),
        },
    }
}

fn attachments_to_parts(
    attachments: Option<Vec<Attachment>>,
    existing: &[ContentPart],
) -> Vec<ContentPart> {
    attachments
        .unwrap_or_default()
        .into_iter()
        .filter(|attachment| {
            !existing
                .iter()
                .any(|p| matches!(p, ContentPart::File { url, .. } if *url == attachment.url))
        })
        .map(attachment_to_part)
        .collect()
}

pub(super) fn attachment_to_part(attachment: Attachment) -> ContentPart {
    let media_type = attachment
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    ContentPart::File {
        url: to_url(&media_type, &attachment.url),
        media_type,
        filename: attachment.name,
    }
}

/// Convert a canonical message to the prior generation.
///
/// Lossy: file `filename` is not representable in gen 2. The flat
/// `content`, `reasoning` and `toolInvocations` fields are filled for older
/// readers.
pub fn to_prior_gen(message: &Message) -> MessageV2 {
    let mut parts = Vec::with_capacity(message.content.parts.len());
    let mut invocations = Vec::new();
    let mut reasoning = Vec::new();

    for part in &message.content.parts {
        let converted = match part {
            ContentPart::Text { text } => V2Part::Text { text: text.clone() },
            ContentPart::File { url, media_type, .. } => V2Part::File {
                mime_type: media_type.clone(),
                data: to_legacy_payload(url),
            },
            ContentPart::Reasoning { text } => {
                reasoning.push(text.as_str());
                V2Part::Reasoning {
                    reasoning: text.clone(),
                    details: vec![ReasoningDetail::Text {
                        text: text.clone(),
                        signature: None,
                    }],
                }
            }
            ContentPart::SourceUrl {
                source_id,
                url,
                title,
            } => V2Part::Source {
                source: SourceV2 {
                    source_type: "url".to_string(),
                    id: source_id.clone(),
                    url: url.clone(),
                    title: title.clone(),
                },
            },
            ContentPart::StepBoundary => V2Part::StepStart,
            ContentPart::ToolInvocation {
                tool_call_id,
                tool_name,
                state,
                input,
                output,
            } => {
                let invocation = ToolInvocationV2 {
                    state: match state {
                        ToolState::InputStreaming => ToolInvocationStateV2::PartialCall,
                        ToolState::InputAvailable => ToolInvocationStateV2::Call,
                        ToolState::OutputAvailable => ToolInvocationStateV2::Result,
                    },
                    step: None,
                    tool_call_id: tool_call_id.clone(),
                    tool_name: tool_name.clone(),
                    args: input.clone().unwrap_or(Value::Null),
                    result: match state {
                        ToolState::OutputAvailable => output.clone(),
                        _ => None,
                    },
                };
                invocations.push(invocation.clone());
                V2Part::ToolInvocation {
                    tool_invocation: invocation,
                }
            }
        };
        parts.push(converted);
    }

    let text = message.content.as_text();
    MessageV2 {
        id: message.id.clone(),
        role: message.role,
        created_at: message.created_at,
        thread_id: message.thread_id.clone(),
        resource_id: message.resource_id.clone(),
        kind: message.kind.clone(),
        content: ContentV2 {
            parts,
            content: (!text.is_empty()).then_some(text),
            tool_invocations: (!invocations.is_empty()).then_some(invocations),
            reasoning: (!reasoning.is_empty()).then(|| reasoning.join("")),
            metadata: message.content.metadata.clone(),
            ..ContentV2::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::upconvert;
    use chrono::Utc;
    use message_core::Role;
    use serde_json::json;

    fn v2(content: serde_json::Value) -> MessageV2 {
        serde_json::from_value(json!({
            "id": "m1",
            "role": "assistant",
            "createdAt": "2024-05-01T10:00:00Z",
            "threadId": "t1",
            "content": content
        }))
        .unwrap()
    }

    fn lift(message: MessageV2) -> Message {
        let mut ctx = ConvertContext::new(None);
        upconvert(Versioned::Gen2(message), &mut ctx).unwrap()
    }

    #[test]
    fn test_parts_map_to_current() {
        let message = lift(v2(json!({
            "format": 2,
            "parts": [
                {"type": "step-start"},
                {"type": "reasoning", "reasoning": "", "details": [{"type": "text", "text": "hmm"}]},
                {"type": "text", "text": "answer"},
                {"type": "file", "mimeType": "image/png", "data": "AA=="},
                {"type": "tool-invocation", "toolInvocation": {
                    "state": "partial-call", "toolCallId": "c1", "toolName": "s", "args": null
                }},
                {"type": "source", "source": {"sourceType": "url", "id": "s1", "url": "https://x"}}
            ]
        })));

        let parts = message.parts();
        assert_eq!(parts[0], ContentPart::StepBoundary);
        assert_eq!(parts[1], ContentPart::reasoning("hmm"));
        assert_eq!(parts[2], ContentPart::text("answer"));
        assert_eq!(parts[3], ContentPart::file("data:image/png;base64,AA==", "image/png"));
        assert_eq!(parts[4].tool_state(), Some(ToolState::InputStreaming));
        assert!(matches!(&parts[4], ContentPart::ToolInvocation { input: None, .. }));
        assert!(matches!(&parts[5], ContentPart::SourceUrl { .. }));
    }

    #[test]
    fn test_empty_reasoning_and_unknown_parts_are_dropped() {
        let message = lift(v2(json!({
            "format": 2,
            "parts": [
                {"type": "reasoning", "reasoning": "", "details": [{"type": "redacted", "data": "xx"}]},
                {"type": "data-widget", "data": {}},
                {"type": "text", "text": "kept"}
            ]
        })));
        assert_eq!(message.parts(), &[ContentPart::text("kept")]);
    }

    #[test]
    fn test_flat_fields_are_folded_in() {
        let message = lift(v2(json!({
            "format": 2,
            "parts": [],
            "content": "legacy text",
            "toolInvocations": [
                {"state": "result", "toolCallId": "c9", "toolName": "calc", "args": {"a": 1}, "result": 2}
            ],
            "experimental_attachments": [{"url": "https://x/y.pdf", "contentType": "application/pdf", "name": "y.pdf"}]
        })));

        let parts = message.parts();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], ContentPart::text("legacy text"));
        assert_eq!(
            parts[1],
            ContentPart::tool_result("c9", "calc", Some(json!({"a": 1})), json!(2))
        );
        assert!(matches!(&parts[2], ContentPart::File { filename: Some(name), .. } if name == "y.pdf"));
    }

    #[test]
    fn test_round_trip_preserves_text_and_tools() {
        let mut original = Message::assistant(
            "m1",
            vec![
                ContentPart::text("let me check"),
                ContentPart::tool_result("c1", "search", Some(json!({"q": "rust"})), json!(["hit"])),
                ContentPart::tool_call("c2", "fetch", json!({"url": "https://x"})),
                ContentPart::StepBoundary,
                ContentPart::reasoning("why"),
                ContentPart::text("done"),
            ],
        )
        .with_created_at(Utc::now())
        .with_thread("t1");
        original.content.metadata = Some(json!({"model": "m"}).as_object().cloned().unwrap());

        let prior = to_prior_gen(&original);
        assert_eq!(prior.role, Role::Assistant);
        assert_eq!(prior.content.content.as_deref(), Some("let me checkdone"));
        assert_eq!(prior.content.tool_invocations.as_ref().map(Vec::len), Some(2));

        let back = lift(prior);
        assert_eq!(back, original);
    }

    #[test]
    fn test_file_filename_is_lost_in_prior_gen() {
        let original = Message::assistant(
            "m1",
            vec![ContentPart::File {
                url: "data:text/plain;base64,aGk=".to_string(),
                media_type: "text/plain".to_string(),
                filename: Some("hi.txt".to_string()),
            }],
        );
        let prior = to_prior_gen(&original);
        assert_eq!(
            prior.content.parts,
            vec![V2Part::File {
                mime_type: "text/plain".to_string(),
                data: "aGk=".to_string()
            }]
        );
        let back = lift(prior);
        assert_eq!(back.parts(), &[ContentPart::file("data:text/plain;base64,aGk=", "text/plain")]);
    }
}
