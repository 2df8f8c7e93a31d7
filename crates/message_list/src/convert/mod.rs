//! Conversions between message generations.
//!
//! Upconversion lifts every accepted shape to the current canonical
//! [`Message`]. The canonical generations form a chain (`gen 1 → gen 2 →
//! current`) driven by a lookup table keyed by generation pairs, so gen 1
//! always passes through the gen 2 adapter. External protocol and UI messages
//! have their own single-step adapters.
//!
//! Downconversion (current → gen 2 → gen 1, current → protocol, current → UI)
//! backs the read-only views.

mod data;
mod gen1;
mod gen2;
mod protocol;
mod ui;

use chrono::{DateTime, Utc};
use message_core::{ContentPart, Message, MessageV1, MessageV2, ToolState, WireRole};
use tracing::{debug, warn};

use crate::error::{MessageListError, Result};
use crate::input::AnyMessage;

pub use gen1::to_oldest_gen;
pub use gen2::to_prior_gen;
pub use protocol::to_model_input;
pub use ui::to_ui_message;

/// Canonical generations, oldest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generation {
    Gen1,
    Gen2,
    Current,
}

/// A message at some point along the canonical chain.
#[derive(Clone, Debug, PartialEq)]
pub enum Versioned {
    Gen1(MessageV1),
    Gen2(MessageV2),
    Current(Message),
}

impl Versioned {
    pub fn generation(&self) -> Generation {
        match self {
            Versioned::Gen1(_) => Generation::Gen1,
            Versioned::Gen2(_) => Generation::Gen2,
            Versioned::Current(_) => Generation::Current,
        }
    }
}

type Upconverter = fn(Versioned, &mut ConvertContext<'_>) -> Result<Versioned>;

/// One `(from, to)` step per older generation, indexed by `from`.
const UPCONVERTERS: [(Generation, Generation, Upconverter); Generation::Current as usize] = [
    (Generation::Gen1, Generation::Gen2, gen1::upconvert),
    (Generation::Gen2, Generation::Current, gen2::upconvert),
];

/// Walk the upconverter table until the message reaches the current generation.
pub fn upconvert(message: Versioned, ctx: &mut ConvertContext<'_>) -> Result<Message> {
    let mut message = message;
    loop {
        let from = match message {
            Versioned::Current(message) => return Ok(message),
            ref other => other.generation(),
        };
        let (_, _, step) = UPCONVERTERS[from as usize];
        message = step(message, ctx)?;
    }
}

/// State shared by the adapters while converting one incoming message.
#[derive(Debug)]
pub struct ConvertContext<'a> {
    /// Most recent stored assistant message; tool results are matched against it.
    pub(crate) last_assistant: Option<&'a Message>,
    pub(crate) warn_on_drop: bool,
    /// Set when the source message consisted of exactly one tool result.
    pub(crate) sole_tool_result: Option<String>,
}

impl<'a> ConvertContext<'a> {
    pub fn new(last_assistant: Option<&'a Message>) -> Self {
        Self {
            last_assistant,
            warn_on_drop: false,
            sole_tool_result: None,
        }
    }

    pub fn warn_on_drop(mut self, warn_on_drop: bool) -> Self {
        self.warn_on_drop = warn_on_drop;
        self
    }

    pub(crate) fn dropped(&self, part_type: &str, reason: &str) {
        if self.warn_on_drop {
            warn!(part_type, reason, "dropping content part");
        } else {
            debug!(part_type, reason, "dropping content part");
        }
    }

    /// Stored call for `tool_call_id` in the most recent assistant message.
    pub(crate) fn stored_call(&self, tool_call_id: &str) -> Option<&'a ContentPart> {
        self.last_assistant
            .and_then(|message| message.content.tool_invocation(tool_call_id))
    }
}

/// Result of converting one incoming message.
#[derive(Clone, Debug, PartialEq)]
pub struct Converted {
    pub message: Message,
    /// `createdAt` as supplied by the caller, if the source shape carries one.
    pub supplied_created_at: Option<DateTime<Utc>>,
    /// `toolCallId` when the source was a lone tool result.
    pub sole_tool_result: Option<String>,
    /// The source had parts but none survived conversion.
    pub emptied: bool,
}

/// Convert any accepted message to the current canonical generation.
pub fn to_canonical(message: AnyMessage, ctx: &mut ConvertContext<'_>) -> Result<Converted> {
    let (source_parts, supplied_created_at, message) = match message {
        AnyMessage::Gen1(message) => {
            let source_parts = gen1::part_count(&message);
            let created_at = message.created_at;
            let message = upconvert(Versioned::Gen1(message), ctx)?;
            (source_parts, Some(created_at), message)
        }
        AnyMessage::Gen2(message) => {
            let source_parts = message.content.parts.len();
            let created_at = message.created_at;
            let message = upconvert(Versioned::Gen2(message), ctx)?;
            (source_parts, Some(created_at), message)
        }
        AnyMessage::Current(message) => {
            let created_at = message.created_at;
            (message.content.parts.len(), Some(created_at), message)
        }
        AnyMessage::Protocol(message) => {
            let source_parts = protocol::part_count(&message);
            let message = protocol::to_canonical(message, ctx)?;
            (source_parts, None, message)
        }
        AnyMessage::Ui(message) => {
            let source_parts = message.parts.len();
            let created_at = message.created_at;
            let message = ui::to_canonical(message, ctx)?;
            (source_parts, created_at, message)
        }
    };

    let emptied = source_parts > 0 && message.content.parts.is_empty();
    Ok(Converted {
        message,
        supplied_created_at,
        sole_tool_result: ctx.sole_tool_result.take(),
        emptied,
    })
}

/// Append a part, keeping at most one tool invocation per `toolCallId`.
///
/// A completed invocation is never moved back to an in-flight state; a late
/// call only fills in missing `input`.
pub(crate) fn push_part(parts: &mut Vec<ContentPart>, part: ContentPart) {
    if let Some(tool_call_id) = part.tool_call_id() {
        if let Some(existing) = parts
            .iter_mut()
            .find(|existing| existing.tool_call_id() == Some(tool_call_id))
        {
            let completed = existing.tool_state() == Some(ToolState::OutputAvailable);
            let regresses = part.tool_state().is_some_and(|state| state.is_in_flight());
            if !(completed && regresses) {
                *existing = part;
                return;
            }
            if let (
                ContentPart::ToolInvocation {
                    input: stored_input,
                    ..
                },
                ContentPart::ToolInvocation { input, .. },
            ) = (existing, part)
            {
                if stored_input.is_none() {
                    *stored_input = input;
                }
            }
            return;
        }
    }
    parts.push(part);
}

/// Which part types each wire role may carry.
pub(crate) fn ensure_part_allowed(role: WireRole, part_type: &str) -> Result<()> {
    let allowed = match role {
        WireRole::System => part_type == "text",
        WireRole::User => matches!(part_type, "text" | "image" | "file"),
        WireRole::Assistant => matches!(
            part_type,
            "text" | "file" | "reasoning" | "redacted-reasoning" | "tool-call" | "tool-result"
        ),
        WireRole::Tool => part_type == "tool-result",
    };

    if allowed {
        Ok(())
    } else {
        Err(MessageListError::IncompatibleContent {
            part_type: part_type.to_string(),
            role,
        })
    }
}

/// Map a wire role onto a canonical role; tool output belongs to the assistant.
pub(crate) fn canonical_role(role: WireRole) -> Result<message_core::Role> {
    match role {
        WireRole::System => Err(MessageListError::SystemRoleRejected),
        WireRole::User => Ok(message_core::Role::User),
        WireRole::Assistant | WireRole::Tool => Ok(message_core::Role::Assistant),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message_core::ToolState;
    use serde_json::json;

    #[test]
    fn test_upconverters_form_a_chain() {
        for (index, (from, to, _)) in UPCONVERTERS.iter().enumerate() {
            assert_eq!(*from as usize, index);
            assert_eq!(*to as usize, index + 1);
        }
    }

    #[test]
    fn test_push_part_replaces_same_tool_call() {
        let mut parts = vec![ContentPart::text("a")];
        push_part(&mut parts, ContentPart::tool_call("c1", "search", json!({})));
        push_part(
            &mut parts,
            ContentPart::tool_result("c1", "search", Some(json!({})), json!("ok")),
        );

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].tool_state(), Some(ToolState::OutputAvailable));
    }

    #[test]
    fn test_push_part_keeps_completed_tool_call() {
        let mut parts = vec![ContentPart::tool_result("c1", "search", None, json!("ok"))];
        push_part(&mut parts, ContentPart::tool_call("c1", "search", json!({"q": 1})));

        assert_eq!(
            parts,
            vec![ContentPart::tool_result("c1", "search", Some(json!({"q": 1})), json!("ok"))]
        );
    }

    #[test]
    fn test_part_rules_per_role() {
        assert!(ensure_part_allowed(WireRole::User, "image").is_ok());
        assert!(ensure_part_allowed(WireRole::Assistant, "tool-call").is_ok());

        let err = ensure_part_allowed(WireRole::Tool, "file").unwrap_err();
        assert_eq!(err.to_string(), "file content is not allowed in a tool message");
        assert!(ensure_part_allowed(WireRole::User, "tool-result").is_err());
    }

    #[test]
    fn test_system_role_is_rejected() {
        assert!(matches!(
            canonical_role(WireRole::System),
            Err(MessageListError::SystemRoleRejected)
        ));
        assert_eq!(canonical_role(WireRole::Tool).unwrap(), message_core::Role::Assistant);
    }
}
