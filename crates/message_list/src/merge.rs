//! Integration of converted messages into the store.
//!
//! Decisions run in a fixed order:
//!
//! 1. same `id` already stored: equal fingerprint is a no-op, otherwise the
//!    stored message is replaced
//! 2. a memory message matching a stored fingerprint is skipped
//! 3. a lone tool result attaches to the preceding assistant call, or is dropped
//! 4. an assistant continuation is appended to the last assistant message
//! 5. anything else is inserted
//!
//! The store is re-sorted by `createdAt` after every insert or replace.

use message_core::{ContentPart, Message, Provenance, Role, ToolState};
use serde_json::Map;
use tracing::debug;

use crate::convert::{push_part, Converted};
use crate::fingerprint::fingerprint_message;
use crate::store::{MessageStore, StoredMessage};
use crate::timestamp::TimestampSequencer;

/// What `merge` did with a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Same id and content as a stored message.
    Unchanged,
    /// Memory replay of content already in the store.
    DuplicateSkipped,
    /// Tool result with no matching call.
    OrphanDropped,
    /// Conversion left nothing to store.
    Emptied,
    Appended,
    Replaced,
    Inserted,
}

pub(crate) fn merge(
    store: &mut MessageStore,
    sequencer: &mut TimestampSequencer,
    converted: Converted,
    provenance: Provenance,
) -> MergeOutcome {
    let Converted {
        mut message,
        supplied_created_at,
        sole_tool_result,
        emptied,
    } = converted;

    if emptied {
        debug!(message_id = %message.id, "no content left after conversion, skipping");
        return MergeOutcome::Emptied;
    }

    let fingerprint = fingerprint_message(&message);

    if let Some(index) = store.position(&message.id) {
        let stored = &store.entries()[index];
        if fingerprint_message(&stored.message) == fingerprint {
            return MergeOutcome::Unchanged;
        }
        debug!(message_id = %message.id, "content changed, replacing stored message");
        message.created_at = stored.message.created_at;
        let mut entry = StoredMessage {
            message,
            provenance: stored.provenance,
            unsaved: stored.unsaved,
        };
        entry.absorb(provenance);
        store.replace(index, entry);
        return MergeOutcome::Replaced;
    }

    if provenance == Provenance::Memory && is_remembered(store, &message, &fingerprint) {
        debug!(message_id = %message.id, "memory message already stored");
        return MergeOutcome::DuplicateSkipped;
    }

    if let Some(tool_call_id) = sole_tool_result {
        let Some(last) = store
            .last_mut()
            .filter(|last| holds_call(&last.message, &tool_call_id))
        else {
            debug!(tool_call_id = %tool_call_id, "tool result does not follow its call, dropping");
            return MergeOutcome::OrphanDropped;
        };
        append(last, message, provenance);
        sequencer.observe(last.message.created_at);
        return MergeOutcome::Appended;
    }

    if provenance != Provenance::Memory {
        if let Some(last) = store
            .last_mut()
            .filter(|last| can_append(&last.message, &message))
        {
            debug!(message_id = %message.id, into = %last.message.id, "appending to last assistant message");
            append(last, message, provenance);
            sequencer.observe(last.message.created_at);
            return MergeOutcome::Appended;
        }
    }

    message.created_at = sequencer.assign(supplied_created_at, provenance, store.latest_created_at());
    store.insert(StoredMessage::new(message, provenance));
    MergeOutcome::Inserted
}

/// Memory dedup compares only messages of the same role on the same thread.
fn is_remembered(store: &MessageStore, message: &Message, fingerprint: &str) -> bool {
    store.entries().iter().any(|entry| {
        entry.message.role == message.role
            && entry.message.thread_id == message.thread_id
            && fingerprint_message(&entry.message) == fingerprint
    })
}

fn holds_call(message: &Message, tool_call_id: &str) -> bool {
    message.role == Role::Assistant && message.content.tool_invocation(tool_call_id).is_some()
}

/// Append gate: both assistant, same thread, and the incoming message's first
/// substantive part can follow the stored message's last one.
pub(crate) fn can_append(last: &Message, incoming: &Message) -> bool {
    if last.role != Role::Assistant || incoming.role != Role::Assistant {
        return false;
    }
    if last.thread_id != incoming.thread_id {
        return false;
    }

    match (
        incoming.content.first_substantive(),
        last.content.last_substantive(),
    ) {
        (Some(next), Some(prev)) => {
            next.type_tag() == prev.type_tag()
                || (matches!(next, ContentPart::ToolInvocation { .. })
                    && !matches!(prev, ContentPart::Text { .. }))
        }
        _ => true,
    }
}

fn append(target: &mut StoredMessage, incoming: Message, provenance: Provenance) {
    let Message {
        created_at,
        content,
        ..
    } = incoming;
    let stored = &mut target.message;

    for (position, part) in content.parts.into_iter().enumerate() {
        if let ContentPart::ToolInvocation {
            tool_call_id,
            state: ToolState::OutputAvailable,
            input,
            output,
            ..
        } = &part
        {
            if let Some(ContentPart::ToolInvocation {
                state: stored_state,
                input: stored_input,
                output: stored_output,
                ..
            }) = stored
                .content
                .parts
                .iter_mut()
                .rev()
                .find(|existing| existing.tool_call_id() == Some(tool_call_id.as_str()))
            {
                *stored_state = ToolState::OutputAvailable;
                *stored_output = output.clone();
                if stored_input.is_none() {
                    *stored_input = input.clone();
                }
                continue;
            }
        }

        if stored.content.parts.get(position) == Some(&part) {
            continue;
        }
        push_part(&mut stored.content.parts, part);
    }

    if let Some(metadata) = content.metadata {
        stored
            .content
            .metadata
            .get_or_insert_with(Map::new)
            .extend(metadata);
    }
    stored.created_at = stored.created_at.max(created_at);
    target.absorb(provenance);
}
