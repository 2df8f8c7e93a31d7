use message_core::{Message, MessageListConfig, Provenance, ProtocolMessage};
use tracing::debug;

use crate::convert::{to_canonical, ConvertContext};
use crate::error::{MessageListError, Result};
use crate::input::{AnyMessage, MessageInput, SystemInput};
use crate::merge::{merge, MergeOutcome};
use crate::store::MessageStore;
use crate::system::{SystemMessage, SystemMessages};
use crate::timestamp::TimestampSequencer;
use crate::view::MessageViews;

/// One conversation: the canonical, time-ordered store every message enters
/// through, plus its system messages.
///
/// Mutation takes `&mut self`, so ingestion from several producers (user
/// input, streamed responses, memory replay) must be funneled through one
/// owner.
#[derive(Clone, Debug, Default)]
pub struct MessageList {
    config: MessageListConfig,
    store: MessageStore,
    sequencer: TimestampSequencer,
    systems: SystemMessages,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MessageListConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self::with_config(MessageListConfig::for_thread(thread_id))
    }

    pub fn config(&self) -> &MessageListConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Add one or more messages of any accepted generation.
    ///
    /// Every input is parsed before anything is stored, so a malformed
    /// element leaves the list untouched. Messages are then converted and
    /// merged in order; a later message's tool result can complete an
    /// earlier message's call.
    pub fn add(&mut self, input: impl Into<MessageInput>, provenance: Provenance) -> Result<&mut Self> {
        let messages = input.into().into_messages()?;
        for message in messages {
            self.add_message(message, provenance)?;
        }
        Ok(self)
    }

    /// Add a single parsed message and report what the merge did with it.
    pub fn add_message(&mut self, message: AnyMessage, provenance: Provenance) -> Result<MergeOutcome> {
        let shape = message.shape();
        let mut ctx = ConvertContext::new(self.store.last_assistant())
            .warn_on_drop(self.config.warn_on_dropped_parts);
        let mut converted = to_canonical(message, &mut ctx)?;

        self.bind_context(&mut converted.message, provenance)?;

        let message_id = converted.message.id.clone();
        let outcome = merge(&mut self.store, &mut self.sequencer, converted, provenance);
        debug!(
            message_id = %message_id,
            shape = %shape,
            provenance = %provenance,
            outcome = ?outcome,
            "message merged"
        );
        Ok(outcome)
    }

    /// Fill in the list's thread and resource, rejecting live messages that
    /// belong to another conversation. Memory may span threads.
    fn bind_context(&self, message: &mut Message, provenance: Provenance) -> Result<()> {
        let check = provenance != Provenance::Memory;
        bind_field(
            &message.id,
            "threadId",
            &mut message.thread_id,
            self.config.thread_id.as_deref(),
            check,
        )?;
        bind_field(
            &message.id,
            "resourceId",
            &mut message.resource_id,
            self.config.resource_id.as_deref(),
            check,
        )
    }

    pub fn add_system(
        &mut self,
        input: impl Into<SystemInput>,
        namespace: Option<&str>,
    ) -> Result<&mut Self> {
        self.systems.add(input.into(), namespace)?;
        Ok(self)
    }

    pub fn get(&self) -> MessageViews<'_> {
        MessageViews::new(&self.store)
    }

    /// Messages tagged `user` or `response` that changed since the last
    /// drain, in store order. Clears their unsaved flag.
    pub fn drain_unsaved_messages(&mut self) -> Vec<Message> {
        self.store
            .entries_mut()
            .filter(|entry| entry.unsaved && entry.provenance.needs_saving())
            .map(|entry| {
                entry.unsaved = false;
                entry.message.clone()
            })
            .collect()
    }

    pub fn get_system_messages(&self, namespace: Option<&str>) -> &[SystemMessage] {
        self.systems.get(namespace)
    }

    /// Model prompt: global system messages, then those of `namespace`, then
    /// the sanitized conversation.
    pub fn prompt(&self, namespace: Option<&str>) -> Vec<ProtocolMessage> {
        self.systems
            .for_prompt(namespace)
            .map(SystemMessage::to_protocol)
            .chain(self.get().all.external_model_input())
            .collect()
    }
}

fn bind_field(
    message_id: &str,
    field: &'static str,
    value: &mut Option<String>,
    bound: Option<&str>,
    check: bool,
) -> Result<()> {
    let Some(bound) = bound else {
        return Ok(());
    };
    if value.is_none() {
        *value = Some(bound.to_string());
        return Ok(());
    }
    if let Some(found) = value.as_deref().filter(|found| check && *found != bound) {
        return Err(MessageListError::ContextMismatch {
            message_id: message_id.to_string(),
            field,
            expected: bound.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_thread_is_filled_in() {
        let mut list = MessageList::for_thread("t1");
        list.add("hello", Provenance::User).unwrap();
        let messages = list.get().all.current_gen();
        assert_eq!(messages[0].thread_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_foreign_thread_is_rejected_unless_memory() {
        let mut list = MessageList::for_thread("t1");
        let foreign = json!({
            "id": "m1",
            "role": "user",
            "createdAt": "2024-05-01T10:00:00Z",
            "threadId": "t2",
            "content": "hi"
        });

        let err = list.add(foreign.clone(), Provenance::User).unwrap_err();
        assert!(matches!(
            err,
            MessageListError::ContextMismatch { field: "threadId", ref found, .. } if found == "t2"
        ));
        assert!(list.is_empty());

        list.add(foreign, Provenance::Memory).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_resource_mismatch() {
        let mut list = MessageList::with_config(MessageListConfig::for_thread("t1").with_resource("r1"));
        let err = list
            .add(
                json!({
                    "id": "m1",
                    "role": "user",
                    "createdAt": "2024-05-01T10:00:00Z",
                    "resourceId": "r2",
                    "content": "hi"
                }),
                Provenance::Response,
            )
            .unwrap_err();
        assert!(matches!(err, MessageListError::ContextMismatch { field: "resourceId", .. }));
    }
}
