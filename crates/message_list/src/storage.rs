//! Persistence boundary.
//!
//! The list never persists anything itself. Callers drain unsaved messages
//! and hand them to a [`MessageStorage`] in the prior generation's shape;
//! replay loads them back and adds them with the `memory` tag.

use std::collections::HashMap;
use std::convert::Infallible;

use message_core::{MessageV2, Provenance};

use crate::convert::to_prior_gen;
use crate::error::ReplayError;
use crate::list::MessageList;

/// Message storage trait
pub trait MessageStorage {
    type Error: std::error::Error + 'static;

    /// Save messages, replacing any stored message with the same id
    fn save_messages(&mut self, messages: &[MessageV2]) -> Result<(), Self::Error>;

    /// Load every message of a thread, in save order
    fn load_messages(&self, thread_id: &str) -> Result<Vec<MessageV2>, Self::Error>;
}

/// In-memory storage, keyed by thread id
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorage {
    threads: HashMap<String, Vec<MessageV2>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.threads.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageStorage for InMemoryStorage {
    type Error = Infallible;

    fn save_messages(&mut self, messages: &[MessageV2]) -> Result<(), Self::Error> {
        for message in messages {
            let thread = self
                .threads
                .entry(message.thread_id.clone().unwrap_or_default())
                .or_default();
            match thread.iter_mut().find(|stored| stored.id == message.id) {
                Some(stored) => *stored = message.clone(),
                None => thread.push(message.clone()),
            }
        }
        Ok(())
    }

    fn load_messages(&self, thread_id: &str) -> Result<Vec<MessageV2>, Self::Error> {
        Ok(self.threads.get(thread_id).cloned().unwrap_or_default())
    }
}

/// Drain the list's unsaved messages into `storage`. Returns how many were saved.
pub fn save_unsaved<S: MessageStorage>(
    list: &mut MessageList,
    storage: &mut S,
) -> Result<usize, S::Error> {
    let messages: Vec<MessageV2> = list.drain_unsaved_messages().iter().map(to_prior_gen).collect();
    if messages.is_empty() {
        return Ok(0);
    }
    storage.save_messages(&messages)?;
    Ok(messages.len())
}

/// Replay a stored thread into `list` as memory.
pub fn replay<S: MessageStorage>(
    list: &mut MessageList,
    storage: &S,
    thread_id: &str,
) -> Result<usize, ReplayError<S::Error>> {
    let messages = storage.load_messages(thread_id).map_err(ReplayError::Load)?;
    let count = messages.len();
    list.add(messages, Provenance::Memory)?;
    Ok(count)
}
