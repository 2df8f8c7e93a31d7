//! Ordered arena of stored messages.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use message_core::{Message, Provenance, Role};

/// A canonical message plus the bookkeeping the list keeps for it.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredMessage {
    pub message: Message,
    pub provenance: Provenance,
    /// Changed since the last drain.
    pub(crate) unsaved: bool,
}

impl StoredMessage {
    pub fn new(message: Message, provenance: Provenance) -> Self {
        Self {
            unsaved: provenance.needs_saving(),
            message,
            provenance,
        }
    }

    /// Take on the tag of a message merged into this one.
    ///
    /// Replayed or injected content that the live pipeline re-delivers is
    /// promoted to the live tag so it gets saved.
    pub(crate) fn absorb(&mut self, provenance: Provenance) {
        if !provenance.needs_saving() {
            return;
        }
        if matches!(self.provenance, Provenance::Memory | Provenance::Context) {
            self.provenance = provenance;
        }
        self.unsaved = true;
    }
}

/// Messages kept in ascending `createdAt` order, with O(1) lookup by id.
#[derive(Clone, Debug, Default)]
pub struct MessageStore {
    entries: Vec<StoredMessage>,
    index: HashMap<String, usize>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StoredMessage] {
        &self.entries
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&StoredMessage> {
        self.position(id).map(|index| &self.entries[index])
    }

    pub fn last(&self) -> Option<&StoredMessage> {
        self.entries.last()
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut StoredMessage> {
        self.entries.last_mut()
    }

    /// Most recent assistant message; tool results are matched against it.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.entries
            .iter()
            .rev()
            .map(|entry| &entry.message)
            .find(|message| message.role == Role::Assistant)
    }

    pub fn latest_created_at(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().map(|entry| entry.message.created_at).max()
    }

    /// Insert a new message and restore ordering.
    pub(crate) fn insert(&mut self, entry: StoredMessage) {
        self.entries.push(entry);
        self.reorder();
    }

    /// Overwrite the message at `index` and restore ordering.
    pub(crate) fn replace(&mut self, index: usize, entry: StoredMessage) {
        self.entries[index] = entry;
        self.reorder();
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut StoredMessage> {
        self.entries.iter_mut()
    }

    fn reorder(&mut self) {
        // Stable: messages sharing a timestamp keep arrival order.
        self.entries.sort_by_key(|entry| entry.message.created_at);
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.message.id.clone(), position))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(id: &str, ms: i64) -> Message {
        Message::user(id, id).with_created_at(Utc.timestamp_millis_opt(ms).single().unwrap())
    }

    #[test]
    fn test_insert_keeps_created_at_order() {
        let mut store = MessageStore::new();
        store.insert(StoredMessage::new(message("b", 20), Provenance::User));
        store.insert(StoredMessage::new(message("a", 10), Provenance::Memory));
        store.insert(StoredMessage::new(message("c", 20), Provenance::User));

        let ids: Vec<_> = store.entries().iter().map(|e| e.message.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(store.position("c"), Some(2));
    }

    #[test]
    fn test_replace_reindexes() {
        let mut store = MessageStore::new();
        store.insert(StoredMessage::new(message("a", 10), Provenance::User));
        store.insert(StoredMessage::new(message("b", 20), Provenance::User));

        store.replace(0, StoredMessage::new(message("a", 30), Provenance::User));
        assert_eq!(store.position("a"), Some(1));
        assert_eq!(store.position("b"), Some(0));
    }

    #[test]
    fn test_absorb_promotes_memory() {
        let mut entry = StoredMessage::new(message("a", 10), Provenance::Memory);
        assert!(!entry.unsaved);
        entry.absorb(Provenance::Context);
        assert_eq!(entry.provenance, Provenance::Memory);
        entry.absorb(Provenance::Response);
        assert_eq!(entry.provenance, Provenance::Response);
        assert!(entry.unsaved);
    }
}
