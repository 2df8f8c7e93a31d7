//! Read-only projections of the store.
//!
//! Views borrow the store and convert on every call; nothing is cached.

use message_core::{Message, MessageV1, MessageV2, Provenance, ProtocolMessage, UiMessage};

use crate::convert::{to_model_input, to_oldest_gen, to_prior_gen, to_ui_message};
use crate::store::MessageStore;

/// The four standard projections of a list.
#[derive(Clone, Copy, Debug)]
pub struct MessageViews<'a> {
    /// Every stored message.
    pub all: View<'a>,
    /// Replayed history.
    pub remembered: View<'a>,
    /// Live user input.
    pub input: View<'a>,
    /// Model output.
    pub response: View<'a>,
}

impl<'a> MessageViews<'a> {
    pub(crate) fn new(store: &'a MessageStore) -> Self {
        Self {
            all: View::new(store, None),
            remembered: View::new(store, Some(Provenance::Memory)),
            input: View::new(store, Some(Provenance::User)),
            response: View::new(store, Some(Provenance::Response)),
        }
    }
}

/// Messages of one provenance (or all of them), in store order.
#[derive(Clone, Copy, Debug)]
pub struct View<'a> {
    store: &'a MessageStore,
    filter: Option<Provenance>,
}

impl<'a> View<'a> {
    fn new(store: &'a MessageStore, filter: Option<Provenance>) -> Self {
        Self { store, filter }
    }

    fn messages(&self) -> impl Iterator<Item = &'a Message> + 'a {
        let filter = self.filter;
        self.store
            .entries()
            .iter()
            .filter(move |entry| filter.map_or(true, |provenance| entry.provenance == provenance))
            .map(|entry| &entry.message)
    }

    pub fn len(&self) -> usize {
        self.messages().count()
    }

    pub fn is_empty(&self) -> bool {
        self.messages().next().is_none()
    }

    /// Current generation, cloned out of the store.
    pub fn current_gen(&self) -> Vec<Message> {
        self.messages().cloned().collect()
    }

    /// Prior generation, the shape handed to storage.
    pub fn prior_gen(&self) -> Vec<MessageV2> {
        self.messages().map(to_prior_gen).collect()
    }

    /// Oldest generation; tool results are split into separate `tool` messages.
    pub fn oldest_gen(&self) -> Vec<MessageV1> {
        self.messages().flat_map(to_oldest_gen).collect()
    }

    /// Sanitized model input.
    pub fn external_model_input(&self) -> Vec<ProtocolMessage> {
        to_model_input(self.messages())
    }

    pub fn external_ui(&self) -> Vec<UiMessage> {
        self.messages().map(to_ui_message).collect()
    }
}
