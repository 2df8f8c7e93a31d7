//! `message_list` reconciles conversation messages of every accepted
//! generation into one canonical, time-ordered store.
//!
//! Each message added to a [`MessageList`] is classified, upconverted to the
//! current generation, given a monotonic `createdAt` and merged: appended to
//! the last assistant message, replacing a stored message with the same id,
//! skipped as a duplicate, or inserted. Views project the store back into
//! older generations and the external protocol and UI shapes.

pub mod classify;
pub mod convert;
pub mod error;
pub mod fingerprint;
pub mod input;
pub mod list;
pub mod merge;
pub mod storage;
pub mod store;
pub mod system;
pub mod timestamp;
pub mod view;

// Re-export the public API
pub use classify::{classify, MessageShape};
pub use error::{MessageListError, ReplayError, Result};
pub use fingerprint::{fingerprint_message, fingerprint_parts};
pub use input::{AnyMessage, MessageInput, SystemInput};
pub use list::MessageList;
pub use merge::MergeOutcome;
pub use storage::{replay, save_unsaved, InMemoryStorage, MessageStorage};
pub use store::StoredMessage;
pub use system::SystemMessage;
pub use timestamp::TimestampSequencer;
pub use view::{MessageViews, View};

pub use message_core::{Message, MessageListConfig, Provenance};
