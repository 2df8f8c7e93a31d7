//! Message module - the current canonical message generation
//!
//! Every accepted input shape is converted to these types before it is stored.

mod canonical;
mod content;
mod role;

pub use canonical::Message;
pub use content::{ContentPart, MessageContent, ToolState, CURRENT_FORMAT};
pub use role::{Role, WireRole};
