//! External message shapes: the model-input protocol and the UI protocol.

mod protocol;
mod ui;

pub use protocol::{ProtocolContent, ProtocolMessage, ProtocolPart};
pub use ui::{UiMessage, UiPart, UiToolState};
