use message_core::WireRole;
use thiserror::Error;

/// Errors returned while adding messages to a `MessageList`.
///
/// All of them are caller defects: nothing here is transient or retried.
#[derive(Error, Debug)]
pub enum MessageListError {
    #[error("unhandled message shape: {0}")]
    UnhandledShape(String),

    #[error("invalid {shape} message: {source}")]
    Malformed {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized message role: {0}")]
    UnrecognizedRole(String),

    #[error("system messages must be added with add_system, not add")]
    SystemRoleRejected,

    #[error("expected a system message, found role {0}")]
    ExpectedSystemRole(String),

    #[error("message {message_id} declares {field} {found}, but this list is bound to {field} {expected}")]
    ContextMismatch {
        message_id: String,
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("{part_type} content is not allowed in a {role} message")]
    IncompatibleContent { part_type: String, role: WireRole },
}

pub type Result<T> = std::result::Result<T, MessageListError>;

/// Errors returned while replaying a stored thread.
#[derive(Error, Debug)]
pub enum ReplayError<E: std::error::Error + 'static> {
    #[error("failed to load messages: {0}")]
    Load(#[source] E),

    #[error(transparent)]
    Add(#[from] MessageListError),
}
