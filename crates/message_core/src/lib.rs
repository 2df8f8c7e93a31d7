//! message_core - Message types for every accepted conversation message generation
//!
//! This crate provides the data types shared by the reconciliation engine:
//! - `message` - the current canonical message, its content parts and roles
//! - `legacy` - the two older canonical generations (gen 1 and gen 2)
//! - `external` - external protocol (model input) and external UI messages
//! - `data` - binary payload representations found on file and image parts
//! - `provenance` - the per-message provenance tag
//! - `config` - engine configuration loading

pub mod config;
pub mod data;
pub mod error;
pub mod external;
pub mod legacy;
pub mod message;
pub mod provenance;

// Re-export commonly used types
pub use config::MessageListConfig;
pub use data::DataContent;
pub use error::{ConfigError, DataContentError};
pub use external::{ProtocolContent, ProtocolMessage, ProtocolPart, UiMessage, UiPart, UiToolState};
pub use legacy::{
    Attachment, ContentV2, MessageV1, MessageV1Type, MessageV2, ReasoningDetail, SourceV2,
    ToolInvocationStateV2, ToolInvocationV2, V1Content, V1Part, V2Part,
};
pub use message::{ContentPart, Message, MessageContent, Role, ToolState, WireRole, CURRENT_FORMAT};
pub use provenance::Provenance;
