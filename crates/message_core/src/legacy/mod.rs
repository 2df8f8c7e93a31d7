//! Older canonical generations.
//!
//! These shapes are accepted as input and produced by the back-compat views;
//! they are never stored.

mod v1;
mod v2;

pub use v1::{MessageV1, MessageV1Type, V1Content, V1Part};
pub use v2::{
    Attachment, ContentV2, MessageV2, ReasoningDetail, SourceV2, ToolInvocationStateV2,
    ToolInvocationV2, V2Part, V2_FORMAT,
};
