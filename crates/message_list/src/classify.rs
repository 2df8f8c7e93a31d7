//! Structural classification of incoming message values.
//!
//! Shapes overlap (every canonical generation has a `content` field), so the
//! rules run in a fixed order:
//!
//! 1. object `content` with `format: 3` → current generation
//! 2. object `content` with `format: 2` → gen 2
//! 3. no `parts` array, no object `content`, has `threadId` or `resourceId` → gen 1
//! 4. has a `parts` array → external UI message
//! 5. has a string or array `content` → external protocol message

use std::fmt::{self, Display};

use message_core::legacy::V2_FORMAT;
use message_core::CURRENT_FORMAT;
use serde_json::Value;

use crate::error::{MessageListError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageShape {
    Gen1,
    Gen2,
    Current,
    ExternalProtocol,
    ExternalUi,
}

impl MessageShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageShape::Gen1 => "gen 1",
            MessageShape::Gen2 => "gen 2",
            MessageShape::Current => "current generation",
            MessageShape::ExternalProtocol => "external protocol",
            MessageShape::ExternalUi => "external UI",
        }
    }
}

impl Display for MessageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(value: &Value) -> Result<MessageShape> {
    let Some(object) = value.as_object() else {
        return Err(MessageListError::UnhandledShape(format!(
            "expected an object, got {}",
            json_type(value)
        )));
    };

    let content = object.get("content");
    let format = content
        .and_then(Value::as_object)
        .and_then(|content| content.get("format"))
        .and_then(Value::as_u64);

    if format == Some(u64::from(CURRENT_FORMAT)) {
        return Ok(MessageShape::Current);
    }
    if format == Some(u64::from(V2_FORMAT)) {
        return Ok(MessageShape::Gen2);
    }

    let has_parts = object.get("parts").is_some_and(Value::is_array);
    let has_object_content = content.is_some_and(Value::is_object);
    let has_context = object.contains_key("threadId") || object.contains_key("resourceId");

    if !has_parts && !has_object_content && has_context {
        return Ok(MessageShape::Gen1);
    }
    if has_parts {
        return Ok(MessageShape::ExternalUi);
    }
    if content.is_some_and(|c| c.is_string() || c.is_array()) {
        return Ok(MessageShape::ExternalProtocol);
    }

    let keys = object.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
    Err(MessageListError::UnhandledShape(format!(
        "object with keys [{keys}]"
    )))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
