//! Inputs accepted by `MessageList::add` and `MessageList::add_system`.

use message_core::{Message, MessageV1, MessageV2, ProtocolMessage, UiMessage, WireRole};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::classify::{classify, MessageShape};
use crate::error::{MessageListError, Result};

/// A message of any accepted generation, already parsed.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyMessage {
    Gen1(MessageV1),
    Gen2(MessageV2),
    Current(Message),
    Protocol(ProtocolMessage),
    Ui(UiMessage),
}

impl AnyMessage {
    /// Classify an opaque value and parse it into the matching generation.
    pub fn from_value(value: Value) -> Result<Self> {
        let shape = classify(&value)?;

        if let Some(role) = value.get("role").and_then(Value::as_str) {
            if WireRole::parse(role).is_none() {
                return Err(MessageListError::UnrecognizedRole(role.to_string()));
            }
        }

        Ok(match shape {
            MessageShape::Gen1 => AnyMessage::Gen1(parse(shape, value)?),
            MessageShape::Gen2 => AnyMessage::Gen2(parse(shape, value)?),
            MessageShape::Current => AnyMessage::Current(parse(shape, value)?),
            MessageShape::ExternalProtocol => AnyMessage::Protocol(parse(shape, value)?),
            MessageShape::ExternalUi => AnyMessage::Ui(parse(shape, value)?),
        })
    }

    pub fn shape(&self) -> MessageShape {
        match self {
            AnyMessage::Gen1(_) => MessageShape::Gen1,
            AnyMessage::Gen2(_) => MessageShape::Gen2,
            AnyMessage::Current(_) => MessageShape::Current,
            AnyMessage::Protocol(_) => MessageShape::ExternalProtocol,
            AnyMessage::Ui(_) => MessageShape::ExternalUi,
        }
    }
}

fn parse<T: DeserializeOwned>(shape: MessageShape, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| MessageListError::Malformed {
        shape: shape.as_str(),
        source,
    })
}

/// What `add` accepts: a bare string (user text), raw values, or parsed messages.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageInput {
    Text(String),
    Values(Vec<Value>),
    Messages(Vec<AnyMessage>),
}

impl MessageInput {
    /// Parse every element before anything is stored, so malformed input
    /// leaves the list untouched.
    pub(crate) fn into_messages(self) -> Result<Vec<AnyMessage>> {
        match self {
            MessageInput::Text(text) => Ok(vec![AnyMessage::Protocol(ProtocolMessage::text(
                WireRole::User,
                text,
            ))]),
            MessageInput::Values(values) => values.into_iter().map(AnyMessage::from_value).collect(),
            MessageInput::Messages(messages) => Ok(messages),
        }
    }
}

impl From<&str> for MessageInput {
    fn from(text: &str) -> Self {
        MessageInput::Text(text.to_string())
    }
}

impl From<String> for MessageInput {
    fn from(text: String) -> Self {
        MessageInput::Text(text)
    }
}

impl From<Value> for MessageInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(values) => MessageInput::Values(values),
            Value::String(text) => MessageInput::Text(text),
            other => MessageInput::Values(vec![other]),
        }
    }
}

impl From<Vec<Value>> for MessageInput {
    fn from(values: Vec<Value>) -> Self {
        MessageInput::Values(values)
    }
}

impl From<AnyMessage> for MessageInput {
    fn from(message: AnyMessage) -> Self {
        MessageInput::Messages(vec![message])
    }
}

impl From<Vec<AnyMessage>> for MessageInput {
    fn from(messages: Vec<AnyMessage>) -> Self {
        MessageInput::Messages(messages)
    }
}

macro_rules! impl_from_message {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for MessageInput {
            fn from(message: $ty) -> Self {
                MessageInput::Messages(vec![AnyMessage::$variant(message)])
            }
        }

        impl From<Vec<$ty>> for MessageInput {
            fn from(messages: Vec<$ty>) -> Self {
                MessageInput::Messages(messages.into_iter().map(AnyMessage::$variant).collect())
            }
        }
    };
}

impl_from_message!(MessageV1, Gen1);
impl_from_message!(MessageV2, Gen2);
impl_from_message!(Message, Current);
impl_from_message!(ProtocolMessage, Protocol);
impl_from_message!(UiMessage, Ui);

/// What `add_system` accepts.
#[derive(Clone, Debug, PartialEq)]
pub enum SystemInput {
    Text(String),
    Values(Vec<Value>),
    Messages(Vec<ProtocolMessage>),
}

impl From<&str> for SystemInput {
    fn from(text: &str) -> Self {
        SystemInput::Text(text.to_string())
    }
}

impl From<String> for SystemInput {
    fn from(text: String) -> Self {
        SystemInput::Text(text)
    }
}

impl From<Value> for SystemInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(values) => SystemInput::Values(values),
            Value::String(text) => SystemInput::Text(text),
            other => SystemInput::Values(vec![other]),
        }
    }
}

impl From<ProtocolMessage> for SystemInput {
    fn from(message: ProtocolMessage) -> Self {
        SystemInput::Messages(vec![message])
    }
}

impl From<Vec<ProtocolMessage>> for SystemInput {
    fn from(messages: Vec<ProtocolMessage>) -> Self {
        SystemInput::Messages(messages)
    }
}
