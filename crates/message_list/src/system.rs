//! System messages, kept apart from the conversation.
//!
//! System messages are never merged, re-sorted or tagged. They live either in
//! the global list or under a namespace label, and each list holds a given
//! content at most once.

use std::collections::BTreeMap;

use message_core::{ProtocolContent, ProtocolMessage, ProtocolPart, WireRole};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{MessageListError, Result};
use crate::fingerprint::fingerprint_text;
use crate::input::SystemInput;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SystemMessage {
    pub content: String,
}

impl SystemMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn to_protocol(&self) -> ProtocolMessage {
        ProtocolMessage::text(WireRole::System, self.content.clone())
    }
}

#[derive(Clone, Debug, Default)]
pub struct SystemMessages {
    global: Vec<SystemMessage>,
    namespaced: BTreeMap<String, Vec<SystemMessage>>,
}

impl SystemMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add system messages to the global list, or to `namespace`.
    ///
    /// Every input is validated before any is stored.
    pub fn add(&mut self, input: SystemInput, namespace: Option<&str>) -> Result<()> {
        let contents = parse_input(input)?;
        let target = match namespace {
            Some(namespace) => self.namespaced.entry(namespace.to_string()).or_default(),
            None => &mut self.global,
        };

        for content in contents {
            let fingerprint = fingerprint_text(&content);
            if target
                .iter()
                .any(|existing| fingerprint_text(&existing.content) == fingerprint)
            {
                debug!(namespace = ?namespace, "system message already present");
                continue;
            }
            target.push(SystemMessage::new(content));
        }
        Ok(())
    }

    /// Messages stored under `namespace`, or the global ones for `None`.
    pub fn get(&self, namespace: Option<&str>) -> &[SystemMessage] {
        match namespace {
            Some(namespace) => self
                .namespaced
                .get(namespace)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            None => &self.global,
        }
    }

    /// Global messages followed by those of `namespace`.
    pub fn for_prompt(&self, namespace: Option<&str>) -> impl Iterator<Item = &SystemMessage> {
        let scoped: &[SystemMessage] = match namespace {
            Some(namespace) => self.get(Some(namespace)),
            None => &[],
        };
        self.global.iter().chain(scoped)
    }
}

fn parse_input(input: SystemInput) -> Result<Vec<String>> {
    match input {
        SystemInput::Text(text) => Ok(vec![text]),
        SystemInput::Values(values) => values.into_iter().map(parse_value).collect(),
        SystemInput::Messages(messages) => messages.into_iter().map(parse_protocol).collect(),
    }
}

fn parse_protocol(message: ProtocolMessage) -> Result<String> {
    if message.role != WireRole::System {
        return Err(MessageListError::ExpectedSystemRole(message.role.to_string()));
    }
    Ok(match message.content {
        ProtocolContent::Text(text) => text,
        ProtocolContent::Parts(parts) => parts
            .into_iter()
            .filter_map(|part| match part {
                ProtocolPart::Text { text } => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
    })
}

fn parse_value(value: Value) -> Result<String> {
    let object = match value {
        Value::String(text) => return Ok(text),
        Value::Object(object) => object,
        other => {
            return Err(MessageListError::UnhandledShape(format!(
                "system message must be a string or an object, got {other}"
            )))
        }
    };

    let role = object.get("role").and_then(Value::as_str).unwrap_or("missing");
    if role != WireRole::System.as_str() {
        return Err(MessageListError::ExpectedSystemRole(role.to_string()));
    }

    match object.get("content") {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Array(parts)) => Ok(join_text_parts(parts)),
        Some(Value::Object(content)) => match content.get("parts") {
            Some(Value::Array(parts)) => Ok(join_text_parts(parts)),
            _ => Err(MessageListError::UnhandledShape(
                "system message content object has no parts".to_string(),
            )),
        },
        _ => Err(MessageListError::UnhandledShape(
            "system message has no content".to_string(),
        )),
    }
}

fn join_text_parts(parts: &[Value]) -> String {
    parts
        .iter()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}
