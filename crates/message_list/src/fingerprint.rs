//! Cheap structural signatures used to detect re-delivered messages.
//!
//! A fingerprint is an order-sensitive string built from each part's type tag
//! and a payload proxy. Two part lists with equal fingerprints are treated as
//! the same content. This is a heuristic, not a content hash: texts of equal
//! length compare equal.

use message_core::{ContentPart, Message};

const SEPARATOR: char = ';';

/// Fingerprint of a part list.
pub fn fingerprint_parts(parts: &[ContentPart]) -> String {
    let mut fingerprint = String::new();
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            fingerprint.push(SEPARATOR);
        }
        fingerprint.push_str(part.type_tag());
        fingerprint.push(':');
        fingerprint.push_str(&payload_proxy(part));
    }
    fingerprint
}

pub fn fingerprint_message(message: &Message) -> String {
    fingerprint_parts(&message.content.parts)
}

/// Plain string content is fingerprinted verbatim.
pub fn fingerprint_text(text: &str) -> String {
    text.to_string()
}

fn payload_proxy(part: &ContentPart) -> String {
    match part {
        ContentPart::Text { text } | ContentPart::Reasoning { text } => text.len().to_string(),
        ContentPart::File {
            url,
            media_type,
            filename,
        } => format!(
            "({}|{}|{})",
            url.len(),
            media_type,
            filename.as_deref().unwrap_or_default()
        ),
        ContentPart::SourceUrl { url, .. } => url.len().to_string(),
        ContentPart::ToolInvocation {
            tool_call_id,
            state,
            ..
        } => format!("({}|{})", tool_call_id, state.as_str()),
        ContentPart::StepBoundary => String::new(),
    }
}
