//! Binary payloads carried by file and image parts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DataContentError;

/// Payload of a file or image part as it arrives on the wire.
///
/// Byte arrays are kept as raw JSON values so that a malformed payload only
/// fails when it is converted, not when the enclosing message is parsed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum DataContent {
    /// URL, data URL or base64 text
    Text(String),
    /// Byte array, e.g. `[104, 105]`
    Bytes(Vec<Value>),
    /// Serialized buffer object, e.g. `{"type": "Buffer", "data": [104, 105]}`
    Buffer {
        #[serde(rename = "type")]
        kind: String,
        data: Vec<Value>,
    },
}

impl DataContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Decode a binary payload into bytes.
    ///
    /// Returns `Ok(None)` for string payloads, which are passed through as-is.
    pub fn to_bytes(&self) -> Result<Option<Vec<u8>>, DataContentError> {
        let values = match self {
            DataContent::Text(_) => return Ok(None),
            DataContent::Bytes(values) => values,
            DataContent::Buffer { kind, data } => {
                if kind != "Buffer" {
                    return Err(DataContentError::UnsupportedContainer(kind.clone()));
                }
                data
            }
        };

        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                value
                    .as_u64()
                    .and_then(|byte| u8::try_from(byte).ok())
                    .ok_or(DataContentError::InvalidByte { index })
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Some)
    }
}

impl From<String> for DataContent {
    fn from(text: String) -> Self {
        DataContent::Text(text)
    }
}

impl From<&[u8]> for DataContent {
    fn from(bytes: &[u8]) -> Self {
        DataContent::Bytes(bytes.iter().map(|b| Value::from(*b)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_payload_is_not_decoded() {
        let data: DataContent = serde_json::from_value(json!("https://example.com/a.png")).unwrap();
        assert_eq!(data.to_bytes().unwrap(), None);
        assert_eq!(data.as_text(), Some("https://example.com/a.png"));
    }

    #[test]
    fn test_byte_array_and_buffer_decode() {
        let data: DataContent = serde_json::from_value(json!([104, 105])).unwrap();
        assert_eq!(data.to_bytes().unwrap(), Some(b"hi".to_vec()));

        let data: DataContent =
            serde_json::from_value(json!({"type": "Buffer", "data": [104, 105]})).unwrap();
        assert_eq!(data.to_bytes().unwrap(), Some(b"hi".to_vec()));
    }

    #[test]
    fn test_invalid_byte_reports_index() {
        let data: DataContent = serde_json::from_value(json!([1, 300, 2])).unwrap();
        assert_eq!(
            data.to_bytes().unwrap_err(),
            DataContentError::InvalidByte { index: 1 }
        );
    }
}
