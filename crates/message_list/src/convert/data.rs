use base64::{engine::general_purpose, Engine as _};
use message_core::DataContent;
use tracing::warn;

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// URLs and data URLs pass through conversion untouched.
pub(crate) fn is_url(payload: &str) -> bool {
    payload.starts_with(DATA_URL_PREFIX) || payload.contains("://")
}

/// Turn a string payload into a URL, wrapping bare base64 in a data URL.
pub(crate) fn to_url(media_type: &str, payload: &str) -> String {
    if is_url(payload) {
        payload.to_string()
    } else {
        format!("{DATA_URL_PREFIX}{media_type}{BASE64_MARKER}{payload}")
    }
}

/// Split `data:<media>;base64,<payload>` into its media type and payload.
pub(crate) fn split_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix(DATA_URL_PREFIX)?;
    let marker = rest.find(BASE64_MARKER)?;
    Some((&rest[..marker], &rest[marker + BASE64_MARKER.len()..]))
}

/// String payload as stored on a gen 2 file part: bare base64 for data URLs.
pub(crate) fn to_legacy_payload(url: &str) -> String {
    split_data_url(url)
        .map(|(_, payload)| payload.to_string())
        .unwrap_or_else(|| url.to_string())
}

/// Encode a wire payload as a URL. Binary payloads become inline base64.
///
/// Returns `None` when a binary payload cannot be decoded; the caller drops
/// the part.
pub(crate) fn encode(data: &DataContent, media_type: &str) -> Option<String> {
    match data.to_bytes() {
        Ok(None) => data.as_text().map(|text| to_url(media_type, text)),
        Ok(Some(bytes)) => {
            let encoded = general_purpose::STANDARD.encode(bytes);
            Some(format!("{DATA_URL_PREFIX}{media_type}{BASE64_MARKER}{encoded}"))
        }
        Err(err) => {
            warn!(media_type, error = %err, "failed to encode binary payload");
            None
        }
    }
}

/// Best guess at a media type for an image part that did not declare one.
pub(crate) fn image_media_type(data: &DataContent, declared: Option<&str>) -> String {
    declared
        .map(str::to_string)
        .or_else(|| {
            data.as_text()
                .and_then(split_data_url)
                .map(|(media_type, _)| media_type.to_string())
        })
        .unwrap_or_else(|| "image/*".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls_pass_through() {
        assert_eq!(to_url("image/png", "https://a/b.png"), "https://a/b.png");
        assert_eq!(to_url("image/png", "data:image/png;base64,AA=="), "data:image/png;base64,AA==");
        assert_eq!(to_url("image/png", "AA=="), "data:image/png;base64,AA==");
    }

    #[test]
    fn test_binary_becomes_base64() {
        let data = DataContent::from(&b"hi"[..]);
        assert_eq!(encode(&data, "text/plain").unwrap(), "data:text/plain;base64,aGk=");
    }

    #[test]
    fn test_bad_binary_is_dropped() {
        let data: DataContent = serde_json::from_value(json!([1, "x"])).unwrap();
        assert_eq!(encode(&data, "text/plain"), None);
    }

    #[test]
    fn test_split_and_legacy_payload() {
        assert_eq!(
            split_data_url("data:image/png;base64,AA=="),
            Some(("image/png", "AA=="))
        );
        assert_eq!(split_data_url("https://a"), None);
        assert_eq!(to_legacy_payload("data:image/png;base64,AA=="), "AA==");
        assert_eq!(to_legacy_payload("https://a"), "https://a");
    }

    #[test]
    fn test_image_media_type_inference() {
        let data = DataContent::Text("data:image/jpeg;base64,AA==".to_string());
        assert_eq!(image_media_type(&data, None), "image/jpeg");
        assert_eq!(image_media_type(&data, Some("image/gif")), "image/gif");
        let data = DataContent::Text("https://a/b".to_string());
        assert_eq!(image_media_type(&data, None), "image/*");
    }
}
