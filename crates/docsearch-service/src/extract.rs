//! Content extraction: source bytes to plain text.

use serde_json::Value;

use crate::error::ExtractionError;

/// JSON pointer to the text member of a CST document.
const CST_TEXT_POINTER: &str = "/ext/extracted/text";
const CST_TEXT_FIELD: &str = "ext.extracted.text";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Turns raw document bytes into plain text.
///
/// Implementations must be safe to call from many requests at once.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], media_type: Option<&str>) -> Result<String, ExtractionError>;
}

/// Default extractor for text and CST JSON documents.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    max_chars: Option<usize>,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Truncate extracted text to `max_chars` characters.
    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn truncate(&self, mut text: String) -> String {
        if let Some(max) = self.max_chars {
            if let Some((byte_index, _)) = text.char_indices().nth(max) {
                text.truncate(byte_index);
            }
        }
        text
    }
}

fn is_json(media_type: Option<&str>) -> bool {
    let Some(media_type) = media_type else {
        return false;
    };
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn decode_utf8(bytes: &[u8]) -> Result<&str, ExtractionError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    Ok(std::str::from_utf8(bytes)?)
}

impl ContentExtractor for TextExtractor {
    fn extract(&self, bytes: &[u8], media_type: Option<&str>) -> Result<String, ExtractionError> {
        if bytes.is_empty() {
            return Ok(String::new());
        }

        let text = if is_json(media_type) {
            let document: Value = serde_json::from_slice(bytes)?;
            document
                .pointer(CST_TEXT_POINTER)
                .and_then(Value::as_str)
                .ok_or(ExtractionError::MissingField(CST_TEXT_FIELD))?
                .to_string()
        } else {
            decode_utf8(bytes)?.to_string()
        };

        Ok(self.truncate(text))
    }
}
