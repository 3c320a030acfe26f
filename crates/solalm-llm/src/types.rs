//! Values exchanged with the generative service.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// A quoted passage plus its reference, e.g. `"Genesis 1:3"`.
///
/// The serialized field names match what the model is asked to return, so
/// the same shape is used for provider responses and persisted snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextFragment {
    #[serde(rename = "verseText")]
    pub text: String,
    pub reference: String,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference: reference.into(),
        }
    }
}

impl fmt::Display for TextFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.text, self.reference)
    }
}

/// Which corpus a fragment is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentMode {
    /// Any visually evocative passage.
    General,
    /// A passage from the book of Revelation; used for the featured fragment.
    Revelation,
}

impl FragmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentMode::General => "general",
            FragmentMode::Revelation => "revelation",
        }
    }
}

/// Opaque, displayable handle to a generated image.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub mime_type: String,
    pub data_base64: String,
}

impl ImageHandle {
    pub fn new(mime_type: impl Into<String>, data_base64: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data_base64: data_base64.into(),
        }
    }

    /// `data:` URL suitable for direct display.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(self.data_base64.as_bytes())
    }

    /// File extension implied by the MIME type.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data_base64.len())
            .finish()
    }
}
