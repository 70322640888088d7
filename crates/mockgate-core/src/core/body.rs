// crates/mockgate-core/src/core/body.rs
// ============================================================================
// Module: Mockgate Bodies
// Description: Request and response body representations.
// Purpose: Carry textual or binary payloads with an optional content type.
// Dependencies: base64, serde
// ============================================================================

//! ## Overview
//! Bodies are either UTF-8 strings or raw bytes. Binary bodies serialize as
//! standard base64 so expectations stay valid JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Body
// ============================================================================

/// HTTP message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Body {
    /// UTF-8 text body.
    String {
        /// Body text.
        string: String,
        /// Optional content type.
        #[serde(default, rename = "contentType", skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
    /// Raw byte body.
    Binary {
        /// Body bytes.
        #[serde(rename = "base64Bytes", with = "base64_bytes")]
        bytes: Vec<u8>,
        /// Optional content type.
        #[serde(default, rename = "contentType", skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
}

impl Body {
    /// Creates a text body without a content type.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            string: value.into(),
            content_type: None,
        }
    }

    /// Creates a binary body without a content type.
    #[must_use]
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Binary {
            bytes: bytes.into(),
            content_type: None,
        }
    }

    /// Builds a body from received bytes.
    ///
    /// Textual content types holding valid UTF-8 become [`Body::String`]; anything else is
    /// kept as [`Body::Binary`].
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        if content_type.as_deref().is_some_and(is_textual_content_type) {
            match String::from_utf8(bytes) {
                Ok(string) => Self::String {
                    string,
                    content_type,
                },
                Err(err) => Self::Binary {
                    bytes: err.into_bytes(),
                    content_type,
                },
            }
        } else {
            Self::Binary {
                bytes,
                content_type,
            }
        }
    }

    /// Returns the body bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::String {
                string, ..
            } => string.as_bytes(),
            Self::Binary {
                bytes, ..
            } => bytes,
        }
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Returns the declared content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::String {
                content_type, ..
            }
            | Self::Binary {
                content_type, ..
            } => content_type.as_deref(),
        }
    }

    /// Returns true when the body holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Returns true for content types whose payloads are text.
fn is_textual_content_type(content_type: &str) -> bool {
    let base = content_type.split(';').next().unwrap_or(content_type).trim().to_ascii_lowercase();
    base.starts_with("text/")
        || base == "application/json"
        || base.ends_with("+json")
        || base == "application/xml"
        || base.ends_with("+xml")
        || base == "application/x-www-form-urlencoded"
        || base == "application/javascript"
}

// ============================================================================
// SECTION: Serde Helpers
// ============================================================================

/// Serializes byte vectors as standard base64 strings.
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    /// Encodes bytes as base64.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    /// Decodes base64 into bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}
