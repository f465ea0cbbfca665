//! `data:<mime>;base64,<data>` URIs
//!
//! Used for image inputs (NDVI maps) and image outputs (avatars).

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};

use super::DataUriError;

/// A parsed base64 data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime: String,
    data: String,
}

impl DataUri {
    /// Parse and check a data URI, including that the payload decodes
    pub fn parse(raw: &str) -> Result<Self, DataUriError> {
        let rest = raw.strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
        let (mime, data) = rest.split_once(";base64,").ok_or(DataUriError::NotBase64)?;

        let valid_mime = mime
            .split_once('/')
            .map(|(kind, sub)| !kind.is_empty() && !sub.is_empty())
            .unwrap_or(false)
            && !mime.contains(char::is_whitespace);
        if !valid_mime {
            return Err(DataUriError::InvalidMime(mime.to_string()));
        }
        if data.is_empty() {
            return Err(DataUriError::EmptyPayload);
        }
        STANDARD
            .decode(data)
            .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?;

        Ok(Self {
            mime: mime.to_string(),
            data: data.to_string(),
        })
    }

    /// Encode raw bytes
    pub fn from_bytes(mime: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime: mime.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Wrap an already base64-encoded payload
    pub fn from_base64(mime: impl Into<String>, data: impl Into<String>) -> Result<Self, DataUriError> {
        Self::parse(&format!("data:{};base64,{}", mime.into(), data.into()))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The base64 payload, without the header
    pub fn base64(&self) -> &str {
        &self.data
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Decoded payload
    pub fn to_bytes(&self) -> Vec<u8> {
        // parse() and from_bytes() guarantee the payload decodes
        STANDARD.decode(&self.data).unwrap_or_default()
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.data)
    }
}
