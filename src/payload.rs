//! The client/server wire contract: `{"image_data": <base64>}` in,
//! `{"description": <text>}` out.

use std::{fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Raw image bytes as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn read(path: &Path) -> Result<Self, ClientError> {
        if !path.exists() {
            return Err(ClientError::FileNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|source| ClientError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { bytes })
    }

    pub fn from_base64(text: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self {
            bytes: STANDARD.decode(text.trim())?,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard alphabet, padded, no line wrapping.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Best-effort MIME type from the leading magic bytes.
    pub fn mime_type(&self) -> &'static str {
        let b = self.bytes.as_slice();
        if b.starts_with(&[0x89, b'P', b'N', b'G']) {
            "image/png"
        } else if b.starts_with(&[0xFF, 0xD8, 0xFF]) {
            "image/jpeg"
        } else if b.starts_with(b"GIF8") {
            "image/gif"
        } else if b.len() >= 12 && &b[..4] == b"RIFF" && &b[8..12] == b"WEBP" {
            "image/webp"
        } else if b.starts_with(b"BM") {
            "image/bmp"
        } else {
            "image/jpeg"
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

/// Reads `path` and returns its base64 text.
pub fn encode(path: &Path) -> Result<String, ClientError> {
    ImagePayload::read(path).map(|payload| payload.to_base64())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeRequest {
    pub image_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionResult {
    pub description: String,
}
