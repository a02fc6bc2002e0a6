//! Validated photo payloads handed from upload to the classifier port.

#![allow(missing_docs)]

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::errors::{BevError, Result};

/// Upload formats the classifier accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }
}

/// An uploaded photo whose format has been verified from its magic bytes.
///
/// The bytes are shared, so cloning a payload into a worker thread is cheap.
/// The SHA-256 digest doubles as the opaque image handle.
#[derive(Clone)]
pub struct ImagePayload {
    bytes: Arc<[u8]>,
    format: ImageFormat,
    digest: String,
}

impl ImagePayload {
    /// Accept JPEG, PNG, or WEBP bytes; anything else is `InvalidImage`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(BevError::InvalidImage {
                details: "file is empty".to_string(),
            });
        }
        let detected = infer::get(&bytes).ok_or_else(|| BevError::InvalidImage {
            details: "unrecognised file type".to_string(),
        })?;
        let format =
            ImageFormat::from_mime(detected.mime_type()).ok_or_else(|| BevError::InvalidImage {
                details: format!(
                    "{} is not supported (use jpg, jpeg, png, or webp)",
                    detected.mime_type()
                ),
            })?;
        let digest = format!("{:x}", Sha256::digest(&bytes));
        Ok(Self {
            bytes: bytes.into(),
            format,
            digest,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| BevError::io(path, source))?;
        Self::from_bytes(bytes)
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Lowercase hex SHA-256 of the raw bytes.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            digest: self.digest.clone(),
            format: self.format,
            size_bytes: self.bytes.len(),
        }
    }
}

impl PartialEq for ImagePayload {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest && self.format == other.format
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("format", &self.format)
            .field("digest", &self.digest)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Serializable stand-in for an image in session snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub digest: String,
    pub format: ImageFormat,
    pub size_bytes: usize,
}
