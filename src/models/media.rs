use crate::error::{Result, StudioError};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// An image carried as base64 text together with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| StudioError::Serialization("not a data URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| StudioError::Serialization("data URL has no payload".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| StudioError::Serialization("data URL is not base64".into()))?;
        Ok(Self::new(mime_type, payload))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| StudioError::Serialization(e.to_string()))
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// Location of a generated clip, as handed back by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    pub uri: String,
}

impl VideoRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "artifact", rename_all = "lowercase")]
pub enum ResultArtifact {
    Image(EncodedImage),
    Video(VideoRef),
}

impl ResultArtifact {
    pub fn as_image(&self) -> Option<&EncodedImage> {
        match self {
            ResultArtifact::Image(image) => Some(image),
            ResultArtifact::Video(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoRef> {
        match self {
            ResultArtifact::Video(video) => Some(video),
            ResultArtifact::Image(_) => None,
        }
    }

    /// Something a browser can load directly: a data URL or the video URI.
    pub fn source(&self) -> String {
        match self {
            ResultArtifact::Image(image) => image.to_data_url(),
            ResultArtifact::Video(video) => video.uri.clone(),
        }
    }
}
