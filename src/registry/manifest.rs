//! registry::manifest
//!
//! Schema2 image manifest and image config documents.
//!
//! Only the fields this tool reads are modelled. Unknown fields are
//! ignored on input, so a manifest re-serialized from these types is not
//! byte-identical to what the registry stored; its digest differs, which
//! is exactly what the tag-overwrite step of deletion relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::traits::RegistryError;
use super::MEDIA_TYPE_MANIFEST_V2;
use crate::core::types::Digest;

/// Reference to a blob: media type, size and digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub size: u64,
    pub digest: Digest,
}

/// A v2 schema2 image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

impl ImageManifest {
    /// Decode a manifest from a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, RegistryError> {
        let manifest: ImageManifest = serde_json::from_slice(body)
            .map_err(|e| RegistryError::InvalidResponse(format!("not a schema2 manifest: {}", e)))?;
        if manifest.schema_version != 2 {
            return Err(RegistryError::InvalidResponse(format!(
                "unexpected manifest schemaVersion {}",
                manifest.schema_version
            )));
        }
        Ok(manifest)
    }

    /// Serialize for upload.
    pub fn to_vec(&self) -> Result<Vec<u8>, RegistryError> {
        serde_json::to_vec(self)
            .map_err(|e| RegistryError::InvalidResponse(format!("cannot encode manifest: {}", e)))
    }

    /// Media type to send as `Content-Type` on upload.
    pub fn content_type(&self) -> &str {
        self.media_type.as_deref().unwrap_or(MEDIA_TYPE_MANIFEST_V2)
    }

    /// Config size plus the sum of all layer sizes, saturating at `u64::MAX`.
    pub fn total_size(&self) -> u64 {
        self.layers
            .iter()
            .fold(self.config.size, |total, layer| total.saturating_add(layer.size))
    }

    /// A manifest with the same config and no layers.
    ///
    /// Pushed over a tag to move it away from a digest shared with other
    /// tags, so the tag can be deleted without touching its siblings.
    pub fn placeholder(&self) -> Self {
        Self {
            schema_version: 2,
            media_type: Some(MEDIA_TYPE_MANIFEST_V2.to_string()),
            config: self.config.clone(),
            layers: Vec::new(),
        }
    }
}

/// The parts of an image config blob that are displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl ImageConfig {
    /// Decode a config blob.
    pub fn from_slice(body: &[u8]) -> Result<Self, RegistryError> {
        serde_json::from_slice(body)
            .map_err(|e| RegistryError::InvalidResponse(format!("not an image config: {}", e)))
    }
}
