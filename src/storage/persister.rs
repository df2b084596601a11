//! Best-effort archiving of edit inputs, outputs, and metadata

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::compositor::CompositeOutput;
use crate::edit::{EditParameters, EditRequest, NormalizedRect, PixelRect};
use crate::storage::blob::{BlobStore, StoredBlob};

/// Archive locations reported back to the client; each is `null` on failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobDocumentation {
    pub input: Option<StoredBlob>,
    pub mask: Option<StoredBlob>,
    pub output: Option<StoredBlob>,
    pub metadata: Option<StoredBlob>,
}

/// Record stored alongside the images of one edit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMetadata {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub parameters: EditParameters,
    pub files: ArtifactFiles,
    pub insert: Option<InsertPlacement>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactFiles {
    pub input: String,
    pub mask: Option<String>,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsertPlacement {
    pub normalized: NormalizedRect,
    pub pixels: PixelRect,
}

/// Uploads the four artifacts of an edit concurrently
pub struct ArtifactPersister {
    store: Arc<dyn BlobStore>,
    prefix: String,
}

impl ArtifactPersister {
    pub fn new(store: Arc<dyn BlobStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Upload input, mask, output, and metadata; individual failures become `None`
    pub async fn persist(
        &self,
        request: &EditRequest,
        output: &CompositeOutput,
        model: &str,
    ) -> BlobDocumentation {
        let id = Uuid::new_v4();
        let folder = if self.prefix.is_empty() {
            id.to_string()
        } else {
            format!("{}/{}", self.prefix, id)
        };

        let files = ArtifactFiles {
            input: format!("{}/input.{}", folder, request.base_image.extension()),
            mask: request.mask.as_ref().map(|_| format!("{}/mask.png", folder)),
            output: format!("{}/output.png", folder),
        };
        let metadata_path = format!("{}/metadata.json", folder);

        let metadata = EditMetadata {
            id,
            created_at: Utc::now(),
            model: model.to_string(),
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            parameters: request.parameters,
            insert: request.insert().map(|(_, region)| InsertPlacement {
                normalized: region,
                pixels: region.to_pixels(output.width, output.height),
            }),
            width: output.width,
            height: output.height,
            files: files.clone(),
        };

        let mask_upload = async {
            match (&request.mask, &files.mask) {
                (Some(mask), Some(path)) => {
                    self.upload("mask", path, mask.bytes.clone(), &mask.content_type)
                        .await
                }
                _ => None,
            }
        };

        let metadata_upload = async {
            match serde_json::to_vec_pretty(&metadata) {
                Ok(bytes) => {
                    self.upload("metadata", &metadata_path, bytes, "application/json")
                        .await
                }
                Err(e) => {
                    warn!(error = %e, "Failed to serialize edit metadata");
                    None
                }
            }
        };

        let (input, mask, output_blob, metadata_blob) = futures::join!(
            self.upload(
                "input",
                &files.input,
                request.base_image.bytes.clone(),
                &request.base_image.content_type,
            ),
            mask_upload,
            self.upload("output", &files.output, output.png.clone(), "image/png"),
            metadata_upload,
        );

        let documentation = BlobDocumentation {
            input,
            mask,
            output: output_blob,
            metadata: metadata_blob,
        };
        info!(
            edit_id = %id,
            input = documentation.input.is_some(),
            mask = documentation.mask.is_some(),
            output = documentation.output.is_some(),
            metadata = documentation.metadata.is_some(),
            "Persisted edit artifacts"
        );
        documentation
    }

    async fn upload(
        &self,
        artifact: &'static str,
        pathname: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Option<StoredBlob> {
        match self.store.put(pathname, bytes, content_type).await {
            Ok(blob) => Some(blob),
            Err(e) => {
                warn!(artifact, pathname = %pathname, error = %e, "Artifact upload failed");
                None
            }
        }
    }
}
