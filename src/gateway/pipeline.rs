//! Edit pipeline: prompt assembly, generation, compositing, and persistence

use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::GenerationBackend;
use crate::compositor::{CompositeInput, Compositor};
use crate::edit::{assemble_prompt, EditRequest};
use crate::error::{AppError, Result};
use crate::storage::{ArtifactPersister, BlobDocumentation};

/// Final output of one edit request
#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub blobs: Option<BlobDocumentation>,
}

/// Runs a validated edit request end to end
pub struct EditPipeline {
    backend: Arc<dyn GenerationBackend>,
    compositor: Compositor,
    persister: Option<ArtifactPersister>,
}

impl EditPipeline {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        compositor: Compositor,
        persister: Option<ArtifactPersister>,
    ) -> Self {
        Self {
            backend,
            compositor,
            persister,
        }
    }

    /// Whether artifacts are archived after compositing
    pub fn persistence_enabled(&self) -> bool {
        self.persister.is_some()
    }

    pub async fn run(&self, request: EditRequest) -> Result<CompositeResult> {
        info!(
            prompt_len = request.prompt.len(),
            has_mask = request.mask.is_some(),
            has_insert = request.insert().is_some(),
            strength = request.parameters.strength,
            "Running edit pipeline"
        );

        let prompt = assemble_prompt(&request);
        let generated = self.backend.generate(&prompt).await?;
        debug!(size = generated.bytes.len(), "Generated image received");

        let input = CompositeInput {
            base: request.base_image.bytes.clone(),
            base_dimensions: Some((request.base_image.width, request.base_image.height)),
            generated: generated.bytes,
            mask: request.mask.as_ref().map(|m| m.bytes.clone()),
            insert_region: request.insert().map(|(_, region)| region),
            strength: request.parameters.strength,
        };

        let compositor = self.compositor.clone();
        let output = tokio::task::spawn_blocking(move || compositor.composite(&input))
            .await
            .map_err(|e| AppError::CompositingFailed(format!("compositing task failed: {}", e)))?
            .map_err(|e| AppError::CompositingFailed(e.to_string()))?;

        debug!(
            canvas_width = output.width,
            canvas_height = output.height,
            masked = output.masked,
            "Composite encoded"
        );

        let blobs = match &self.persister {
            Some(persister) => Some(
                persister
                    .persist(&request, &output, self.backend.name())
                    .await,
            ),
            None => None,
        };

        Ok(CompositeResult {
            png: output.png,
            width: output.width,
            height: output.height,
            blobs,
        })
    }
}
