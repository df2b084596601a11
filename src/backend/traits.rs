//! Common traits and types for the generation backend

use async_trait::async_trait;

use crate::edit::AssembledPrompt;
use crate::error::Result;

/// Image bytes returned by the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Trait for the external image generation service
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Send one prompt and return the first usable image.
    ///
    /// Exactly one upstream attempt is made; retrying is the caller's call.
    async fn generate(&self, prompt: &AssembledPrompt) -> Result<GeneratedImage>;
}
