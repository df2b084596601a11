//! Room Edit Gateway
//!
//! Validates room-photo edit requests, drives an external multimodal
//! generation API, and composites the generated pixels back onto the
//! original photo using the uploaded mask or insert placement.

pub mod api;
pub mod backend;
pub mod compositor;
pub mod config;
pub mod edit;
pub mod error;
pub mod gateway;
pub mod response;
pub mod storage;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::HttpGenerationBackend;
use compositor::Compositor;
use gateway::EditPipeline;
use storage::{ArtifactPersister, HttpBlobStore};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub pipeline: Arc<EditPipeline>,
}

impl AppState {
    /// Wire the generation client, compositor, and optional blob store from settings
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        let backend = Arc::new(HttpGenerationBackend::new(&settings.generation)?);
        let persister = HttpBlobStore::from_config(&settings.storage)?
            .map(|store| ArtifactPersister::new(Arc::new(store), settings.storage.prefix.clone()));
        let pipeline = EditPipeline::new(backend, Compositor::new(&settings.limits), persister);

        Ok(Self {
            settings: Arc::new(settings),
            pipeline: Arc::new(pipeline),
        })
    }
}
