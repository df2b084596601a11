//! Backend module - Generation trait, HTTP client, and response extraction

pub mod extract;
pub mod http_backend;
pub mod traits;

pub use http_backend::HttpGenerationBackend;
pub use traits::{GeneratedImage, GenerationBackend};
