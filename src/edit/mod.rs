//! Edit request module - Validation, insert placement, and prompt assembly

pub mod prompt;
pub mod region;
pub mod request;
pub mod validator;

pub use prompt::{assemble_prompt, AssembledPrompt, GenerationPromptSegment};
pub use region::{normalize_region, RawPlacement};
pub use request::{EditParameters, EditRequest, ImageAsset, NormalizedRect, PixelRect};
pub use validator::{RawEditForm, UploadedFile, ValidationError};
