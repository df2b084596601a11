//! Gateway module - Edit pipeline orchestration

pub mod pipeline;

pub use pipeline::{CompositeResult, EditPipeline};
