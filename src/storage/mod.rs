//! Storage module - Blob store client and artifact persistence

pub mod blob;
pub mod persister;

pub use blob::{BlobStore, HttpBlobStore, StoredBlob};
pub use persister::{ArtifactPersister, BlobDocumentation, EditMetadata};
