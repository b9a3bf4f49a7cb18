#![deny(missing_docs)]
//! File-upload coordination: inline small files, deduplicate and poll larger
//! uploads to the generative backend's file API by content hash.

mod coordinator;
mod handle;

pub use coordinator::{PollConfig, UploadCoordinator};
pub use handle::{ContentRef, UploadBackend, UploadHandle, UploadState};
