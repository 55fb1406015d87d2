//! Storage layer: artifact directory layout plus JSON and text readers/writers.

mod error;
pub use error::StoreError;

pub mod artifacts;
pub use artifacts::{ArtifactDir, ArtifactPaths};
