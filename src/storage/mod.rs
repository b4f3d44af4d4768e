//! Artifact persistence
//!
//! The pipeline only hands artifacts over; naming and placement live here.

pub mod naming;
pub mod writer;

pub use naming::{ArtifactKind, artifact_file_name, slugify};
pub use writer::{FsResultWriter, ResultWriter, RunArtifacts, render_result};
