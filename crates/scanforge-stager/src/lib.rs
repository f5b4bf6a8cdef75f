//! `ArtifactStager`: uploaded-archive staging and extraction (spec §4.2).

pub mod error;
pub mod extract;
pub mod protocol;
pub mod stager;

pub use error::StagerError;
pub use stager::ArtifactStager;
