use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`ModelSource`](crate::ModelSource) while fetching or parsing an asset
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model file {path} contains no triangles")]
    Empty { path: PathBuf },

    #[error("no template available for `{name}`")]
    Missing { name: String },
}

/// Errors surfaced by the [`ModelRegistry`](crate::ModelRegistry)
///
/// Cloneable so a cached load outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// The name is not part of the catalog. This is a configuration defect.
    #[error("vegetation model `{0}` is not registered")]
    NotFound(String),

    /// The asset behind a registered name could not be loaded.
    #[error("failed to load model `{name}`: {reason}")]
    Load { name: String, reason: String },
}
