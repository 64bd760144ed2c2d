use riverglade_models::RegistryError;
use thiserror::Error;

/// Errors that abort a tile generation pass
///
/// Placement exhaustion is not an error; it is absorbed by the placer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("invalid terrain configuration: {0}")]
    Config(String),

    #[error("river path has {points} points, at least 2 are needed to build geometry")]
    DegenerateRiver { points: usize },

    #[error("ribbon `{name}` has paths of unequal length")]
    RaggedRibbon { name: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
