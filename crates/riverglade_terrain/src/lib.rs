pub mod config;
pub mod error;
pub mod mesh_gen;
pub mod random;
pub mod river;
pub mod seed;
pub mod terrain;
pub mod tree;
pub mod vegetation;

// Re-export commonly used items
pub use config::{ClusterSettings, RiverSettings, SparseRetryBudget, SparseSettings, TerrainConfig};
pub use error::TerrainError;
pub use mesh_gen::{MeshCollector, RenderSurface, SurfaceMaterial, SurfaceMesh, TerrainMeshBuilder, TerrainMeshes};
pub use river::{generate_river, River, RiverBounds, RiverGeometry};
pub use seed::{GenerationPhase, TileSeed};
pub use terrain::{Terrain, TileSummary, TreeSummary};
pub use tree::{Tree, TreeVisual};
pub use vegetation::{PlacementStats, Rejection, VegetationOdds, VegetationPlacer, VegetationTable};
