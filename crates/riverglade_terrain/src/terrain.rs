use std::rc::Rc;

use riverglade_models::{ModelRegistry, ModelSource, RegistryError};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::TerrainConfig;
use crate::error::TerrainError;
use crate::mesh_gen::{RenderSurface, TerrainMeshBuilder, TerrainMeshes};
use crate::river::{generate_river, River, RiverBounds};
use crate::seed::{GenerationPhase, TileSeed};
use crate::tree::Tree;
use crate::vegetation::{PlacementStats, VegetationPlacer};

/// One generated tile: river, ground meshes and vegetation
///
/// Generation itself is synchronous. Tree visuals are requested as local
/// tasks at the end of [`Terrain::generate`], so it has to run inside a
/// [`tokio::task::LocalSet`].
pub struct Terrain<S> {
    config: TerrainConfig,
    registry: Rc<ModelRegistry<S>>,
    mesh_builder: TerrainMeshBuilder,
    seed: Option<TileSeed>,
    river: Option<River>,
    trees: Vec<Tree>,
    stats: PlacementStats,
    visuals: Vec<JoinHandle<bool>>,
}

impl<S: ModelSource + 'static> Terrain<S> {
    /// Fails when the configuration is inconsistent or names a model the
    /// registry does not know
    pub fn new(config: TerrainConfig, registry: Rc<ModelRegistry<S>>) -> Result<Self, TerrainError> {
        config.validate()?;
        if let Some(unknown) = config.vegetation.entries.iter().find(|e| !registry.contains(&e.model)) {
            return Err(RegistryError::NotFound(unknown.model.clone()).into());
        }

        Ok(Self {
            config,
            registry,
            mesh_builder: TerrainMeshBuilder::default(),
            seed: None,
            river: None,
            trees: Vec::new(),
            stats: PlacementStats::default(),
            visuals: Vec::new(),
        })
    }

    /// Generate the tile for `seed`, emitting its meshes onto `surface`
    ///
    /// Replaces any previously generated tile.
    pub fn generate<R: RenderSurface>(
        &mut self,
        seed: TileSeed,
        surface: &mut R,
    ) -> Result<TerrainMeshes<R::Handle>, TerrainError> {
        log::info!("Generating tile {} (size {})", seed.value, self.config.tile_size);
        let half = self.config.half_tile();

        let mut river_rng = seed.rng(GenerationPhase::River);
        let river = generate_river(&mut river_rng, self.config.tile_size, &self.config.river)?;

        let meshes = self.mesh_builder.build(&river, half, surface)?;

        let mut rng = seed.rng(GenerationPhase::Vegetation);
        let mut placer = VegetationPlacer::new(half, &river, &self.registry, &self.config.vegetation);
        let stats = placer.place_all(&mut rng, &self.config.cluster, &self.config.sparse)?;
        let trees = placer.into_trees();

        for stale in self.visuals.drain(..) {
            stale.abort();
        }
        self.visuals = trees.iter().map(|tree| tree.request_visual(&self.registry)).collect();

        self.seed = Some(seed);
        self.river = Some(river);
        self.trees = trees;
        self.stats = stats;
        Ok(meshes)
    }

    /// Wait for every outstanding visual request; returns how many trees got an instance
    pub async fn wait_for_visuals(&mut self) -> usize {
        let mut attached = 0;
        for handle in self.visuals.drain(..) {
            match handle.await {
                Ok(true) => attached += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Visual task ended early: {}", e),
            }
        }
        log::info!("{} of {} trees have a visual", attached, self.trees.len());
        attached
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn registry(&self) -> &Rc<ModelRegistry<S>> {
        &self.registry
    }

    pub fn river(&self) -> Option<&River> {
        self.river.as_ref()
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn stats(&self) -> PlacementStats {
        self.stats
    }

    pub fn summary(&self) -> Option<TileSummary> {
        let seed = self.seed?;
        let river = self.river.as_ref()?;

        Some(TileSummary {
            seed: seed.value,
            tile_size: self.config.tile_size,
            river_points: river.path.len(),
            bounds: river.bounds,
            stats: self.stats,
            trees: self
                .trees
                .iter()
                .map(|tree| TreeSummary {
                    kind: tree.kind().to_string(),
                    position: tree.position().to_array(),
                    yaw: tree.yaw(),
                    attached: tree.is_attached(),
                })
                .collect(),
        })
    }
}

/// Serializable snapshot of a generated tile
#[derive(Debug, Clone, Serialize)]
pub struct TileSummary {
    pub seed: u64,
    pub tile_size: f32,
    pub river_points: usize,
    pub bounds: RiverBounds,
    pub stats: PlacementStats,
    pub trees: Vec<TreeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeSummary {
    pub kind: String,
    pub position: [f32; 3],
    pub yaw: f32,
    pub attached: bool,
}
