use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::vegetation::VegetationTable;

/// Clearance added outside the banks before the flat ground starts
pub const EDGE_PAD: f32 = 1.0;

/// Everything needed to generate one tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub tile_size: f32,
    pub river: RiverSettings,
    pub cluster: ClusterSettings,
    pub sparse: SparseSettings,
    pub vegetation: VegetationTable,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            tile_size: 100.0,
            river: RiverSettings::default(),
            cluster: ClusterSettings::default(),
            sparse: SparseSettings::default(),
            vegetation: VegetationTable::default(),
        }
    }
}

impl TerrainConfig {
    pub fn half_tile(&self) -> f32 {
        self.tile_size / 2.0
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        if !(self.tile_size > 0.0) {
            return Err(TerrainError::Config(format!("tile_size must be positive, got {}", self.tile_size)));
        }
        self.river.validate(self.tile_size)?;
        self.cluster.validate()?;
        self.sparse.validate()?;
        self.vegetation.validate()
    }
}

/// River shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverSettings {
    /// Water surface width, bank to bank
    pub width: f32,
    /// Width of the sloped bank on each side
    pub edges_width: f32,
    /// Band the centerline waypoints are jittered within
    pub corridor_width: f32,
    pub depth: f32,
    /// Minimum distance between the exclusion zone and the tile border
    pub margin: f32,
    /// Waypoint spacing along z
    pub step: f32,
}

impl Default for RiverSettings {
    fn default() -> Self {
        Self {
            width: 10.0,
            edges_width: 1.0,
            corridor_width: 10.0,
            depth: 1.0,
            margin: 5.0,
            step: 10.0,
        }
    }
}

impl RiverSettings {
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    /// Distance from the corridor center to the tile border that must stay free
    pub fn total_margin(&self) -> f32 {
        self.margin + self.edges_width + self.half_width() + EDGE_PAD + self.corridor_width / 2.0
    }

    pub fn validate(&self, tile_size: f32) -> Result<(), TerrainError> {
        if self.width < 0.0 || self.edges_width < 0.0 || self.corridor_width < 0.0 || self.margin < 0.0 {
            return Err(TerrainError::Config("river widths and margin must not be negative".to_string()));
        }
        if !(self.step > 0.0) || self.step > tile_size {
            return Err(TerrainError::Config(format!(
                "river step must be in (0, {}], got {}",
                tile_size, self.step
            )));
        }
        if tile_size < 2.0 * self.total_margin() {
            return Err(TerrainError::Config(format!(
                "tile of size {} is too narrow for a river needing {} on each side",
                tile_size,
                self.total_margin()
            )));
        }
        Ok(())
    }
}

/// Clustered vegetation: groups grown around random centers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    pub min: u32,
    pub max: u32,
    pub min_trees: u32,
    pub max_trees: u32,
    /// Attempts per tree slot
    pub spawn_try: u32,
    /// Radius growth between attempts
    pub spawn_dist_inc: f32,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            min: 2,
            max: 5,
            min_trees: 3,
            max_trees: 10,
            spawn_try: 50,
            spawn_dist_inc: 0.5,
        }
    }
}

impl ClusterSettings {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.min > self.max || self.min_trees > self.max_trees {
            return Err(TerrainError::Config("cluster ranges are inverted".to_string()));
        }
        if self.spawn_dist_inc < 0.0 {
            return Err(TerrainError::Config("cluster spawn_dist_inc must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Which attempt budget sparse trees use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SparseRetryBudget {
    /// Reuse `ClusterSettings::spawn_try`
    #[default]
    SharedWithClusters,
    /// Use `SparseSettings::spawn_try`
    Own,
}

/// Sparse vegetation: lone trees anywhere on the tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparseSettings {
    pub min: u32,
    pub max: u32,
    /// Only read when `retry_budget` is `Own`
    pub spawn_try: u32,
    pub retry_budget: SparseRetryBudget,
}

impl Default for SparseSettings {
    fn default() -> Self {
        Self {
            min: 10,
            max: 20,
            spawn_try: 10,
            retry_budget: SparseRetryBudget::SharedWithClusters,
        }
    }
}

impl SparseSettings {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.min > self.max {
            return Err(TerrainError::Config("sparse range is inverted".to_string()));
        }
        Ok(())
    }

    /// Attempts per sparse tree slot
    pub fn attempts(&self, cluster: &ClusterSettings) -> u32 {
        match self.retry_budget {
            SparseRetryBudget::SharedWithClusters => cluster.spawn_try,
            SparseRetryBudget::Own => self.spawn_try,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TerrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.half_tile(), 50.0);
        assert_eq!(config.river.step, config.tile_size / 10.0);
    }

    #[test]
    fn test_sparse_budget_selection() {
        let cluster = ClusterSettings::default();
        let mut sparse = SparseSettings::default();
        assert_eq!(sparse.attempts(&cluster), 50);

        sparse.retry_budget = SparseRetryBudget::Own;
        assert_eq!(sparse.attempts(&cluster), 10);
    }

    #[test]
    fn test_rejects_bad_step() {
        let mut river = RiverSettings::default();
        river.step = 0.0;
        assert!(river.validate(100.0).is_err());

        river.step = 150.0;
        assert!(river.validate(100.0).is_err());

        river.step = 100.0;
        assert!(river.validate(100.0).is_ok());
    }

    #[test]
    fn test_rejects_narrow_tile() {
        let config = TerrainConfig {
            tile_size: 30.0,
            river: RiverSettings { step: 10.0, ..RiverSettings::default() },
            ..TerrainConfig::default()
        };
        assert!(matches!(config.validate(), Err(TerrainError::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let cluster = ClusterSettings { min: 4, max: 2, ..ClusterSettings::default() };
        assert!(cluster.validate().is_err());

        let sparse = SparseSettings { min: 3, max: 1, ..SparseSettings::default() };
        assert!(sparse.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TerrainConfig = serde_json::from_str(
            r#"{ "tile_size": 120.0, "sparse": { "retry_budget": "own" } }"#,
        )
        .unwrap();

        assert_eq!(config.tile_size, 120.0);
        assert_eq!(config.sparse.retry_budget, SparseRetryBudget::Own);
        assert_eq!(config.sparse.max, 20);
        assert_eq!(config.cluster, ClusterSettings::default());
    }
}
