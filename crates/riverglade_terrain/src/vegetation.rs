//! Tree placement: clusters grown around random centers, then sparse trees
//! anywhere on the tile. Every candidate must stay on the tile, off the river
//! and clear of every tree placed before it.

use glam::{Vec2, Vec3};
use rand::Rng;
use riverglade_models::{ModelRegistry, ModelSource};
use serde::{Deserialize, Serialize};

use crate::config::{ClusterSettings, SparseSettings};
use crate::error::TerrainError;
use crate::random::{random_angle, random_int_inclusive, random_point_in_square, random_range};
use crate::river::River;
use crate::tree::Tree;

/// Upper bound of the odds roll
pub const ODDS_RANGE: f32 = 100.0;

/// One row of the vegetation odds table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationOdds {
    /// Cumulative upper bound in `(0, 100]`
    pub max_odd: f32,
    pub model: String,
}

impl VegetationOdds {
    pub fn new(max_odd: f32, model: impl Into<String>) -> Self {
        Self {
            max_odd,
            model: model.into(),
        }
    }
}

/// Weighted vegetation choice, rows in priority order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VegetationTable {
    pub entries: Vec<VegetationOdds>,
}

impl Default for VegetationTable {
    fn default() -> Self {
        Self {
            entries: vec![
                VegetationOdds::new(20.0, "PineS"),
                VegetationOdds::new(40.0, "PineM"),
                VegetationOdds::new(60.0, "PineL"),
                VegetationOdds::new(80.0, "TreeM"),
                VegetationOdds::new(100.0, "TreeL"),
            ],
        }
    }
}

impl VegetationTable {
    /// First model whose cumulative bound exceeds `roll`
    pub fn select(&self, roll: f32) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| roll < entry.max_odd)
            .map(|entry| entry.model.as_str())
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        let Some(last) = self.entries.last() else {
            return Err(TerrainError::Config("vegetation table is empty".to_string()));
        };
        if self.entries.windows(2).any(|w| w[0].max_odd >= w[1].max_odd) {
            return Err(TerrainError::Config("vegetation odds must be strictly increasing".to_string()));
        }
        if self.entries[0].max_odd <= 0.0 || last.max_odd != ODDS_RANGE {
            return Err(TerrainError::Config(format!(
                "vegetation odds must cover (0, {}], last bound is {}",
                ODDS_RANGE, last.max_odd
            )));
        }
        Ok(())
    }
}

/// Why a candidate position was turned down
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    OutOfTile,
    River,
    /// Too close to the placed tree with this index
    TooClose { neighbour: usize },
}

/// Counters from one placement pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlacementStats {
    pub clusters: u32,
    pub cluster_slots: u32,
    pub sparse_slots: u32,
    pub placed: u32,
    /// Slots where every attempt was rejected
    pub exhausted: u32,
    /// Candidate positions tried across both phases
    pub attempts: u32,
}

/// Places trees on one tile
pub struct VegetationPlacer<'a, S> {
    half: f32,
    river: &'a River,
    registry: &'a ModelRegistry<S>,
    table: &'a VegetationTable,
    trees: Vec<Tree>,
}

impl<'a, S: ModelSource + 'static> VegetationPlacer<'a, S> {
    pub fn new(half: f32, river: &'a River, registry: &'a ModelRegistry<S>, table: &'a VegetationTable) -> Self {
        Self {
            half,
            river,
            registry,
            table,
            trees: Vec::new(),
        }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn into_trees(self) -> Vec<Tree> {
        self.trees
    }

    /// Cluster phase, then sparse phase; sparse trees see cluster trees as obstacles
    pub fn place_all<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        cluster: &ClusterSettings,
        sparse: &SparseSettings,
    ) -> Result<PlacementStats, TerrainError> {
        let mut stats = PlacementStats::default();

        let cluster_count = random_int_inclusive(rng, cluster.min, cluster.max);
        log::info!("Will generate {} clusters", cluster_count);
        for _ in 0..cluster_count {
            self.place_cluster(rng, cluster, &mut stats)?;
        }

        let tree_count = random_int_inclusive(rng, sparse.min, sparse.max);
        log::info!("Will generate {} sparse trees", tree_count);
        let attempts = sparse.attempts(cluster);
        for _ in 0..tree_count {
            stats.sparse_slots += 1;
            let mut placed = false;
            for _ in 0..attempts {
                stats.attempts += 1;
                let pos = random_point_in_square(rng, self.half);
                if self.try_spawn(rng, pos)? {
                    placed = true;
                    break;
                }
            }
            self.record_slot(&mut stats, placed, "sparse");
        }

        log::info!(
            "Placed {} trees ({} slots exhausted)",
            stats.placed,
            stats.exhausted
        );
        Ok(stats)
    }

    /// Grow one cluster: each tree slot retries on a widening ring around the center
    pub fn place_cluster<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        cluster: &ClusterSettings,
        stats: &mut PlacementStats,
    ) -> Result<(), TerrainError> {
        let center = random_point_in_square(rng, self.half);
        log::debug!("Create cluster at ({:.2}, {:.2})", center.x, center.y);
        stats.clusters += 1;

        let tree_count = random_int_inclusive(rng, cluster.min_trees, cluster.max_trees);
        for _ in 0..tree_count {
            stats.cluster_slots += 1;
            let mut placed = false;
            for attempt in 0..cluster.spawn_try {
                stats.attempts += 1;
                let angle = random_angle(rng);
                let distance = attempt as f32 * cluster.spawn_dist_inc;
                let pos = center + Vec2::from_angle(angle) * distance;
                if self.try_spawn(rng, pos)? {
                    placed = true;
                    break;
                }
            }
            self.record_slot(stats, placed, "cluster");
        }
        Ok(())
    }

    fn record_slot(&self, stats: &mut PlacementStats, placed: bool, phase: &str) {
        if placed {
            stats.placed += 1;
        } else {
            stats.exhausted += 1;
            log::debug!("No room found for a {} tree", phase);
        }
    }

    /// Try to plant a tree at `pos` (x, z). Returns whether one was placed.
    ///
    /// Fails only when the odds table names a model the registry does not know.
    pub fn try_spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, pos: Vec2) -> Result<bool, TerrainError> {
        if self.check_ground(pos).is_err() {
            return Ok(false);
        }

        let roll = random_range(rng, 0.0, ODDS_RANGE);
        let Some(kind) = self.table.select(roll) else {
            return Ok(false);
        };
        let metadata = self.registry.metadata(kind)?;

        if self.nearest_tree_within(pos, metadata.bounding_radius).is_some() {
            return Ok(false);
        }

        let yaw = random_angle(rng);
        self.trees.push(Tree::new(
            kind,
            metadata,
            Vec3::new(pos.x, 0.0, pos.y),
            Vec3::new(0.0, yaw, 0.0),
        ));
        Ok(true)
    }

    /// Full acceptance test for a tree of `radius` at `pos`, without side effects
    pub fn evaluate(&self, pos: Vec2, radius: f32) -> Result<(), Rejection> {
        self.check_ground(pos)?;
        match self.nearest_tree_within(pos, radius) {
            Some(neighbour) => Err(Rejection::TooClose { neighbour }),
            None => Ok(()),
        }
    }

    /// Tile bounds and river exclusion
    fn check_ground(&self, pos: Vec2) -> Result<(), Rejection> {
        let half = self.half;
        if pos.x < -half || pos.x > half || pos.y < -half || pos.y > half {
            return Err(Rejection::OutOfTile);
        }
        if self.river.excludes(pos.x, pos.y) {
            return Err(Rejection::River);
        }
        Ok(())
    }

    /// Index of the closest placed tree whose clearance overlaps a circle of
    /// `radius` at `pos`. Touching circles do not overlap.
    pub fn nearest_tree_within(&self, pos: Vec2, radius: f32) -> Option<usize> {
        self.trees
            .iter()
            .enumerate()
            .filter_map(|(i, tree)| {
                let p = tree.position();
                let distance = Vec2::new(p.x, p.z).distance(pos);
                (distance < tree.bounding_radius() + radius).then_some((i, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiverSettings, SparseRetryBudget, TerrainConfig};
    use crate::river::{generate_river, RiverBounds};
    use crate::seed::{GenerationPhase, TileSeed};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use riverglade_models::{vegetation_catalog, MemoryModelSource, ModelEntry};

    fn registry() -> ModelRegistry<MemoryModelSource> {
        let catalog = vegetation_catalog();
        ModelRegistry::new(MemoryModelSource::placeholders(&catalog), catalog)
    }

    fn straight_river(bounds: RiverBounds) -> River {
        let path = vec![Vec3::new(0.0, 0.0, -50.0), Vec3::new(0.0, 0.0, 50.0)];
        River::new(path, bounds, &RiverSettings::default())
    }

    fn generated_river(seed: u64) -> River {
        let mut rng = TileSeed::new(seed).rng(GenerationPhase::River);
        generate_river(&mut rng, 100.0, &RiverSettings::default()).unwrap()
    }

    fn assert_invariants(river: &River, trees: &[Tree]) {
        for (i, a) in trees.iter().enumerate() {
            let p = a.position();
            assert!(p.x >= -50.0 && p.x <= 50.0 && p.z >= -50.0 && p.z <= 50.0);
            assert_eq!(p.y, 0.0);
            assert!(!river.excludes(p.x, p.z), "tree {} at {:?} stands in the river", i, p);

            for b in &trees[i + 1..] {
                let distance = Vec2::new(p.x, p.z).distance(Vec2::new(b.position().x, b.position().z));
                assert!(distance >= a.bounding_radius() + b.bounding_radius());
            }
        }
    }

    #[test]
    fn test_table_select_bands() {
        let table = VegetationTable::default();
        assert_eq!(table.select(0.0), Some("PineS"));
        assert_eq!(table.select(19.99), Some("PineS"));
        assert_eq!(table.select(20.0), Some("PineM"));
        assert_eq!(table.select(79.9), Some("TreeM"));
        assert_eq!(table.select(99.999), Some("TreeL"));
        assert_eq!(table.select(100.0), None);
    }

    #[test]
    fn test_table_validation() {
        assert!(VegetationTable::default().validate().is_ok());

        let short = VegetationTable { entries: vec![VegetationOdds::new(50.0, "PineS")] };
        assert!(short.validate().is_err());

        let unordered = VegetationTable {
            entries: vec![VegetationOdds::new(60.0, "PineS"), VegetationOdds::new(40.0, "PineM"), VegetationOdds::new(100.0, "TreeL")],
        };
        assert!(unordered.validate().is_err());

        assert!(VegetationTable { entries: vec![] }.validate().is_err());
    }

    #[test]
    fn test_selection_distribution() {
        let table = VegetationTable::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let draws = 50_000;
        let mut counts = std::collections::HashMap::new();

        for _ in 0..draws {
            let kind = table.select(random_range(&mut rng, 0.0, ODDS_RANGE)).unwrap();
            *counts.entry(kind).or_insert(0u32) += 1;
        }

        assert_eq!(counts.len(), 5);
        for (kind, count) in counts {
            let share = count as f32 / draws as f32;
            assert!((share - 0.2).abs() < 0.01, "{} drawn {:.3} of the time", kind, share);
        }
    }

    #[test]
    fn test_packing_invariant_over_seeds() {
        let registry = registry();
        let config = TerrainConfig::default();

        for seed in 0..40 {
            let river = generated_river(seed);
            let mut placer = VegetationPlacer::new(50.0, &river, &registry, &config.vegetation);
            let mut rng = TileSeed::new(seed).rng(GenerationPhase::Vegetation);
            let stats = placer.place_all(&mut rng, &config.cluster, &config.sparse).unwrap();

            assert_eq!(stats.placed as usize, placer.trees().len());
            assert_eq!(stats.placed + stats.exhausted, stats.cluster_slots + stats.sparse_slots);
            assert_invariants(&river, placer.trees());
        }
    }

    #[test]
    fn test_single_cluster_single_tree() {
        let registry = registry();
        let config = TerrainConfig::default();
        let cluster = ClusterSettings { min: 1, max: 1, min_trees: 1, max_trees: 1, ..ClusterSettings::default() };
        let sparse = SparseSettings { min: 0, max: 0, ..SparseSettings::default() };

        for seed in 0..20 {
            let river = generated_river(seed);
            let mut placer = VegetationPlacer::new(50.0, &river, &registry, &config.vegetation);
            let mut rng = StdRng::seed_from_u64(seed);
            let stats = placer.place_all(&mut rng, &cluster, &sparse).unwrap();

            assert_eq!(stats.clusters, 1);
            assert_eq!(stats.cluster_slots, 1);
            assert_eq!(stats.sparse_slots, 0);
            assert!(placer.trees().len() <= 1);
            assert_invariants(&river, placer.trees());
        }
    }

    #[test]
    fn test_out_of_tile_rejected() {
        let registry = registry();
        let table = VegetationTable::default();
        let river = straight_river(RiverBounds { left: 0.0, right: 0.0 });
        let placer = VegetationPlacer::new(50.0, &river, &registry, &table);

        assert_eq!(placer.evaluate(Vec2::new(50.01, 0.0), 1.0), Err(Rejection::OutOfTile));
        assert_eq!(placer.evaluate(Vec2::new(0.0, -50.01), 1.0), Err(Rejection::OutOfTile));
        assert_eq!(placer.evaluate(Vec2::new(50.0, -50.0), 1.0), Ok(()));
    }

    #[test]
    fn test_river_rejection() {
        let registry = registry();
        let table = VegetationTable::default();
        let river = straight_river(RiverBounds { left: -7.0, right: 7.0 });
        let placer = VegetationPlacer::new(50.0, &river, &registry, &table);

        // Banks reach 6 units from the centerline
        assert_eq!(placer.evaluate(Vec2::new(5.9, 10.0), 1.0), Err(Rejection::River));
        assert_eq!(placer.evaluate(Vec2::new(6.0, 10.0), 1.0), Ok(()));
        assert_eq!(placer.evaluate(Vec2::new(-20.0, 10.0), 1.0), Ok(()));
    }

    #[test]
    fn test_zero_width_bounds_disable_river() {
        let registry = registry();
        let config = TerrainConfig::default();
        let river = straight_river(RiverBounds { left: 0.0, right: 0.0 });
        let mut placer = VegetationPlacer::new(50.0, &river, &registry, &config.vegetation);

        assert_eq!(placer.evaluate(Vec2::new(0.5, 0.0), 1.0), Ok(()));

        let mut rng = StdRng::seed_from_u64(77);
        placer.place_all(&mut rng, &config.cluster, &config.sparse).unwrap();
        for tree in placer.trees() {
            let p = tree.position();
            let spot = Vec2::new(p.x, p.z);
            // Only packing can reject a spot next to a placed tree
            assert!(!matches!(placer.evaluate(spot, 0.0), Err(Rejection::River)));
        }
    }

    #[test]
    fn test_touching_trees_accepted() {
        let registry = registry();
        let table = VegetationTable { entries: vec![VegetationOdds::new(100.0, "PineM")] };
        let river = straight_river(RiverBounds { left: 0.0, right: 0.0 });
        let mut placer = VegetationPlacer::new(50.0, &river, &registry, &table);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(placer.try_spawn(&mut rng, Vec2::new(-20.0, 0.0)).unwrap());
        // PineM has radius 3, so centers exactly 6 apart just touch
        assert_eq!(placer.evaluate(Vec2::new(-14.0, 0.0), 3.0), Ok(()));
        assert!(placer.try_spawn(&mut rng, Vec2::new(-14.0, 0.0)).unwrap());

        assert_eq!(
            placer.evaluate(Vec2::new(-14.0, 5.99), 3.0),
            Err(Rejection::TooClose { neighbour: 1 })
        );
        assert!(!placer.try_spawn(&mut rng, Vec2::new(-17.0, 0.0)).unwrap());
        assert_eq!(placer.trees().len(), 2);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let registry = registry();
        let config = TerrainConfig::default();
        let river = generated_river(11);
        let mut placer = VegetationPlacer::new(50.0, &river, &registry, &config.vegetation);
        let mut rng = StdRng::seed_from_u64(11);
        placer.place_all(&mut rng, &config.cluster, &config.sparse).unwrap();

        let mut sample_rng = StdRng::seed_from_u64(12);
        for _ in 0..500 {
            let pos = random_point_in_square(&mut sample_rng, 55.0);
            let radius = random_range(&mut sample_rng, 1.0, 5.0);
            assert_eq!(placer.evaluate(pos, radius), placer.evaluate(pos, radius));
        }
    }

    #[test]
    fn test_nearest_tree_within() {
        let registry = registry();
        let table = VegetationTable { entries: vec![VegetationOdds::new(100.0, "PineS")] };
        let river = straight_river(RiverBounds { left: 0.0, right: 0.0 });
        let mut placer = VegetationPlacer::new(50.0, &river, &registry, &table);
        let mut rng = StdRng::seed_from_u64(3);

        assert!(placer.try_spawn(&mut rng, Vec2::new(10.0, 10.0)).unwrap());
        assert!(placer.try_spawn(&mut rng, Vec2::new(14.0, 10.0)).unwrap());

        assert_eq!(placer.nearest_tree_within(Vec2::new(12.5, 10.0), 5.0), Some(1));
        assert_eq!(placer.nearest_tree_within(Vec2::new(11.0, 10.0), 5.0), Some(0));
        assert_eq!(placer.nearest_tree_within(Vec2::new(30.0, 30.0), 5.0), None);
    }

    #[test]
    fn test_unknown_model_aborts() {
        let registry = registry();
        let table = VegetationTable { entries: vec![VegetationOdds::new(100.0, "Baobab")] };
        let river = straight_river(RiverBounds { left: 0.0, right: 0.0 });
        let mut placer = VegetationPlacer::new(50.0, &river, &registry, &table);
        let mut rng = StdRng::seed_from_u64(3);

        let result = placer.try_spawn(&mut rng, Vec2::ZERO);
        assert!(matches!(result, Err(TerrainError::Registry(_))));
    }

    fn sparse_attempts(retry_budget: SparseRetryBudget) -> PlacementStats {
        // Radius larger than the tile diagonal: only the very first candidate fits
        let catalog = vec![ModelEntry::new("Boulder", "Boulder.obj", 100.0)];
        let registry = ModelRegistry::new(MemoryModelSource::placeholders(&catalog), catalog);
        let table = VegetationTable { entries: vec![VegetationOdds::new(100.0, "Boulder")] };
        let river = straight_river(RiverBounds { left: 0.0, right: 0.0 });
        let cluster = ClusterSettings { min: 0, max: 0, spawn_try: 7, ..ClusterSettings::default() };
        let sparse = SparseSettings { min: 3, max: 3, spawn_try: 2, retry_budget };

        let mut placer = VegetationPlacer::new(50.0, &river, &registry, &table);
        let mut rng = StdRng::seed_from_u64(8);
        let stats = placer.place_all(&mut rng, &cluster, &sparse).unwrap();
        assert_eq!(placer.trees().len(), 1);
        stats
    }

    #[test]
    fn test_sparse_budget_shared_with_clusters() {
        let stats = sparse_attempts(SparseRetryBudget::SharedWithClusters);
        assert_eq!(stats.sparse_slots, 3);
        assert_eq!(stats.placed, 1);
        assert_eq!(stats.exhausted, 2);
        // One winning attempt, then two slots burning cluster.spawn_try each
        assert_eq!(stats.attempts, 1 + 2 * 7);
    }

    #[test]
    fn test_sparse_budget_own() {
        let stats = sparse_attempts(SparseRetryBudget::Own);
        assert_eq!(stats.sparse_slots, 3);
        assert_eq!(stats.exhausted, 2);
        assert_eq!(stats.attempts, 1 + 2 * 2);
    }

    fn ring_cluster() -> ClusterSettings {
        ClusterSettings {
            min_trees: 1,
            max_trees: 1,
            spawn_try: 50,
            spawn_dist_inc: 1.0,
            ..ClusterSettings::default()
        }
    }

    #[test]
    fn test_cluster_first_attempt_on_center() {
        let registry = registry();
        let table = VegetationTable { entries: vec![VegetationOdds::new(100.0, "PineS")] };
        let river = straight_river(RiverBounds { left: 0.0, right: 0.0 });

        for seed in 0..20 {
            let mut placer = VegetationPlacer::new(50.0, &river, &registry, &table);
            let mut rng = StdRng::seed_from_u64(seed);
            let center = random_point_in_square(&mut rng.clone(), 50.0);
            let mut stats = PlacementStats::default();

            placer.place_cluster(&mut rng, &ring_cluster(), &mut stats).unwrap();

            assert_eq!(stats.attempts, 1);
            assert_eq!(placer.trees().len(), 1);
            assert_eq!(placer.trees()[0].position(), Vec3::new(center.x, 0.0, center.y));
        }
    }

    #[test]
    fn test_cluster_ring_grows_on_failure() {
        let registry = registry();
        let table = VegetationTable { entries: vec![VegetationOdds::new(100.0, "PineS")] };
        let river = straight_river(RiverBounds { left: 0.0, right: 0.0 });
        let mut grown = 0;

        for seed in 0..20 {
            let mut placer = VegetationPlacer::new(50.0, &river, &registry, &table);
            let mut rng = StdRng::seed_from_u64(seed);
            let center = random_point_in_square(&mut rng.clone(), 50.0);

            // Occupy the center so the ring has to widen
            assert!(placer.try_spawn(&mut StdRng::seed_from_u64(1000), center).unwrap());

            let mut stats = PlacementStats::default();
            placer.place_cluster(&mut rng, &ring_cluster(), &mut stats).unwrap();
            if placer.trees().len() < 2 {
                continue;
            }
            grown += 1;

            let p = placer.trees()[1].position();
            let distance = Vec2::new(p.x, p.z).distance(center);
            let ring = distance.round();

            // Attempt i sits exactly i * spawn_dist_inc from the center
            assert!((distance - ring).abs() < 1e-3, "distance {} is off the rings", distance);
            // Two PineS need 3.4 between centers, so rings 0 to 3 are rejected
            assert!(ring >= 4.0);
            assert_eq!(stats.attempts, ring as u32 + 1);
        }

        assert!(grown > 0);
    }
}
