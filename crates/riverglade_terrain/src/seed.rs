use rand::rngs::StdRng;
use rand::SeedableRng;

/// Independent random streams used while generating a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    River = 1,
    Vegetation = 2,
}

/// Tile seed for procedural generation
/// Derives a deterministic random stream per generation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSeed {
    pub value: u64,
}

impl TileSeed {
    pub fn new(seed: u64) -> Self {
        Self { value: seed }
    }

    /// Seed from the OS entropy source
    pub fn random() -> Self {
        Self::new(rand::random())
    }

    /// Hash combine from Boost, widened to 64 bits
    /// Formula: seed ^ (value + 0x9e3779b97f4a7c15 + (seed << 6) + (seed >> 2))
    pub fn hash_combine(&self, value: u64) -> u64 {
        let seed = self.value;

        seed ^ (value
            .wrapping_add(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2))
    }

    /// Combine this seed with a value to create a new derived seed
    pub fn combine(&self, value: u64) -> TileSeed {
        TileSeed::new(self.hash_combine(value))
    }

    /// Random stream for one phase; the same seed and phase always replay the same draws
    pub fn rng(&self, phase: GenerationPhase) -> StdRng {
        StdRng::seed_from_u64(self.combine(phase as u64).value)
    }
}

impl From<u64> for TileSeed {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl Default for TileSeed {
    fn default() -> Self {
        Self::new(0)
    }
}
